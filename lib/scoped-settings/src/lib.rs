//! Versioned, tenant-scoped configuration documents.
//!
//! Every setting lives in `zitadel.settings` as a JSONB `attributes` document
//! scoped by `instance_id` and an optional `organization_id`. Most kinds are
//! edited as a `preview` row and promoted to `active` with
//! [`SettingsRepository::activate`], which copies the preview in one statement.
//!
//! # Usage
//!
//! ```text
//! use scoped_settings::{LoginSettings, SettingsRepository};
//!
//! let repo = SettingsRepository::<LoginSettings>::new();
//! let mut tx = pool.begin().await?;
//! repo.ensure(&mut tx, instance_id, None, Changes::new()
//!     .with(repo.set_allow_register(false))
//!     .with(repo.set_force_multi_factor(true))).await?;
//! repo.activate(&mut tx, Condition::and([
//!     repo.instance_id_condition(instance_id),
//!     repo.organization_id_condition(None),
//! ])).await?;
//! tx.commit().await?;
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unwrap_in_result,
        clippy::panic
    )
)]

mod kinds;
mod repository;
mod setting;

pub use kinds::{
    BrandingSettings, DomainSettings, LegalAndSupportSettings, LockoutSettings, LoginSettings,
    MultiFactorType, NotificationSettings, OrganizationSettings, PasswordComplexitySettings,
    PasswordExpirySettings, PasswordlessType, SecondFactorType, SecretGeneratorAttributes,
    SecretGeneratorSettings, SecretGeneratorType, SecuritySettings, ThemeMode,
};
pub use repository::{SettingsRepository, delete_instance_settings, delete_organization_settings};
pub use setting::{Setting, SettingKind, SettingRow, SettingState, SettingType};
