//! Attribute documents for each setting type and their field setters.
//!
//! Setters are inherent methods on `SettingsRepository<Kind>` and return
//! JSON-patch changes on the `attributes` column, so several of them can be
//! combined into one `update` or `ensure`.

/// Enum stored in the document under its snake_case name.
macro_rules! attribute_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$variant_meta])* #[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl From<$name> for serde_json::Value {
            fn from(value: $name) -> Self {
                serde_json::Value::String(value.as_str().to_string())
            }
        }
    };
}

/// Setters writing one top-level attribute each.
macro_rules! attribute_setters {
    ($kind:ty { $($setter:ident($ty:ty) => $key:literal;)+ }) => {
        impl $crate::SettingsRepository<$kind> {
            $(
                pub fn $setter(&self, value: $ty) -> scoped_storage::Change {
                    self.set_attribute(&[$key], value)
                }
            )+
        }
    };
}

mod branding;
mod legal;
mod login;
mod password;
mod policy;
mod secret_generator;

pub use branding::{BrandingSettings, ThemeMode};
pub use legal::LegalAndSupportSettings;
pub use login::{LoginSettings, MultiFactorType, PasswordlessType, SecondFactorType};
pub use password::{LockoutSettings, PasswordComplexitySettings, PasswordExpirySettings};
pub use policy::{DomainSettings, NotificationSettings, OrganizationSettings, SecuritySettings};
pub use secret_generator::{SecretGeneratorAttributes, SecretGeneratorSettings, SecretGeneratorType};
