use scoped_storage::{Change, JsonOp};
use serde::{Deserialize, Serialize};

use crate::{SettingKind, SettingType, SettingsRepository};

/// Embedding, CORS origins and impersonation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecuritySettings {
    pub enable_iframe_embedding: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,
    pub enable_impersonation: bool,
}

impl SettingKind for SecuritySettings {
    const TYPE: SettingType = SettingType::Security;
}

attribute_setters!(SecuritySettings {
    set_enable_iframe_embedding(bool) => "enableIframeEmbedding";
    set_allowed_origins(&[String]) => "allowedOrigins";
    set_enable_impersonation(bool) => "enableImpersonation";
});

impl SettingsRepository<SecuritySettings> {
    pub fn add_allowed_origin(&self, origin: &str) -> Change {
        self.attribute(&["allowedOrigins"], JsonOp::Append(origin.into()))
    }

    pub fn remove_allowed_origin(&self, origin: &str) -> Change {
        self.attribute(&["allowedOrigins"], JsonOp::Remove(origin.into()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomainSettings {
    pub login_name_includes_domain: bool,
    pub require_org_domain_verification: bool,
    pub smtp_sender_address_matches_instance_domain: bool,
}

impl SettingKind for DomainSettings {
    const TYPE: SettingType = SettingType::Domain;
}

attribute_setters!(DomainSettings {
    set_login_name_includes_domain(bool) => "loginNameIncludesDomain";
    set_require_org_domain_verification(bool) => "requireOrgDomainVerification";
    set_smtp_sender_address_matches_instance_domain(bool) => "smtpSenderAddressMatchesInstanceDomain";
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizationSettings {
    pub organization_scoped_usernames: bool,
}

impl SettingKind for OrganizationSettings {
    const TYPE: SettingType = SettingType::Organization;
}

attribute_setters!(OrganizationSettings {
    set_organization_scoped_usernames(bool) => "organizationScopedUsernames";
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Notify users when their password changes.
    pub password_change: bool,
}

impl SettingKind for NotificationSettings {
    const TYPE: SettingType = SettingType::Notification;
}

attribute_setters!(NotificationSettings {
    set_password_change(bool) => "passwordChange";
});
