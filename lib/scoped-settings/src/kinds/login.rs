use std::time::Duration;

use scoped_storage::{Change, JsonOp};
use serde::{Deserialize, Serialize};

use crate::setting::duration_nanos;
use crate::{SettingKind, SettingType, SettingsRepository};

attribute_enum! {
    #[derive(Default)]
    pub enum PasswordlessType {
        #[default]
        NotAllowed => "not_allowed",
        Allowed => "allowed",
    }
}

attribute_enum! {
    pub enum MultiFactorType {
        Unspecified => "unspecified",
        U2fWithPin => "u2f_with_pin",
    }
}

attribute_enum! {
    pub enum SecondFactorType {
        Unspecified => "unspecified",
        Totp => "totp",
        U2f => "u2f",
        OtpEmail => "otp_email",
        OtpSms => "otp_sms",
        RecoveryCodes => "recovery_codes",
    }
}

/// How users may authenticate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginSettings {
    pub allow_username_password: bool,
    pub allow_register: bool,
    pub allow_external_idp: bool,
    pub force_multi_factor: bool,
    pub force_multi_factor_local_only: bool,
    pub hide_password_reset: bool,
    pub ignore_unknown_usernames: bool,
    pub allow_domain_discovery: bool,
    pub disable_login_with_email: bool,
    pub disable_login_with_phone: bool,
    pub passwordless_type: PasswordlessType,
    pub default_redirect_uri: String,
    #[serde(with = "duration_nanos")]
    pub password_check_lifetime: Duration,
    #[serde(with = "duration_nanos")]
    pub external_login_check_lifetime: Duration,
    #[serde(with = "duration_nanos")]
    pub multi_factor_init_skip_lifetime: Duration,
    #[serde(with = "duration_nanos")]
    pub second_factor_check_lifetime: Duration,
    #[serde(with = "duration_nanos")]
    pub multi_factor_check_lifetime: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multi_factor_types: Vec<MultiFactorType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub second_factor_types: Vec<SecondFactorType>,
}

impl SettingKind for LoginSettings {
    const TYPE: SettingType = SettingType::Login;
}

attribute_setters!(LoginSettings {
    set_allow_username_password(bool) => "allowUsernamePassword";
    set_allow_register(bool) => "allowRegister";
    set_allow_external_idp(bool) => "allowExternalIdp";
    set_force_multi_factor(bool) => "forceMultiFactor";
    set_force_multi_factor_local_only(bool) => "forceMultiFactorLocalOnly";
    set_hide_password_reset(bool) => "hidePasswordReset";
    set_ignore_unknown_usernames(bool) => "ignoreUnknownUsernames";
    set_allow_domain_discovery(bool) => "allowDomainDiscovery";
    set_disable_login_with_email(bool) => "disableLoginWithEmail";
    set_disable_login_with_phone(bool) => "disableLoginWithPhone";
    set_passwordless_type(PasswordlessType) => "passwordlessType";
    set_default_redirect_uri(&str) => "defaultRedirectUri";
});

impl SettingsRepository<LoginSettings> {
    pub fn set_password_check_lifetime(&self, lifetime: Duration) -> Change {
        self.set_lifetime("passwordCheckLifetime", lifetime)
    }

    pub fn set_external_login_check_lifetime(&self, lifetime: Duration) -> Change {
        self.set_lifetime("externalLoginCheckLifetime", lifetime)
    }

    pub fn set_multi_factor_init_skip_lifetime(&self, lifetime: Duration) -> Change {
        self.set_lifetime("multiFactorInitSkipLifetime", lifetime)
    }

    pub fn set_second_factor_check_lifetime(&self, lifetime: Duration) -> Change {
        self.set_lifetime("secondFactorCheckLifetime", lifetime)
    }

    pub fn set_multi_factor_check_lifetime(&self, lifetime: Duration) -> Change {
        self.set_lifetime("multiFactorCheckLifetime", lifetime)
    }

    pub fn set_multi_factor_types(&self, types: &[MultiFactorType]) -> Change {
        let types: Vec<serde_json::Value> = types.iter().copied().map(Into::into).collect();
        self.set_attribute(&["multiFactorTypes"], types)
    }

    /// Appends the type, moving it to the end if already listed.
    pub fn add_multi_factor_type(&self, typ: MultiFactorType) -> Change {
        self.attribute(&["multiFactorTypes"], JsonOp::Append(typ.into()))
    }

    pub fn remove_multi_factor_type(&self, typ: MultiFactorType) -> Change {
        self.attribute(&["multiFactorTypes"], JsonOp::Remove(typ.into()))
    }

    pub fn set_second_factor_types(&self, types: &[SecondFactorType]) -> Change {
        let types: Vec<serde_json::Value> = types.iter().copied().map(Into::into).collect();
        self.set_attribute(&["secondFactorTypes"], types)
    }

    pub fn add_second_factor_type(&self, typ: SecondFactorType) -> Change {
        self.attribute(&["secondFactorTypes"], JsonOp::Append(typ.into()))
    }

    pub fn remove_second_factor_type(&self, typ: SecondFactorType) -> Change {
        self.attribute(&["secondFactorTypes"], JsonOp::Remove(typ.into()))
    }

    fn set_lifetime(&self, key: &str, lifetime: Duration) -> Change {
        self.set_attribute(&[key], duration_nanos::to_nanos(lifetime))
    }
}
