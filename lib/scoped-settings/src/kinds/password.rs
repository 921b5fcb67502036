use serde::{Deserialize, Serialize};

use crate::{SettingKind, SettingType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordComplexitySettings {
    pub min_length: u64,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_number: bool,
    pub has_symbol: bool,
}

impl SettingKind for PasswordComplexitySettings {
    const TYPE: SettingType = SettingType::PasswordComplexity;
}

attribute_setters!(PasswordComplexitySettings {
    set_min_length(u64) => "minLength";
    set_has_lowercase(bool) => "hasLowercase";
    set_has_uppercase(bool) => "hasUppercase";
    set_has_number(bool) => "hasNumber";
    set_has_symbol(bool) => "hasSymbol";
});

/// Zero days disables expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordExpirySettings {
    pub expire_warn_days: u64,
    pub max_age_days: u64,
}

impl SettingKind for PasswordExpirySettings {
    const TYPE: SettingType = SettingType::PasswordExpiry;
}

attribute_setters!(PasswordExpirySettings {
    set_expire_warn_days(u64) => "expireWarnDays";
    set_max_age_days(u64) => "maxAgeDays";
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LockoutSettings {
    pub max_password_attempts: u64,
    pub max_otp_attempts: u64,
    pub show_lock_out_failures: bool,
}

impl SettingKind for LockoutSettings {
    const TYPE: SettingType = SettingType::Lockout;
}

attribute_setters!(LockoutSettings {
    set_max_password_attempts(u64) => "maxPasswordAttempts";
    set_max_otp_attempts(u64) => "maxOtpAttempts";
    set_show_lock_out_failures(bool) => "showLockOutFailures";
});
