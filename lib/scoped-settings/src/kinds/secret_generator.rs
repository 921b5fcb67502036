//! Parameters of the generators for codes and secrets.
//!
//! Each generator is a nested object in the document, keyed by
//! [`SecretGeneratorType::key`]. Unlike the other kinds these settings have no
//! staging copy: `ensure` writes straight into the active state.

use std::time::Duration;

use scoped_storage::{Change, Changes};
use serde::{Deserialize, Serialize};

use crate::setting::duration_nanos;
use crate::{SettingKind, SettingState, SettingType, SettingsRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretGeneratorType {
    ClientSecret,
    InitializeUserCode,
    EmailVerificationCode,
    PhoneVerificationCode,
    PasswordVerificationCode,
    PasswordlessInitCode,
    DomainVerification,
    OtpSms,
    OtpEmail,
    AppSecret,
    InviteCode,
    SigningKey,
}

impl SecretGeneratorType {
    pub const ALL: [SecretGeneratorType; 12] = [
        SecretGeneratorType::ClientSecret,
        SecretGeneratorType::InitializeUserCode,
        SecretGeneratorType::EmailVerificationCode,
        SecretGeneratorType::PhoneVerificationCode,
        SecretGeneratorType::PasswordVerificationCode,
        SecretGeneratorType::PasswordlessInitCode,
        SecretGeneratorType::DomainVerification,
        SecretGeneratorType::OtpSms,
        SecretGeneratorType::OtpEmail,
        SecretGeneratorType::AppSecret,
        SecretGeneratorType::InviteCode,
        SecretGeneratorType::SigningKey,
    ];

    /// Document key of the generator's object.
    pub fn key(&self) -> &'static str {
        match self {
            SecretGeneratorType::ClientSecret => "clientSecret",
            SecretGeneratorType::InitializeUserCode => "initializeUserCode",
            SecretGeneratorType::EmailVerificationCode => "emailVerificationCode",
            SecretGeneratorType::PhoneVerificationCode => "phoneVerificationCode",
            SecretGeneratorType::PasswordVerificationCode => "passwordVerificationCode",
            SecretGeneratorType::PasswordlessInitCode => "passwordlessInitCode",
            SecretGeneratorType::DomainVerification => "domainVerification",
            SecretGeneratorType::OtpSms => "otpSms",
            SecretGeneratorType::OtpEmail => "otpEmail",
            SecretGeneratorType::AppSecret => "appSecret",
            SecretGeneratorType::InviteCode => "inviteCode",
            SecretGeneratorType::SigningKey => "signingKey",
        }
    }

    /// Domain verification secrets never expire.
    pub fn has_expiry(&self) -> bool {
        !matches!(self, SecretGeneratorType::DomainVerification)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecretGeneratorAttributes {
    pub length: u32,
    pub include_lower_letters: bool,
    pub include_upper_letters: bool,
    pub include_digits: bool,
    pub include_symbols: bool,
    #[serde(with = "duration_nanos::option", skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecretGeneratorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_user_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verification_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_verification_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_verification_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passwordless_init_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_verification: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_sms: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_email: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<SecretGeneratorAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<SecretGeneratorAttributes>,
}

impl SecretGeneratorSettings {
    pub fn generator(&self, generator: SecretGeneratorType) -> Option<&SecretGeneratorAttributes> {
        match generator {
            SecretGeneratorType::ClientSecret => self.client_secret.as_ref(),
            SecretGeneratorType::InitializeUserCode => self.initialize_user_code.as_ref(),
            SecretGeneratorType::EmailVerificationCode => self.email_verification_code.as_ref(),
            SecretGeneratorType::PhoneVerificationCode => self.phone_verification_code.as_ref(),
            SecretGeneratorType::PasswordVerificationCode => {
                self.password_verification_code.as_ref()
            }
            SecretGeneratorType::PasswordlessInitCode => self.passwordless_init_code.as_ref(),
            SecretGeneratorType::DomainVerification => self.domain_verification.as_ref(),
            SecretGeneratorType::OtpSms => self.otp_sms.as_ref(),
            SecretGeneratorType::OtpEmail => self.otp_email.as_ref(),
            SecretGeneratorType::AppSecret => self.app_secret.as_ref(),
            SecretGeneratorType::InviteCode => self.invite_code.as_ref(),
            SecretGeneratorType::SigningKey => self.signing_key.as_ref(),
        }
    }
}

impl SettingKind for SecretGeneratorSettings {
    const TYPE: SettingType = SettingType::SecretGenerator;
    const ENSURE_STATE: SettingState = SettingState::Active;
}

impl SettingsRepository<SecretGeneratorSettings> {
    pub fn set_length(&self, generator: SecretGeneratorType, length: u32) -> Change {
        self.set_attribute(&[generator.key(), "length"], length)
    }

    pub fn set_include_lower_letters(&self, generator: SecretGeneratorType, include: bool) -> Change {
        self.set_attribute(&[generator.key(), "includeLowerLetters"], include)
    }

    pub fn set_include_upper_letters(&self, generator: SecretGeneratorType, include: bool) -> Change {
        self.set_attribute(&[generator.key(), "includeUpperLetters"], include)
    }

    pub fn set_include_digits(&self, generator: SecretGeneratorType, include: bool) -> Change {
        self.set_attribute(&[generator.key(), "includeDigits"], include)
    }

    pub fn set_include_symbols(&self, generator: SecretGeneratorType, include: bool) -> Change {
        self.set_attribute(&[generator.key(), "includeSymbols"], include)
    }

    pub fn set_expiry(&self, generator: SecretGeneratorType, expiry: Duration) -> Change {
        self.set_attribute(&[generator.key(), "expiry"], duration_nanos::to_nanos(expiry))
    }

    /// Field-by-field changes for one generator. Fields of the stored object
    /// not covered here are kept.
    pub fn set_generator(
        &self,
        generator: SecretGeneratorType,
        attributes: &SecretGeneratorAttributes,
    ) -> Changes {
        let mut changes = Changes::new()
            .with(self.set_length(generator, attributes.length))
            .with(self.set_include_lower_letters(generator, attributes.include_lower_letters))
            .with(self.set_include_upper_letters(generator, attributes.include_upper_letters))
            .with(self.set_include_digits(generator, attributes.include_digits))
            .with(self.set_include_symbols(generator, attributes.include_symbols));
        if let Some(expiry) = attributes.expiry.filter(|_| generator.has_expiry()) {
            changes.push(self.set_expiry(generator, expiry));
        }
        changes
    }

    /// Changes for every generator present in `settings`.
    pub fn overwrite(&self, settings: &SecretGeneratorSettings) -> Changes {
        SecretGeneratorType::ALL
            .iter()
            .filter_map(|generator| {
                settings
                    .generator(*generator)
                    .map(|attributes| self.set_generator(*generator, attributes))
            })
            .flatten()
            .collect()
    }
}
