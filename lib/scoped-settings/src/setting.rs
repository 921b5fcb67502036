//! Setting rows, their lifecycle states and the kind trait.

use std::fmt;
use std::str::FromStr;

use scoped_storage::{JsonScalar, ScanSource, StorageError, Table, Timestamp, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Which configuration document a row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Login,
    Branding,
    PasswordComplexity,
    PasswordExpiry,
    Domain,
    Lockout,
    Security,
    Organization,
    Notification,
    LegalAndSupport,
    SecretGenerator,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::Login => "login",
            SettingType::Branding => "branding",
            SettingType::PasswordComplexity => "password_complexity",
            SettingType::PasswordExpiry => "password_expiry",
            SettingType::Domain => "domain",
            SettingType::Lockout => "lockout",
            SettingType::Security => "security",
            SettingType::Organization => "organization",
            SettingType::Notification => "notification",
            SettingType::LegalAndSupport => "legal_and_support",
            SettingType::SecretGenerator => "secret_generator",
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(StorageError::scan)
    }
}

impl From<SettingType> for Value {
    fn from(typ: SettingType) -> Self {
        Value::String(typ.as_str().to_string())
    }
}

/// Lifecycle state of a setting row.
///
/// `Preview` is the editable staging copy, `Active` the one being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingState {
    Active,
    Preview,
}

impl SettingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingState::Active => "active",
            SettingState::Preview => "preview",
        }
    }
}

impl fmt::Display for SettingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingState {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SettingState::Active),
            "preview" => Ok(SettingState::Preview),
            other => Err(StorageError::scan(format!("unknown setting state {other:?}"))),
        }
    }
}

impl From<SettingState> for Value {
    fn from(state: SettingState) -> Self {
        Value::String(state.as_str().to_string())
    }
}

/// The attribute document of one setting type.
pub trait SettingKind:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    const TYPE: SettingType;

    /// State `ensure` writes into.
    const ENSURE_STATE: SettingState = SettingState::Preview;
}

/// A row of `zitadel.settings` as stored.
#[derive(Debug, Clone, PartialEq, Table, Deserialize)]
#[table(schema = "zitadel", name = "settings")]
pub struct SettingRow {
    pub instance_id: String,
    pub organization_id: Option<String>,
    pub id: String,
    #[column(name = "type")]
    #[serde(rename = "type")]
    pub kind: SettingType,
    pub state: SettingState,
    #[serde(default)]
    pub attributes: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A setting with its attributes decoded into the kind's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting<K> {
    pub instance_id: String,
    pub organization_id: Option<String>,
    /// Empty until the database assigns one.
    pub id: String,
    pub state: SettingState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub attributes: K,
}

impl<K: SettingKind> Setting<K> {
    /// A new preview setting for the given scope.
    pub fn new(instance_id: impl Into<String>, organization_id: Option<&str>, attributes: K) -> Self {
        let now = Timestamp::now();
        Self {
            instance_id: instance_id.into(),
            organization_id: organization_id.map(str::to_string),
            id: String::new(),
            state: SettingState::Preview,
            created_at: now.clone(),
            updated_at: now,
            attributes,
        }
    }

    pub fn setting_type(&self) -> SettingType {
        K::TYPE
    }
}

impl<K: SettingKind> TryFrom<SettingRow> for Setting<K> {
    type Error = StorageError;

    fn try_from(row: SettingRow) -> Result<Self, Self::Error> {
        if row.kind != K::TYPE {
            return Err(StorageError::scan(format!(
                "expected {} setting, got {}",
                K::TYPE,
                row.kind
            )));
        }
        let attributes = JsonScalar::<K>::decode(ScanSource::Json(&row.attributes))?
            .into_inner()
            .unwrap_or_default();
        Ok(Self {
            instance_id: row.instance_id,
            organization_id: row.organization_id,
            id: row.id,
            state: row.state,
            created_at: row.created_at,
            updated_at: row.updated_at,
            attributes,
        })
    }
}

/// Durations stored as integer nanoseconds.
pub(crate) mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn to_nanos(d: Duration) -> u64 {
        u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(to_nanos(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            d: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => serializer.serialize_some(&to_nanos(*d)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(deserializer).map(|n| n.map(Duration::from_nanos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Flags {
        enabled: bool,
        limit: u32,
    }

    impl SettingKind for Flags {
        const TYPE: SettingType = SettingType::Security;
    }

    fn row(attributes: serde_json::Value) -> SettingRow {
        scoped_storage::Row::new()
            .with("instance_id", "i1")
            .with("organization_id", serde_json::Value::Null)
            .with("id", "s1")
            .with("type", "security")
            .with("state", "preview")
            .with("attributes", attributes)
            .with("created_at", "2024-01-01T00:00:00.000000Z")
            .with("updated_at", "2024-01-02T00:00:00.000000Z")
            .scan()
            .unwrap()
    }

    #[test]
    fn type_and_state_names() {
        assert_eq!(SettingType::LegalAndSupport.to_string(), "legal_and_support");
        assert_eq!(
            "password_complexity".parse::<SettingType>().unwrap(),
            SettingType::PasswordComplexity
        );
        assert!("bogus".parse::<SettingType>().is_err());
        assert_eq!("active".parse::<SettingState>().unwrap(), SettingState::Active);
        assert_eq!(
            serde_json::to_value(SettingType::SecretGenerator).unwrap(),
            json!("secret_generator")
        );
    }

    #[test]
    fn decodes_row_attributes_and_metadata() {
        let setting = Setting::<Flags>::try_from(row(json!({"enabled": true}))).unwrap();
        assert_eq!(setting.id, "s1");
        assert_eq!(setting.organization_id, None);
        assert_eq!(setting.state, SettingState::Preview);
        assert_eq!(
            setting.attributes,
            Flags {
                enabled: true,
                limit: 0
            }
        );
        assert_eq!(setting.updated_at.to_string(), "2024-01-02T00:00:00.000000Z");
    }

    #[test]
    fn null_attributes_decode_to_default() {
        let setting = Setting::<Flags>::try_from(row(serde_json::Value::Null)).unwrap();
        assert_eq!(setting.attributes, Flags::default());
    }

    #[test]
    fn rejects_rows_of_another_type() {
        let mut other = row(json!({}));
        other.kind = SettingType::Login;
        assert!(Setting::<Flags>::try_from(other).unwrap_err().is_scan());
    }

    #[test]
    fn durations_are_nanoseconds() {
        #[derive(Serialize, Deserialize)]
        struct Lifetimes {
            #[serde(with = "duration_nanos")]
            check: std::time::Duration,
            #[serde(with = "duration_nanos::option", default)]
            expiry: Option<std::time::Duration>,
        }
        let value = serde_json::to_value(Lifetimes {
            check: std::time::Duration::from_secs(2),
            expiry: None,
        })
        .unwrap();
        assert_eq!(value, json!({"check": 2_000_000_000u64, "expiry": null}));
        let back: Lifetimes = serde_json::from_value(json!({"check": 5})).unwrap();
        assert_eq!(back.check, std::time::Duration::from_nanos(5));
        assert_eq!(back.expiry, None);
    }
}
