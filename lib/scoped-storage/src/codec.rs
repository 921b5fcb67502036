//! Typed wrappers for JSON-valued columns.
//!
//! [`JsonScalar`] and [`JsonArray`] decode a column that may be SQL `NULL`,
//! empty, or a JSON document, and encode back to a bindable [`Value`]. Empty
//! input always means "no value".

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::{StorageError, Value};

/// What a driver handed back for a column, before typed decoding.
#[derive(Debug, Clone, Copy)]
pub enum ScanSource<'a> {
    Null,
    Bytes(&'a [u8]),
    Text(&'a str),
    Json(&'a serde_json::Value),
    /// A column type the codec cannot read; carries the type name.
    Unsupported(&'a str),
}

impl<'a> From<&'a serde_json::Value> for ScanSource<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        ScanSource::Json(value)
    }
}

/// Read a JSON document from `source`. `Ok(None)` for null or empty input.
fn decode_document<T: DeserializeOwned>(source: ScanSource<'_>) -> Result<Option<T>, StorageError> {
    match source {
        ScanSource::Null => Ok(None),
        ScanSource::Bytes(bytes) if bytes.is_empty() => Ok(None),
        ScanSource::Bytes(bytes) => serde_json::from_slice(bytes)
            .map(Some)
            .map_err(StorageError::scan),
        ScanSource::Text(text) if text.is_empty() => Ok(None),
        ScanSource::Text(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(StorageError::scan),
        ScanSource::Json(serde_json::Value::Null) => Ok(None),
        // Drivers that hand JSONB back as a JSON string of the document text.
        ScanSource::Json(serde_json::Value::String(text)) => {
            match serde_json::from_value(serde_json::Value::String(text.clone())) {
                Ok(value) => Ok(Some(value)),
                Err(_) => decode_document(ScanSource::Text(text)),
            }
        }
        ScanSource::Json(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(StorageError::scan),
        ScanSource::Unsupported(type_name) => {
            Err(StorageError::UnsupportedScanSource(type_name.to_string()))
        }
    }
}

/// A single JSON value stored in a column. `None` when the column holds no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonScalar<T>(pub Option<T>);

impl<T> JsonScalar<T> {
    pub fn new(value: T) -> Self {
        JsonScalar(Some(value))
    }

    pub fn none() -> Self {
        JsonScalar(None)
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for JsonScalar<T> {
    fn default() -> Self {
        JsonScalar(None)
    }
}

impl<T: DeserializeOwned> JsonScalar<T> {
    pub fn decode(source: ScanSource<'_>) -> Result<Self, StorageError> {
        decode_document(source).map(JsonScalar)
    }
}

impl<T: Serialize> JsonScalar<T> {
    /// `None` encodes as JSON `null`, so it binds to a JSONB column.
    pub fn encode(&self) -> Result<Value, StorageError> {
        match &self.0 {
            None => Ok(Value::Json(serde_json::Value::Null)),
            Some(value) => serde_json::to_value(value)
                .map(Value::Json)
                .map_err(StorageError::Encode),
        }
    }
}

impl<T: Serialize> Serialize for JsonScalar<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for JsonScalar<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        JsonScalar::decode(ScanSource::Json(&raw)).map_err(serde::de::Error::custom)
    }
}

/// A JSON array stored in a column. Null, empty and `[]` all decode to an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonArray<T>(pub Vec<T>);

impl<T> JsonArray<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for JsonArray<T> {
    fn default() -> Self {
        JsonArray(Vec::new())
    }
}

impl<T> From<Vec<T>> for JsonArray<T> {
    fn from(items: Vec<T>) -> Self {
        JsonArray(items)
    }
}

impl<T: DeserializeOwned> JsonArray<T> {
    pub fn decode(source: ScanSource<'_>) -> Result<Self, StorageError> {
        decode_document::<Vec<T>>(source).map(|items| JsonArray(items.unwrap_or_default()))
    }
}

impl<T: Serialize> JsonArray<T> {
    /// Always a JSON array; an empty list encodes as `[]`, never `NULL`.
    pub fn encode(&self) -> Result<Value, StorageError> {
        serde_json::to_value(&self.0)
            .map(Value::Json)
            .map_err(StorageError::Encode)
    }
}

impl<T: Serialize> Serialize for JsonArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for JsonArray<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        JsonArray::decode(ScanSource::Json(&raw)).map_err(serde::de::Error::custom)
    }
}
