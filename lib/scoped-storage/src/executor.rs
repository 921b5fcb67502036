//! The contract between repositories and a database backend.
//!
//! Repositories hand a finished [`Statement`] to a [`QueryExecutor`] and get
//! [`Row`]s back. A backend can be a pool or a caller-owned transaction; the
//! repository never begins, commits or rolls back.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json};

use crate::{ScanSource, Statement, StorageError};

/// Trait for executing statements against a database backend.
///
/// Implemented by backend-specific pool and transaction types.
#[async_trait]
pub trait QueryExecutor: Send {
    /// Run a statement that returns rows.
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StorageError>;

    /// Run a statement that must return exactly one row.
    async fn query_row(&mut self, statement: &Statement) -> Result<Row, StorageError> {
        let rows = self.query(statement).await?;
        exactly_one(rows)
    }

    /// Run a statement and return the number of rows affected.
    async fn exec(&mut self, statement: &Statement) -> Result<u64, StorageError>;
}

/// A result row keyed by column name.
///
/// Column names containing dots (`project.id`) scan into nested objects, so a
/// joined row can deserialize into a struct with a nested field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Map<String, Json>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Json>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Json> {
        self.0.get(name)
    }

    /// The raw column as a codec source; a missing column reads as NULL.
    pub fn source(&self, name: &str) -> ScanSource<'_> {
        match self.0.get(name) {
            None | Some(Json::Null) => ScanSource::Null,
            Some(value) => ScanSource::Json(value),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deserialize the row into `T`, mapping columns to fields by name.
    ///
    /// NULL columns are omitted so serde defaults apply.
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        let mut root = Map::new();
        for (name, value) in &self.0 {
            if value.is_null() {
                continue;
            }
            insert_nested(&mut root, name, value.clone());
        }
        serde_json::from_value(Json::Object(root)).map_err(StorageError::scan)
    }
}

impl From<Map<String, Json>> for Row {
    fn from(map: Map<String, Json>) -> Self {
        Row(map)
    }
}

fn insert_nested(target: &mut Map<String, Json>, name: &str, value: Json) {
    match name.split_once('.') {
        None => {
            target.insert(name.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            if !child.is_object() {
                *child = Json::Object(Map::new());
            }
            if let Json::Object(child) = child {
                insert_nested(child, rest, value);
            }
        }
    }
}

/// The single row of `rows`.
pub fn exactly_one(rows: Vec<Row>) -> Result<Row, StorageError> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (None, _) => Err(StorageError::NoRowFound),
        (Some(row), None) => Ok(row),
        (Some(_), Some(_)) => Err(StorageError::MultipleRowsFound),
    }
}

/// Scan every row into `T`.
pub fn collect_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>, StorageError> {
    rows.iter().map(Row::scan).collect()
}

/// Scan the single row of `rows` into `T`.
pub fn collect_exactly_one<T: DeserializeOwned>(rows: Vec<Row>) -> Result<T, StorageError> {
    exactly_one(rows)?.scan()
}
