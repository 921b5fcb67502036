//! Scoped Storage - a tenant-safe SQL building core.
//!
//! Repositories describe reads and writes as [`Condition`]s and [`Changes`],
//! render them into a [`Statement`] and hand it to a [`QueryExecutor`].
//!
//! # Core Concepts
//!
//! - **Restricting column**: a column a condition pins to exactly one value.
//!   [`check_restrictions`] rejects a condition that leaves a tenant column
//!   unrestricted, before any SQL is produced.
//! - **Changes**: column assignments, including JSON-patch edits inside JSONB
//!   columns, compiled to a single assignment per column.
//! - **Codec**: [`JsonScalar`] and [`JsonArray`] read JSON columns where empty
//!   input means "no value".
//!
//! # Usage
//!
//! ```text
//! use scoped_storage::{Table, TextOperation, Condition};
//!
//! #[derive(Table, serde::Deserialize)]
//! #[table(schema = "zitadel", name = "users")]
//! pub struct UserRow {
//!     pub instance_id: String,
//!     pub id: String,
//! }
//!
//! let condition = Condition::text(UserRow::instance_id_column(), TextOperation::Equal, "i1");
//! check_restrictions(Some(&condition), &[UserRow::instance_id_column()])?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

extern crate self as scoped_storage;

mod change;
mod codec;
mod column;
mod condition;
mod config;
mod error;
mod executor;
mod query;
mod restrict;
mod statement;
mod time;
mod value;

#[cfg(any(test, feature = "test-util"))]
mod testing;

pub use change::{Change, ChangeValue, Changes, JsonOp};
pub use codec::{JsonArray, JsonScalar, ScanSource};
pub use column::{Column, Table};
pub use condition::{
    BooleanOperation, BytesOperation, Condition, NumberOperation, Operator, TextOperation,
};
pub use config::{ConfigError, ConnectionConfig, DEFAULT_MAX_CONNECTIONS, RepositoryConnection};
pub use error::{ConstraintKind, ConstraintViolation, StorageError};
pub use executor::{QueryExecutor, Row, collect_exactly_one, collect_rows, exactly_one};
pub use query::{Order, QueryOpts};
pub use restrict::check_restrictions;
pub use statement::{Statement, StatementBuilder};
pub use time::Timestamp;
pub use value::Value;

#[cfg(any(test, feature = "test-util"))]
pub use testing::RecordingExecutor;

// Re-export derive macro
pub use scoped_storage_derive::Table;
