//! PostgreSQL implementation for scoped-storage.
//!
//! Runs [`Statement`](scoped_storage::Statement)s through sqlx, binding
//! [`Value`](scoped_storage::Value)s by variant and reading rows back as JSON
//! keyed by column name. Constraint violations are classified into
//! [`StorageError`] variants from the driver's error kind.
//!
//! # Usage
//!
//! ```text
//! use scoped_storage_postgres::{ConnectionConfig, PgPool, RepositoryConnection};
//!
//! let mut pool = PgPool::connect(ConnectionConfig::from_env()?).await?;
//! let setting = repo.get(&mut pool, condition).await?;
//!
//! let mut tx = pool.begin().await?;
//! repo.activate(&mut tx, condition).await?;
//! tx.commit().await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod error;
mod executor;
mod row;

pub use executor::{PgPool, PgTransaction};

// Re-export core types for convenience
pub use scoped_storage::{
    ConnectionConfig, QueryExecutor, RepositoryConnection, Row, Statement, StorageError,
};
