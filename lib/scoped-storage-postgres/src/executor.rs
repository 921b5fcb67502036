//! PostgreSQL implementation of QueryExecutor.

use async_trait::async_trait;
use scoped_storage::{
    ConnectionConfig, QueryExecutor, RepositoryConnection, Row, Statement, StorageError,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgExecutor, Postgres, Transaction};
use std::ops::Deref;

use crate::bind::bind_args;
use crate::error::map_sqlx_error;
use crate::row::extract_row;

/// Wrapper around sqlx::PgPool that implements QueryExecutor.
///
/// Each statement runs on whichever pooled connection is free; use
/// [`PgPool::begin`] when statements must share a transaction.
#[derive(Clone, Debug)]
pub struct PgPool(sqlx::PgPool);

impl PgPool {
    /// Create a new PgPool from an sqlx PgPool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.0
    }

    /// Begin a transaction owned by the caller.
    pub async fn begin(&self) -> Result<PgTransaction, StorageError> {
        let tx = self.0.begin().await.map_err(map_sqlx_error)?;
        Ok(PgTransaction { tx })
    }
}

impl Deref for PgPool {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl RepositoryConnection for PgPool {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, StorageError> {
        let config = config.into();
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self(pool))
    }
}

#[async_trait]
impl QueryExecutor for PgPool {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        fetch(&self.0, statement).await
    }

    async fn exec(&mut self, statement: &Statement) -> Result<u64, StorageError> {
        execute(&self.0, statement).await
    }
}

/// PostgreSQL transaction wrapper implementing QueryExecutor.
///
/// Repositories only run statements on it; committing or rolling back is up
/// to whoever began it.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgTransaction {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    pub fn into_inner(self) -> Transaction<'static, Postgres> {
        self.tx
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl QueryExecutor for PgTransaction {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        fetch(&mut *self.tx, statement).await
    }

    async fn exec(&mut self, statement: &Statement) -> Result<u64, StorageError> {
        execute(&mut *self.tx, statement).await
    }
}

async fn fetch<'c, E>(executor: E, statement: &Statement) -> Result<Vec<Row>, StorageError>
where
    E: PgExecutor<'c>,
{
    tracing::debug!(sql = %statement.sql(), args = ?statement.args(), "query");
    let args = bind_args(statement.args())?;
    let rows = sqlx::query_with(statement.sql(), args)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    rows.iter().map(extract_row).collect()
}

async fn execute<'c, E>(executor: E, statement: &Statement) -> Result<u64, StorageError>
where
    E: PgExecutor<'c>,
{
    tracing::debug!(sql = %statement.sql(), args = ?statement.args(), "exec");
    let args = bind_args(statement.args())?;
    let result = sqlx::query_with(statement.sql(), args)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}
