//! In-memory executor for exercising repositories without a database.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::{QueryExecutor, Row, Statement, StorageError};

/// Records every statement it receives and replays queued results.
///
/// `query` pops the next queued row set (empty when none is queued), `exec`
/// pops the next queued affected-row count (`1` when none is queued). A
/// queued error is returned by whichever call comes next.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Vec<Statement>,
    rows: VecDeque<Vec<Row>>,
    affected: VecDeque<u64>,
    errors: VecDeque<StorageError>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&mut self, rows: Vec<Row>) -> &mut Self {
        self.rows.push_back(rows);
        self
    }

    pub fn push_affected(&mut self, count: u64) -> &mut Self {
        self.affected.push_back(count);
        self
    }

    pub fn push_error(&mut self, err: StorageError) -> &mut Self {
        self.errors.push_back(err);
        self
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// The most recent statement, if any.
    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        self.statements.push(statement.clone());
        if let Some(err) = self.errors.pop_front() {
            return Err(err);
        }
        Ok(self.rows.pop_front().unwrap_or_default())
    }

    async fn exec(&mut self, statement: &Statement) -> Result<u64, StorageError> {
        self.statements.push(statement.clone());
        if let Some(err) = self.errors.pop_front() {
            return Err(err);
        }
        Ok(self.affected.pop_front().unwrap_or(1))
    }
}
