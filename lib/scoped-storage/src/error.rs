//! Error taxonomy for storage operations.
//!
//! Every failure leaving this crate (or a backend built on it) is one of the
//! [`StorageError`] variants. Precondition failures ([`StorageError::MissingCondition`],
//! [`StorageError::NoChanges`], [`StorageError::ImmutableColumn`]) are raised before a statement reaches the database;
//! the remaining variants classify what the database or the row decoder reported.

use thiserror::Error;

use crate::Column;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Kind of constraint a backend reported as violated.
///
/// Backends translate their driver-specific error codes into this enum and hand
/// it to [`StorageError::from_constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
    NotNull,
}

/// Details of a constraint violation as reported by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Table the violation happened on, if the driver reported it.
    pub table: Option<String>,
    /// Constraint name, if the driver reported it.
    pub constraint: Option<String>,
    /// Original database message.
    pub message: String,
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.table, &self.constraint) {
            (Some(table), Some(constraint)) => write!(f, "{} on {}", constraint, table),
            (None, Some(constraint)) => write!(f, "{}", constraint),
            (Some(table), None) => write!(f, "{}", table),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("missing condition on column {0}")]
    MissingCondition(Column),

    #[error("no row found")]
    NoRowFound,

    #[error("multiple rows found")]
    MultipleRowsFound,

    #[error("unique constraint violated: {0}")]
    Unique(ConstraintViolation),

    #[error("foreign key constraint violated: {0}")]
    ForeignKey(ConstraintViolation),

    #[error("check constraint violated: {0}")]
    Check(ConstraintViolation),

    #[error("not null constraint violated: {0}")]
    NotNull(ConstraintViolation),

    #[error("scan error: {0}")]
    Scan(#[source] BoxError),

    #[error("unsupported scan source: {0}")]
    UnsupportedScanSource(String),

    #[error("no changes")]
    NoChanges,

    #[error("column {0} cannot be changed")]
    ImmutableColumn(Column),

    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Database(BoxError),
}

impl StorageError {
    /// Classify a constraint violation reported by a backend.
    pub fn from_constraint(kind: ConstraintKind, violation: ConstraintViolation) -> Self {
        match kind {
            ConstraintKind::Unique => StorageError::Unique(violation),
            ConstraintKind::ForeignKey => StorageError::ForeignKey(violation),
            ConstraintKind::Check => StorageError::Check(violation),
            ConstraintKind::NotNull => StorageError::NotNull(violation),
        }
    }

    /// Wrap a row decoding failure.
    pub fn scan(err: impl Into<BoxError>) -> Self {
        StorageError::Scan(err.into())
    }

    /// Pass an unclassified driver error through unchanged.
    pub fn database(err: impl Into<BoxError>) -> Self {
        StorageError::Database(err.into())
    }

    pub fn is_missing_condition(&self) -> bool {
        matches!(self, StorageError::MissingCondition(_))
    }

    pub fn is_no_row_found(&self) -> bool {
        matches!(self, StorageError::NoRowFound)
    }

    pub fn is_multiple_rows_found(&self) -> bool {
        matches!(self, StorageError::MultipleRowsFound)
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, StorageError::Unique(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, StorageError::ForeignKey(_))
    }

    pub fn is_check(&self) -> bool {
        matches!(self, StorageError::Check(_))
    }

    pub fn is_not_null(&self) -> bool {
        matches!(self, StorageError::NotNull(_))
    }

    pub fn is_scan(&self) -> bool {
        matches!(
            self,
            StorageError::Scan(_) | StorageError::UnsupportedScanSource(_)
        )
    }

    pub fn is_no_changes(&self) -> bool {
        matches!(self, StorageError::NoChanges)
    }

    /// The violated constraint, for the four constraint kinds.
    pub fn constraint_violation(&self) -> Option<&ConstraintViolation> {
        match self {
            StorageError::Unique(v)
            | StorageError::ForeignKey(v)
            | StorageError::Check(v)
            | StorageError::NotNull(v) => Some(v),
            _ => None,
        }
    }
}
