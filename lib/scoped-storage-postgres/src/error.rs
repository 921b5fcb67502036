use scoped_storage::{ConstraintKind, ConstraintViolation, StorageError};
use sqlx::error::ErrorKind;

/// Classify a driver error.
///
/// Constraint violations are recognized by the SQLSTATE-derived error kind,
/// never by message text.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db) => {
            let kind = match db.kind() {
                ErrorKind::UniqueViolation => ConstraintKind::Unique,
                ErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
                ErrorKind::NotNullViolation => ConstraintKind::NotNull,
                ErrorKind::CheckViolation => ConstraintKind::Check,
                _ => return StorageError::database(sqlx::Error::Database(db)),
            };
            StorageError::from_constraint(
                kind,
                ConstraintViolation {
                    table: db.table().map(str::to_string),
                    constraint: db.constraint().map(str::to_string),
                    message: db.message().to_string(),
                },
            )
        }
        sqlx::Error::RowNotFound => StorageError::NoRowFound,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StorageError::scan(err),
        other => StorageError::database(other),
    }
}
