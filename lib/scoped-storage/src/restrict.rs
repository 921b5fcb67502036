use crate::{Column, Condition, StorageError};

/// Reject a condition that does not pin every `required` column to one value.
///
/// Every read, update, delete and activation passes through here before any
/// SQL is produced. A missing condition fails on the first required column.
pub fn check_restrictions(
    condition: Option<&Condition>,
    required: &[Column],
) -> Result<(), StorageError> {
    for column in required {
        let restricted = condition.is_some_and(|c| c.is_restricting_column(column));
        if !restricted {
            tracing::debug!(column = %column, "condition does not restrict required column");
            return Err(StorageError::MissingCondition(*column));
        }
    }
    Ok(())
}
