//! Statement arguments to sqlx bind parameters.

use scoped_storage::{StorageError, Value};
use sqlx::Arguments;
use sqlx::postgres::PgArguments;

/// Bind every argument of a statement, in placeholder order.
pub(crate) fn bind_args(values: &[Value]) -> Result<PgArguments, StorageError> {
    let mut args = PgArguments::default();
    for value in values {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

/// Bind a Value to PgArguments.
fn bind_value(args: &mut PgArguments, value: &Value) -> Result<(), StorageError> {
    match value {
        Value::String(s) => args.add(s.as_str()),
        Value::Int(n) => args.add(*n),
        Value::Float(n) => args.add(*n),
        Value::Bool(b) => args.add(*b),
        Value::Bytes(b) => args.add(b.as_slice()),
        Value::Strings(v) => args.add(v.as_slice()),
        Value::Timestamp(ts) => args.add(*ts.inner()),
        Value::Json(json) => args.add(json),
        Value::Null => args.add(None::<String>),
    }
    .map_err(StorageError::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoped_storage::Timestamp;
    use serde_json::json;

    #[test]
    fn binds_one_parameter_per_value() {
        let args = bind_args(&[
            Value::from("i1"),
            Value::Int(3),
            Value::Bytes(vec![1, 2]),
            Value::Strings(vec!["a".into()]),
            Value::Timestamp(Timestamp::now()),
            Value::Json(json!({"a": 1})),
            Value::Null,
        ])
        .unwrap();
        assert_eq!(args.len(), 7);
    }
}
