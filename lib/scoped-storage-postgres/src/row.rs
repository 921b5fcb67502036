//! PostgreSQL rows to [`scoped_storage::Row`].

use chrono::{DateTime, NaiveDateTime, Utc};
use scoped_storage::{Row, StorageError};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// Convert every column of `row` to JSON, keyed by column name.
pub(crate) fn extract_row(row: &PgRow) -> Result<Row, StorageError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = extract_column_value(row, idx, column.type_info().name())?;
        out.insert(column.name(), value);
    }
    Ok(out)
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Result<Option<T>, StorageError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(idx).map_err(StorageError::scan)
}

/// Extract a column value from a row as JSON
fn extract_column_value(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, StorageError> {
    let is_null = row
        .try_get_raw(idx)
        .map(|raw| raw.is_null())
        .map_err(StorageError::scan)?;
    if is_null {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => get::<bool>(row, idx)?.map(Value::Bool),
        "INT2" => get::<i16>(row, idx)?.map(|n| Value::Number(n.into())),
        "INT4" => get::<i32>(row, idx)?.map(|n| Value::Number(n.into())),
        "INT8" => get::<i64>(row, idx)?.map(|n| Value::Number(n.into())),
        "FLOAT4" => get::<f32>(row, idx)?
            .and_then(|n| serde_json::Number::from_f64(n.into()).map(Value::Number)),
        "FLOAT8" => {
            get::<f64>(row, idx)?.and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
        }
        // Microsecond precision with Z, the serde format of Timestamp
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx)?.map(|dt| {
            Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
        }),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx)?.map(|dt| {
            Value::String(
                dt.and_utc()
                    .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            )
        }),
        "JSONB" | "JSON" => get::<Value>(row, idx)?,
        "BYTEA" => get::<Vec<u8>>(row, idx)?.map(Value::from),
        "TEXT[]" | "VARCHAR[]" => get::<Vec<String>>(row, idx)?.map(Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => get::<String>(row, idx)?.map(Value::String),
        "UUID" | "INTERVAL" | "NUMERIC" => {
            return Err(StorageError::UnsupportedScanSource(type_name.to_string()));
        }
        // Enums travel as text on the wire
        other => match row.try_get_unchecked::<Option<String>, _>(idx) {
            Ok(v) => v.map(Value::String),
            Err(_) => return Err(StorageError::UnsupportedScanSource(other.to_string())),
        },
    };

    Ok(value.unwrap_or(Value::Null))
}
