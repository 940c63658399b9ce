//! Decoding Postgres rows into dynamic values.

use pgstage_core::{RowMap, Value};
use tokio_postgres::Row;

use crate::error::{PgError, PgResult};

/// Decode every column of a row by name.
pub fn row_to_map(row: &Row) -> PgResult<RowMap> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| Ok((column.name().to_string(), row_to_value(row, i)?)))
        .collect()
}

/// Convert a row column to a Value.
///
/// `numeric` has no lossless float decoding in the driver; queries cast it to
/// `float8` before it gets here.
pub fn row_to_value(row: &Row, index: usize) -> PgResult<Value> {
    let column = &row.columns()[index];
    let decode_err = |e: tokio_postgres::Error| PgError::Decode {
        column: column.name().to_string(),
        message: e.to_string(),
    };

    let value = match column.type_().name() {
        "bool" => row
            .try_get::<_, Option<bool>>(index)
            .map_err(decode_err)?
            .map(Value::Bool),
        "int2" => row
            .try_get::<_, Option<i16>>(index)
            .map_err(decode_err)?
            .map(|i| Value::Int(i as i64)),
        "int4" => row
            .try_get::<_, Option<i32>>(index)
            .map_err(decode_err)?
            .map(|i| Value::Int(i as i64)),
        "int8" => row
            .try_get::<_, Option<i64>>(index)
            .map_err(decode_err)?
            .map(Value::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(index)
            .map_err(decode_err)?
            .map(|f| Value::Float(f as f64)),
        "float8" => row
            .try_get::<_, Option<f64>>(index)
            .map_err(decode_err)?
            .map(Value::Float),
        "text" | "varchar" | "char" | "bpchar" | "name" => row
            .try_get::<_, Option<String>>(index)
            .map_err(decode_err)?
            .map(Value::String),
        "uuid" => row
            .try_get::<_, Option<uuid::Uuid>>(index)
            .map_err(decode_err)?
            .map(|u| Value::String(u.to_string())),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)
            .map_err(decode_err)?
            .map(|dt| Value::String(dt.to_rfc3339())),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(index)
            .map_err(decode_err)?
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(index)
            .map_err(decode_err)?
            .map(|d| Value::String(d.to_string())),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .map_err(decode_err)?
            .map(Value::from),
        other => {
            return Err(PgError::Decode {
                column: column.name().to_string(),
                message: format!("unsupported type '{}'", other),
            })
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

pub(crate) fn get_i64(map: &RowMap, column: &str) -> PgResult<i64> {
    map.get(column)
        .and_then(Value::as_i64)
        .ok_or_else(|| missing(column, "an integer"))
}

pub(crate) fn get_f64(map: &RowMap, column: &str) -> PgResult<f64> {
    map.get(column)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(column, "a number"))
}

pub(crate) fn get_string(map: &RowMap, column: &str) -> PgResult<String> {
    map.get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(column, "text"))
}

fn missing(column: &str, expected: &str) -> PgError {
    PgError::Decode {
        column: column.to_string(),
        message: format!("expected {}", expected),
    }
}
