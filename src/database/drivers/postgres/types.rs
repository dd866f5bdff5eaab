//! PostgreSQL type conversion utilities.
//!
//! This module handles conversion between PostgreSQL-specific types (from SQLx)
//! and the generic `Value` type used across all drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgColumn, PgRow, PgSslMode};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::database::traits::{ColumnInfo, SslMode, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub struct PgValueConverter;

impl PgValueConverter {
    /// Convert a PostgreSQL row into values, in column order.
    pub fn convert_row(pg_row: &PgRow) -> Vec<Value> {
        pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(pg_row, col, idx))
            .collect()
    }

    /// Build column info from a PostgreSQL row.
    pub fn build_column_info(pg_row: &PgRow) -> Vec<ColumnInfo> {
        pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| ColumnInfo::new(col.name(), col.type_info().name(), idx))
            .collect()
    }

    /// Extract a value from a PostgreSQL row at the given column index.
    fn extract_value(row: &PgRow, column: &PgColumn, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        let type_name = column.type_info().name();
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            // Integers
            "INT2" | "SMALLINT" | "SMALLSERIAL" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "INT4" | "INT" | "INTEGER" | "SERIAL" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "INT8" | "BIGINT" | "BIGSERIAL" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "OID" => row
                .try_get::<sqlx::postgres::types::Oid, _>(index)
                .map(|oid| Value::UInt32(oid.0))
                .unwrap_or(Value::Null),

            // Floating point
            "FLOAT4" | "REAL" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "FLOAT8" | "DOUBLE PRECISION" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "NUMERIC" | "DECIMAL" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or_else(|_| Self::decode_as_string_fallback(row, index, type_name)),

            // Text types
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BYTEA" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            // Date/Time types
            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" => row
                .try_get::<NaiveTime, _>(index)
                .map(Value::Time)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMPTZ" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .unwrap_or(Value::Null),

            "UUID" => row
                .try_get::<Uuid, _>(index)
                .map(Value::Uuid)
                .unwrap_or(Value::Null),

            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            // Array types - handle common ones
            "INT2[]" => Self::decode_array::<i16>(row, index, Value::Int16),
            "INT4[]" => Self::decode_array::<i32>(row, index, Value::Int32),
            "INT8[]" => Self::decode_array::<i64>(row, index, Value::Int64),
            "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
                Self::decode_array::<String>(row, index, Value::Text)
            }
            "BOOL[]" => Self::decode_array::<bool>(row, index, Value::Bool),
            "FLOAT4[]" => Self::decode_array::<f32>(row, index, Value::Float32),
            "FLOAT8[]" => Self::decode_array::<f64>(row, index, Value::Float64),
            "UUID[]" => Self::decode_array::<Uuid>(row, index, Value::Uuid),

            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Decode a one-dimensional array with nullable elements.
    fn decode_array<T>(row: &PgRow, index: usize, wrap: fn(T) -> Value) -> Value
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
        Vec<Option<T>>: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Vec<Option<T>>, _>(index)
            .map(|arr| {
                Value::Array(
                    arr.into_iter()
                        .map(|item| item.map(wrap).unwrap_or(Value::Null))
                        .collect(),
                )
            })
            .unwrap_or(Value::Null)
    }

    /// Fallback: try to decode as string representation for unknown types.
    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
        // Enums and domains over text decode as String
        if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: s,
            };
        }

        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }

    /// Map the generic SSL mode to PostgreSQL's.
    pub fn map_ssl_mode(mode: &SslMode) -> PgSslMode {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Bind a parameter to a PostgreSQL query.
///
/// PostgreSQL has no unsigned or single-byte integer types; those widen to the
/// next signed type (`u64` beyond `i64::MAX` binds as NUMERIC).
pub(crate) fn bind_postgres_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int8(v) => query.bind(*v as i16),
        Value::Int16(v) => query.bind(*v),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::UInt8(v) => query.bind(*v as i16),
        Value::UInt16(v) => query.bind(*v as i32),
        Value::UInt32(v) => query.bind(*v as i64),
        Value::UInt64(v) => match i64::try_from(*v) {
            Ok(v) => query.bind(v),
            Err(_) => query.bind(Decimal::from(*v)),
        },
        Value::Float32(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::DateTimeTz(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::Json(v) => query.bind(Json(v)),
        Value::Array(_) => query.bind(Json(serde_json::to_value(value).unwrap_or_default())),
        Value::Other { display, .. } => query.bind(display.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_mapping() {
        assert!(matches!(
            PgValueConverter::map_ssl_mode(&SslMode::Disable),
            PgSslMode::Disable
        ));
        assert!(matches!(
            PgValueConverter::map_ssl_mode(&SslMode::Prefer),
            PgSslMode::Prefer
        ));
        assert!(matches!(
            PgValueConverter::map_ssl_mode(&SslMode::VerifyFull),
            PgSslMode::VerifyFull
        ));
    }
}
