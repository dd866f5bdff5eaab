//! MySQL type conversion utilities.
//!
//! This module handles conversion between MySQL-specific types (from SQLx)
//! and the generic `Value` type used across all drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlRow, MySqlSslMode};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

use crate::database::traits::{ColumnInfo, SslMode, Value};

/// Converter for MySQL values to the unified `Value` type.
pub struct MySqlValueConverter;

impl MySqlValueConverter {
    /// Convert a MySQL row into values, in column order.
    pub fn convert_row(mysql_row: &MySqlRow) -> Vec<Value> {
        mysql_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(mysql_row, col, idx))
            .collect()
    }

    /// Build column info from a MySQL row.
    pub fn build_column_info(mysql_row: &MySqlRow) -> Vec<ColumnInfo> {
        mysql_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| ColumnInfo::new(col.name(), col.type_info().name(), idx))
            .collect()
    }

    /// Extract a value from a MySQL row at the given column index.
    fn extract_value(row: &MySqlRow, column: &MySqlColumn, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        let type_name = column.type_info().name();
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its MySQL type name.
    fn decode_by_type(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match type_name {
            // Boolean (MySQL uses TINYINT(1) for booleans)
            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            // Integers
            "TINYINT" => row
                .try_get::<i8, _>(index)
                .map(Value::Int8)
                .unwrap_or(Value::Null),

            "TINYINT UNSIGNED" => row
                .try_get::<u8, _>(index)
                .map(Value::UInt8)
                .unwrap_or(Value::Null),

            "SMALLINT" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "SMALLINT UNSIGNED" => row
                .try_get::<u16, _>(index)
                .map(Value::UInt16)
                .unwrap_or(Value::Null),

            "MEDIUMINT" | "INT" | "INTEGER" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(Value::UInt32)
                .unwrap_or(Value::Null),

            "BIGINT" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "BIGINT UNSIGNED" => row
                .try_get::<u64, _>(index)
                .map(Value::UInt64)
                .unwrap_or(Value::Null),

            // Floating point
            "FLOAT" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "DOUBLE" | "DOUBLE PRECISION" | "REAL" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            // Text types
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            // Binary types
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => row
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

            "DATETIME" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .or_else(|_| row.try_get::<NaiveDateTime, _>(index).map(Value::DateTime))
                .unwrap_or(Value::Null),

            "YEAR" => row
                .try_get::<u16, _>(index)
                .map(Value::UInt16)
                .unwrap_or(Value::Null),

            "JSON" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            // ENUM and SET types - treat as strings
            _ if type_name.starts_with("ENUM") || type_name.starts_with("SET") => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Fallback: try to decode as string representation for unknown types.
    fn decode_as_string_fallback(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        if let Ok(s) = row.try_get::<String, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: s,
            };
        }

        if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
            return Value::Other {
                type_name: type_name.to_string(),
                display: String::from_utf8_lossy(&bytes).to_string(),
            };
        }

        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }

    /// Map the generic SSL mode to MySQL's.
    pub fn map_ssl_mode(mode: &SslMode) -> MySqlSslMode {
        match mode {
            SslMode::Disable => MySqlSslMode::Disabled,
            SslMode::Prefer => MySqlSslMode::Preferred,
            SslMode::Require => MySqlSslMode::Required,
            SslMode::VerifyCa => MySqlSslMode::VerifyCa,
            SslMode::VerifyFull => MySqlSslMode::VerifyIdentity,
        }
    }
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int8(v) => query.bind(*v),
        Value::Int16(v) => query.bind(*v),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::UInt8(v) => query.bind(*v),
        Value::UInt16(v) => query.bind(*v),
        Value::UInt32(v) => query.bind(*v),
        Value::UInt64(v) => query.bind(*v),
        Value::Float32(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::DateTimeTz(v) => query.bind(*v),
        // MySQL has no native UUID type; CHAR(36) is the common column type
        Value::Uuid(v) => query.bind(v.to_string()),
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
            MySqlValueConverter::map_ssl_mode(&SslMode::Disable),
            MySqlSslMode::Disabled
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(&SslMode::Require),
            MySqlSslMode::Required
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(&SslMode::VerifyFull),
            MySqlSslMode::VerifyIdentity
        ));
    }
}
