//! DuckDB value type conversions.
//!
//! This module handles converting DuckDB values to and from the unified
//! `Value` type.

use chrono::{NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value as DuckValue, ValueRef};
use duckdb::Row;

use crate::database::traits::{ColumnInfo, Value};

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converter between DuckDB values and unified Value types.
pub struct DuckDbValueConverter;

impl DuckDbValueConverter {
    /// Convert a DuckDB row into values, in column order.
    pub fn convert_row(duckdb_row: &Row<'_>, column_count: usize) -> Vec<Value> {
        (0..column_count)
            .map(|i| Self::extract_value(duckdb_row, i))
            .collect()
    }

    /// Build column info from an executed DuckDB statement.
    pub fn build_column_info(stmt: &duckdb::Statement<'_>) -> Vec<ColumnInfo> {
        stmt.column_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let type_name = format!("{:?}", stmt.column_type(i));
                ColumnInfo::new(name, type_name, i)
            })
            .collect()
    }

    fn extract_value(row: &Row<'_>, index: usize) -> Value {
        match row.get_ref(index) {
            Ok(value_ref) => Self::value_ref_to_value(value_ref),
            Err(_) => Value::Null,
        }
    }

    /// Convert a DuckDB ValueRef to our Value type.
    pub fn value_ref_to_value(value_ref: ValueRef<'_>) -> Value {
        match value_ref {
            ValueRef::Null => Value::Null,
            ValueRef::Boolean(b) => Value::Bool(b),
            ValueRef::TinyInt(i) => Value::Int8(i),
            ValueRef::SmallInt(i) => Value::Int16(i),
            ValueRef::Int(i) => Value::Int32(i),
            ValueRef::BigInt(i) => Value::Int64(i),
            ValueRef::HugeInt(i) => Value::Other {
                type_name: "hugeint".to_string(),
                display: i.to_string(),
            },
            ValueRef::UTinyInt(i) => Value::UInt8(i),
            ValueRef::USmallInt(i) => Value::UInt16(i),
            ValueRef::UInt(i) => Value::UInt32(i),
            ValueRef::UBigInt(i) => Value::UInt64(i),
            ValueRef::Float(f) => Value::Float32(f),
            ValueRef::Double(f) => Value::Float64(f),
            ValueRef::Decimal(d) => Value::Decimal(d),
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).to_string()),
            ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
            ValueRef::Date32(days) => Self::date_from_days(days),
            ValueRef::Time64(unit, value) => Self::time_from_unit(unit, value),
            ValueRef::Timestamp(unit, value) => {
                let micros = to_micros(unit, value);
                match chrono::DateTime::from_timestamp_micros(micros) {
                    Some(dt) => Value::DateTime(dt.naive_utc()),
                    None => Value::Other {
                        type_name: "timestamp".to_string(),
                        display: format!("TIMESTAMP({})", value),
                    },
                }
            }
            ValueRef::Interval { months, days, nanos } => Value::Other {
                type_name: "interval".to_string(),
                display: format!("{} months {} days {} ns", months, days, nanos),
            },
            // Nested and dictionary types: go through the owned form
            other => Self::owned_to_value(DuckValue::from(other)),
        }
    }

    fn owned_to_value(value: DuckValue) -> Value {
        match value {
            DuckValue::List(items) | DuckValue::Array(items) => {
                Value::Array(items.into_iter().map(Self::owned_to_value).collect())
            }
            DuckValue::Enum(label) => Value::Text(label),
            DuckValue::Null => Value::Null,
            DuckValue::Boolean(b) => Value::Bool(b),
            DuckValue::TinyInt(i) => Value::Int8(i),
            DuckValue::SmallInt(i) => Value::Int16(i),
            DuckValue::Int(i) => Value::Int32(i),
            DuckValue::BigInt(i) => Value::Int64(i),
            DuckValue::UTinyInt(i) => Value::UInt8(i),
            DuckValue::USmallInt(i) => Value::UInt16(i),
            DuckValue::UInt(i) => Value::UInt32(i),
            DuckValue::UBigInt(i) => Value::UInt64(i),
            DuckValue::Float(f) => Value::Float32(f),
            DuckValue::Double(f) => Value::Float64(f),
            DuckValue::Decimal(d) => Value::Decimal(d),
            DuckValue::Text(s) => Value::Text(s),
            DuckValue::Blob(b) => Value::Bytes(b),
            DuckValue::Date32(days) => Self::date_from_days(days),
            other => Value::Other {
                type_name: "nested".to_string(),
                display: format!("{:?}", other),
            },
        }
    }

    fn date_from_days(days: i32) -> Value {
        match NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE) {
            Some(d) => Value::Date(d),
            None => Value::Other {
                type_name: "date".to_string(),
                display: format!("DATE({})", days),
            },
        }
    }

    fn time_from_unit(unit: TimeUnit, value: i64) -> Value {
        let micros = to_micros(unit, value);
        let secs = (micros / 1_000_000) as u32;
        let nanos = ((micros % 1_000_000) * 1000) as u32;
        match NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos) {
            Some(t) => Value::Time(t),
            None => Value::Other {
                type_name: "time".to_string(),
                display: format!("TIME({})", micros),
            },
        }
    }

    /// Convert a bound parameter into a DuckDB value.
    ///
    /// Temporal values, UUIDs and JSON go in as text; DuckDB casts them to the
    /// parameter's inferred type.
    pub fn to_duckdb(value: &Value) -> DuckValue {
        match value {
            Value::Null => DuckValue::Null,
            Value::Bool(b) => DuckValue::Boolean(*b),
            Value::Int8(i) => DuckValue::TinyInt(*i),
            Value::Int16(i) => DuckValue::SmallInt(*i),
            Value::Int32(i) => DuckValue::Int(*i),
            Value::Int64(i) => DuckValue::BigInt(*i),
            Value::UInt8(i) => DuckValue::UTinyInt(*i),
            Value::UInt16(i) => DuckValue::USmallInt(*i),
            Value::UInt32(i) => DuckValue::UInt(*i),
            Value::UInt64(i) => DuckValue::UBigInt(*i),
            Value::Float32(f) => DuckValue::Float(*f),
            Value::Float64(f) => DuckValue::Double(*f),
            Value::Decimal(d) => DuckValue::Decimal(*d),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Bytes(b) => DuckValue::Blob(b.clone()),
            Value::Json(j) => DuckValue::Text(j.to_string()),
            other => DuckValue::Text(other.to_display_string()),
        }
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value * 1_000_000,
        TimeUnit::Millisecond => value * 1_000,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversion_scalars() {
        assert!(matches!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::Null),
            Value::Null
        ));
        assert!(matches!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::Boolean(true)),
            Value::Bool(true)
        ));
        assert!(matches!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::BigInt(42)),
            Value::Int64(42)
        ));
        assert!(matches!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::UBigInt(7)),
            Value::UInt64(7)
        ));
        assert!(matches!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::Text(b"hello")),
            Value::Text(ref s) if s == "hello"
        ));
    }

    #[test]
    fn test_value_conversion_temporal() {
        assert_eq!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::Date32(0)),
            Value::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        );
        assert_eq!(
            DuckDbValueConverter::value_ref_to_value(ValueRef::Time64(
                TimeUnit::Microsecond,
                3_661_000_000
            )),
            Value::Time(NaiveTime::from_hms_opt(1, 1, 1).unwrap())
        );
        match DuckDbValueConverter::value_ref_to_value(ValueRef::Timestamp(TimeUnit::Second, 86_400)) {
            Value::DateTime(dt) => assert_eq!(dt.to_string(), "1970-01-02 00:00:00"),
            other => panic!("Expected DateTime, got {:?}", other),
        }
    }

    #[test]
    fn test_param_conversion() {
        assert!(matches!(
            DuckDbValueConverter::to_duckdb(&Value::Int64(5)),
            DuckValue::BigInt(5)
        ));
        assert!(matches!(
            DuckDbValueConverter::to_duckdb(&Value::Null),
            DuckValue::Null
        ));
        match DuckDbValueConverter::to_duckdb(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())) {
            DuckValue::Text(s) => assert_eq!(s, "2024-01-31"),
            other => panic!("Expected Text, got {:?}", other),
        }
    }
}
