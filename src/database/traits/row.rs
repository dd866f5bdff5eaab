//! Database-agnostic row and value types.
//!
//! This module contains:
//! - `Value` - A unified value type that can represent any engine value
//! - `Row` - An ordered column name to value mapping
//! - `ColumnInfo` - Metadata about a column in a result set
//!
//! Values keep the engine's native scalar kind; nothing is coerced across
//! dialects. Serialization produces plain JSON scalars so a row renders as
//! `{"id": 1, "name": "a"}`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use uuid::Uuid;

/// A unified value type that can represent any value returned by the
/// supported engines.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,

    Bool(bool),

    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    // Unsigned integers (MySQL, ClickHouse, DuckDB)
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    Float32(f32),
    Float64(f64),

    Text(String),
    Bytes(Vec<u8>),

    // Temporal types
    Date(NaiveDate),
    Time(NaiveTime),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Date and time with timezone (stored as UTC)
    DateTimeTz(DateTime<Utc>),

    /// Decimal/numeric with arbitrary precision
    Decimal(Decimal),
    Uuid(Uuid),
    Json(serde_json::Value),

    /// Array of values (same type)
    Array(Vec<Value>),

    /// Engine-specific type that doesn't map to a standard type.
    Other {
        /// The engine-specific type name
        type_name: String,
        /// Text form as rendered by the engine
        display: String,
    },
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name for display purposes
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::DateTimeTz(_) => "datetimetz",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
            Value::Array(_) => "array",
            Value::Other { .. } => "other",
        }
    }

    /// Convert this value to a display string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int8(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt8(v) => v.to_string(),
            Value::UInt16(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::DateTimeTz(dt) => dt.to_rfc3339(),
            Value::Decimal(d) => d.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(j) => j.to_string(),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Other { display, .. } => display.clone(),
        }
    }

    /// Try to extract as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to extract as an i64 (widens smaller integers, checks u64 range)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::UInt8(v) => Some(*v as i64),
            Value::UInt16(v) => Some(*v as i64),
            Value::UInt32(v) => Some(*v as i64),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to extract as an f64 (will convert f32)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract as bytes reference
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Build a value from untyped JSON (CLI arguments, request bodies).
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt8(v) => serializer.serialize_u8(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Json(j) => j.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            // Everything else goes out as its canonical text form
            other => serializer.serialize_str(&other.to_display_string()),
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Metadata about a column in a query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Engine-specific type name
    pub type_name: String,
    /// Column position (0-indexed)
    pub ordinal: usize,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ordinal,
        }
    }
}

/// One result row: column names (shared by every row of a result) and the
/// values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Pair values with column names. Missing trailing values read as NULL.
    pub fn new(columns: Arc<[String]>, mut values: Vec<Value>) -> Self {
        values.resize(columns.len(), Value::Null);
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by index
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Pair raw value vectors with a shared column list.
pub fn rows_from_values(columns: &[String], rows: Vec<Vec<Value>>) -> Vec<Row> {
    let columns: Arc<[String]> = columns.into();
    rows.into_iter()
        .map(|values| Row::new(Arc::clone(&columns), values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_null_check() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(!Value::Int32(42).is_null());
        assert!(!Value::Text("hello".to_string()).is_null());
    }

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        assert_eq!(Value::Int64(-123).to_display_string(), "-123");
        assert_eq!(Value::Float64(3.5).to_display_string(), "3.5");
        assert_eq!(
            Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]).to_display_string(),
            "\\xdeadbeef"
        );
        assert_eq!(
            Value::Array(vec![Value::Int32(1), Value::Int32(2)]).to_display_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(Value::Int32(1)).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(Value::UInt64(u64::MAX)).unwrap(), json!(u64::MAX));
        assert_eq!(serde_json::to_value(Value::Text("a".into())).unwrap(), json!("a"));
        assert_eq!(
            serde_json::to_value(Value::Decimal(Decimal::new(1050, 2))).unwrap(),
            json!("10.50")
        );
        assert_eq!(
            serde_json::to_value(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
                .unwrap(),
            json!("2024-02-29")
        );
        assert_eq!(
            serde_json::to_value(Value::Json(json!({"k": [1, 2]}))).unwrap(),
            json!({"k": [1, 2]})
        );
        assert_eq!(
            serde_json::to_value(Value::Array(vec![Value::Bool(true), Value::Null])).unwrap(),
            json!([true, null])
        );
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let columns: Arc<[String]> = vec!["b".to_string(), "a".to_string()].into();
        let row = Row::new(columns, vec![Value::Int32(2), Value::Text("x".into())]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":2,"a":"x"}"#);
        assert_eq!(row.get("a"), Some(&Value::Text("x".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_rows_share_columns() {
        let rows = rows_from_values(
            &["id".to_string()],
            vec![vec![Value::Int64(1)], vec![]],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&Value::Null));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(json!(5)), Value::Int64(5));
        assert_eq!(Value::from_json(json!(u64::MAX)), Value::UInt64(u64::MAX));
        assert_eq!(Value::from_json(json!("s")), Value::Text("s".into()));
        assert_eq!(Value::from_json(json!([1])), Value::Json(json!([1])));
    }

    #[test]
    fn test_value_from_option() {
        let some_val: Value = Some(42i32).into();
        assert_eq!(some_val, Value::Int32(42));

        let none_val: Value = Option::<i32>::None.into();
        assert_eq!(none_val, Value::Null);
    }
}
