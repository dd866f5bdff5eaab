//! ClickHouse type conversion utilities.
//!
//! ClickHouse is queried over HTTP with the `JSONCompact` output format, so
//! values arrive as JSON and are converted using the column type names from
//! the `meta` block.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::database::traits::{ColumnInfo, SslMode, Value};

/// Converter for ClickHouse JSON values to the unified `Value` type.
pub struct ClickHouseValueConverter;

impl ClickHouseValueConverter {
    /// Split a `JSONCompact` body into column info and row values.
    pub fn parse_json_compact(json: &JsonValue) -> (Vec<ColumnInfo>, Vec<Vec<Value>>) {
        let columns: Vec<ColumnInfo> = json
            .get("meta")
            .and_then(|m| m.as_array())
            .map(|meta| {
                meta.iter()
                    .enumerate()
                    .filter_map(|(idx, m)| {
                        let name = m.get("name")?.as_str()?;
                        let type_name = m.get("type")?.as_str()?;
                        Some(ColumnInfo::new(name, type_name, idx))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows = json
            .get("data")
            .and_then(|d| d.as_array())
            .map(|data| {
                data.iter()
                    .map(|row| match row.as_array() {
                        Some(cells) => cells
                            .iter()
                            .enumerate()
                            .map(|(idx, val)| {
                                let type_name = columns
                                    .get(idx)
                                    .map(|c| c.type_name.as_str())
                                    .unwrap_or("String");
                                Self::json_to_value(val, type_name)
                            })
                            .collect(),
                        None => Vec::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        (columns, rows)
    }

    /// Convert a JSON value to our unified Value type, guided by the
    /// ClickHouse type name.
    pub fn json_to_value(json: &JsonValue, type_name: &str) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Self::convert_number(n, type_name),
            JsonValue::String(s) => Self::convert_string(s, type_name),
            JsonValue::Array(arr) => Self::convert_array(arr, type_name),
            JsonValue::Object(_) => Value::Json(json.clone()),
        }
    }

    fn convert_number(n: &serde_json::Number, type_name: &str) -> Value {
        let lower = type_name.to_lowercase();
        let inner = inner_type(&lower);

        match inner {
            "uint8" => n.as_u64().map(|v| Value::UInt8(v as u8)).unwrap_or(Value::Null),
            "uint16" => n.as_u64().map(|v| Value::UInt16(v as u16)).unwrap_or(Value::Null),
            "uint32" => n.as_u64().map(|v| Value::UInt32(v as u32)).unwrap_or(Value::Null),
            "uint64" => n.as_u64().map(Value::UInt64).unwrap_or(Value::Null),
            "int8" => n.as_i64().map(|v| Value::Int8(v as i8)).unwrap_or(Value::Null),
            "int16" => n.as_i64().map(|v| Value::Int16(v as i16)).unwrap_or(Value::Null),
            "int32" => n.as_i64().map(|v| Value::Int32(v as i32)).unwrap_or(Value::Null),
            "int64" => n.as_i64().map(Value::Int64).unwrap_or(Value::Null),
            "float32" => n.as_f64().map(|v| Value::Float32(v as f32)).unwrap_or(Value::Null),
            "float64" => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            _ if inner.starts_with("decimal") => n
                .to_string()
                .parse::<rust_decimal::Decimal>()
                .map(Value::Decimal)
                .unwrap_or_else(|_| n.as_f64().map(Value::Float64).unwrap_or(Value::Null)),
            _ => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    n.as_f64().map(Value::Float64).unwrap_or(Value::Null)
                }
            }
        }
    }

    fn convert_string(s: &str, type_name: &str) -> Value {
        let lower = type_name.to_lowercase();
        let inner = inner_type(&lower);
        let text = || Value::Text(s.to_string());

        match inner {
            "uuid" => uuid::Uuid::parse_str(s).map(Value::Uuid).unwrap_or_else(|_| text()),
            "date" | "date32" => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or_else(|_| text()),
            _ if inner.starts_with("datetime") => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .map(Value::DateTime)
                .unwrap_or_else(|_| text()),
            // 128/256-bit integers and quoted 64-bit ones
            "uint64" => s.parse().map(Value::UInt64).unwrap_or_else(|_| text()),
            "int64" => s.parse().map(Value::Int64).unwrap_or_else(|_| text()),
            _ if inner.starts_with("decimal") => s
                .parse::<rust_decimal::Decimal>()
                .map(Value::Decimal)
                .unwrap_or_else(|_| text()),
            _ => text(),
        }
    }

    fn convert_array(arr: &[JsonValue], type_name: &str) -> Value {
        let lower = type_name.to_lowercase();
        let element_type = inner_type(&lower)
            .strip_prefix("array(")
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or("string");

        Value::Array(arr.iter().map(|v| Self::json_to_value(v, element_type)).collect())
    }

    /// Whether the HTTP interface should be reached over HTTPS.
    pub fn use_https(mode: &SslMode) -> bool {
        mode.requires_tls()
    }
}

/// Strip `Nullable(...)` and `LowCardinality(...)` wrappers from a lowercased
/// type name.
fn inner_type(type_lower: &str) -> &str {
    let mut inner = type_lower;
    loop {
        let stripped = inner
            .strip_prefix("nullable(")
            .or_else(|| inner.strip_prefix("lowcardinality("))
            .and_then(|t| t.strip_suffix(')'));
        match stripped {
            Some(t) => inner = t,
            None => return inner,
        }
    }
}

/// Render a value for a `param_<name>` query-string setting.
///
/// ClickHouse parses parameter values in its escaped text format, where
/// `\N` is NULL.
pub(crate) fn param_value(value: &Value) -> String {
    match value {
        Value::Null => "\\N".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(array_element).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Json(json) => json.to_string(),
        other => other.to_display_string(),
    }
}

fn array_element(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(_)
        | Value::Date(_)
        | Value::Time(_)
        | Value::DateTime(_)
        | Value::DateTimeTz(_)
        | Value::Uuid(_)
        | Value::Other { .. } => {
            let s = value.to_display_string();
            format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        other => param_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inner_type() {
        assert_eq!(inner_type("nullable(uint8)"), "uint8");
        assert_eq!(inner_type("lowcardinality(nullable(string))"), "string");
        assert_eq!(inner_type("int32"), "int32");
    }

    #[test]
    fn test_parse_json_compact() {
        let body = json!({
            "meta": [
                {"name": "id", "type": "UInt32"},
                {"name": "name", "type": "Nullable(String)"}
            ],
            "data": [[1, "a"], [2, null]],
            "rows": 2
        });

        let (columns, rows) = ClickHouseValueConverter::parse_json_compact(&body);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].type_name, "Nullable(String)");
        assert_eq!(rows[0], vec![Value::UInt32(1), Value::Text("a".into())]);
        assert_eq!(rows[1], vec![Value::UInt32(2), Value::Null]);
    }

    #[test]
    fn test_string_conversions() {
        let date = ClickHouseValueConverter::json_to_value(&json!("2024-03-01"), "Date");
        assert!(matches!(date, Value::Date(_)));

        let ts = ClickHouseValueConverter::json_to_value(&json!("2024-03-01 10:00:00"), "DateTime('UTC')");
        assert!(matches!(ts, Value::DateTime(_)));

        let big = ClickHouseValueConverter::json_to_value(&json!("18446744073709551615"), "UInt64");
        assert_eq!(big, Value::UInt64(u64::MAX));
    }

    #[test]
    fn test_param_value() {
        assert_eq!(param_value(&Value::Null), "\\N");
        assert_eq!(param_value(&Value::Int64(7)), "7");
        assert_eq!(param_value(&Value::Text("x".into())), "x");
        assert_eq!(
            param_value(&Value::Array(vec![Value::Text("it's".into()), Value::Int32(1)])),
            "['it\\'s',1]"
        );
    }
}
