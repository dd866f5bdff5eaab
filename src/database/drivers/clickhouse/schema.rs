//! ClickHouse table introspection via `system.columns`.

use anyhow::Result;

use super::connection::HttpEndpoint;
use super::types::ClickHouseValueConverter;
use crate::database::traits::{IndexType, TableColumn, TableRef, Value};

const COLUMNS_QUERY: &str = r#"
    SELECT
        name,
        type,
        default_kind,
        default_expression,
        comment,
        is_in_primary_key,
        is_in_sorting_key
    FROM system.columns
    WHERE database = if(empty({database:String}), currentDatabase(), {database:String})
        AND table = {table:String}
    ORDER BY position
"#;

/// Describe a table, or `None` if it does not exist.
///
/// ClickHouse tables always have at least one column, so no rows means no
/// table.
pub(super) async fn describe_table(
    endpoint: &HttpEndpoint,
    table: &TableRef,
) -> Result<Option<Vec<TableColumn>>> {
    let params = [
        (
            "database".to_string(),
            Value::Text(table.schema().unwrap_or_default().to_string()),
        ),
        ("table".to_string(), Value::Text(table.name.clone())),
    ];

    let json = endpoint.query_json(COLUMNS_QUERY, &params).await?;
    let (_, rows) = ClickHouseValueConverter::parse_json_compact(&json);

    if rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(rows.iter().map(|row| to_table_column(row)).collect()))
}

fn to_table_column(row: &[Value]) -> TableColumn {
    let text = |idx: usize| row.get(idx).and_then(Value::as_str).unwrap_or_default();
    let flag = |idx: usize| row.get(idx).and_then(Value::as_i64).unwrap_or(0) != 0;

    let column_type = text(1);
    let index_type = if flag(5) {
        Some(IndexType::Primary)
    } else if flag(6) {
        Some(IndexType::Index)
    } else {
        None
    };
    let default = Some(text(3))
        .filter(|s| !s.is_empty())
        .map(|s| Value::Text(s.to_string()));

    TableColumn::new(text(0), column_type)
        .with_nullable(column_type.starts_with("Nullable("))
        .with_default(default)
        .with_index(index_type)
        .with_extra(Some(text(2).to_lowercase()))
        .with_comment(Some(text(4).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, ty: &str, kind: &str, expr: &str, pk: u8, sk: u8) -> Vec<Value> {
        vec![
            Value::Text(name.into()),
            Value::Text(ty.into()),
            Value::Text(kind.into()),
            Value::Text(expr.into()),
            Value::Text(String::new()),
            Value::UInt8(pk),
            Value::UInt8(sk),
        ]
    }

    #[test]
    fn test_primary_key_column() {
        let col = to_table_column(&row("id", "UInt64", "", "", 1, 1));
        assert_eq!(col.name, "id");
        assert!(col.is_primary_key);
        assert!(!col.is_nullable);
        assert_eq!(col.index_type, Some(IndexType::Primary));
        assert_eq!(col.default_value, None);
        assert_eq!(col.extra, None);
    }

    #[test]
    fn test_nullable_default_column() {
        let col = to_table_column(&row("note", "Nullable(String)", "DEFAULT", "'x'", 0, 0));
        assert!(col.is_nullable);
        assert!(!col.is_primary_key);
        assert_eq!(col.index_type, None);
        assert_eq!(col.default_value, Some(Value::Text("'x'".into())));
        assert_eq!(col.extra.as_deref(), Some("default"));
    }

    #[test]
    fn test_sorting_key_column() {
        let col = to_table_column(&row("ts", "DateTime", "", "", 0, 1));
        assert_eq!(col.index_type, Some(IndexType::Index));
        assert!(!col.is_primary_key);
    }
}
