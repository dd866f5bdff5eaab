//! MySQL table introspection.

use anyhow::Result;
use sqlx::mysql::MySqlConnection;
use sqlx::Row;

use crate::database::traits::{IndexType, TableColumn, TableRef, Value};

// information_schema columns come back as binary strings on some server
// versions; CAST keeps them decodable as String.
const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(COLUMN_TYPE AS CHAR) AS column_type,
        CAST(IS_NULLABLE AS CHAR) AS is_nullable,
        CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
        CAST(COLUMN_KEY AS CHAR) AS column_key,
        CAST(EXTRA AS CHAR) AS extra,
        CAST(COLUMN_COMMENT AS CHAR) AS column_comment
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
        AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

/// Describe a table, or `None` if it does not exist.
///
/// MySQL tables always have at least one column, so no rows means no table.
pub(super) async fn describe_table(
    conn: &mut MySqlConnection,
    table: &TableRef,
) -> Result<Option<Vec<TableColumn>>> {
    let rows = sqlx::query(COLUMNS_QUERY)
        .bind(table.schema())
        .bind(table.name.as_str())
        .fetch_all(&mut *conn)
        .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let columns = rows
        .into_iter()
        .map(|row| {
            let is_nullable: String = row.try_get("is_nullable")?;
            let column_key: Option<String> = row.try_get("column_key")?;
            let default: Option<String> = row.try_get("column_default")?;

            Ok(TableColumn::new(
                row.try_get::<String, _>("column_name")?,
                row.try_get::<String, _>("column_type")?,
            )
            .with_nullable(is_nullable.eq_ignore_ascii_case("YES"))
            .with_default(default.map(Value::Text))
            .with_index(column_key.as_deref().and_then(IndexType::from_key_marker))
            .with_extra(row.try_get("extra")?)
            .with_comment(row.try_get("column_comment")?))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(columns))
}
