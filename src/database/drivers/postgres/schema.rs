//! PostgreSQL table introspection.
//!
//! Reads `pg_catalog` directly. Unlike the other engines, PostgreSQL allows a
//! table with zero columns, so existence is checked separately.

use anyhow::Result;
use sqlx::postgres::PgConnection;
use sqlx::Row;

use crate::database::traits::{IndexType, TableColumn, TableRef, Value};

const EXISTS_QUERY: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relname = $1
            AND n.nspname = COALESCE($2::text, current_schema()::text)
            AND c.relkind IN ('r', 'p', 'v', 'm', 'f')
    )
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        a.attname::text AS column_name,
        format_type(a.atttypid, a.atttypmod) AS column_type,
        NOT a.attnotnull AS is_nullable,
        pg_get_expr(d.adbin, d.adrelid) AS column_default,
        CASE
            WHEN bool_or(ix.indisprimary) THEN 'primary'
            WHEN bool_or(ix.indisunique) THEN 'unique'
            WHEN count(ix.indexrelid) > 0 THEN 'index'
        END AS index_type,
        CASE
            WHEN a.attidentity = 'a' THEN 'identity always'
            WHEN a.attidentity = 'd' THEN 'identity by default'
            WHEN a.attgenerated = 's' THEN 'generated stored'
        END AS extra,
        col_description(c.oid, a.attnum) AS comment
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    LEFT JOIN pg_catalog.pg_index ix ON ix.indrelid = c.oid AND a.attnum = ANY(ix.indkey)
    WHERE c.relname = $1
        AND n.nspname = COALESCE($2::text, current_schema()::text)
        AND a.attnum > 0
        AND NOT a.attisdropped
    GROUP BY a.attnum, a.attname, a.atttypid, a.atttypmod, a.attnotnull,
        d.adbin, d.adrelid, a.attidentity, a.attgenerated, c.oid
    ORDER BY a.attnum
"#;

/// Describe a table, or `None` if it does not exist.
pub(super) async fn describe_table(
    conn: &mut PgConnection,
    table: &TableRef,
) -> Result<Option<Vec<TableColumn>>> {
    let exists: bool = sqlx::query_scalar(EXISTS_QUERY)
        .bind(table.name.as_str())
        .bind(table.schema())
        .fetch_one(&mut *conn)
        .await?;

    if !exists {
        return Ok(None);
    }

    let rows = sqlx::query(COLUMNS_QUERY)
        .bind(table.name.as_str())
        .bind(table.schema())
        .fetch_all(&mut *conn)
        .await?;

    let columns = rows
        .into_iter()
        .map(|row| {
            let default: Option<String> = row.try_get("column_default")?;
            let index_type: Option<String> = row.try_get("index_type")?;

            Ok(TableColumn::new(
                row.try_get::<String, _>("column_name")?,
                row.try_get::<String, _>("column_type")?,
            )
            .with_nullable(row.try_get("is_nullable")?)
            .with_default(default.map(Value::Text))
            .with_index(index_type.as_deref().and_then(parse_index_type))
            .with_extra(row.try_get("extra")?)
            .with_comment(row.try_get("comment")?))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(columns))
}

fn parse_index_type(s: &str) -> Option<IndexType> {
    match s {
        "primary" => Some(IndexType::Primary),
        "unique" => Some(IndexType::Unique),
        "index" => Some(IndexType::Index),
        _ => None,
    }
}
