//! DuckDB table introspection.
//!
//! Reads `duckdb_columns()` and `duckdb_constraints()`. Runs on the blocking
//! pool together with the rest of the DuckDB work.

use anyhow::{Context, Result};
use duckdb::{params, Connection};

use crate::database::traits::{IndexType, TableColumn, TableRef, Value};

const COLUMNS_QUERY: &str = r#"
    WITH keys AS (
        SELECT unnest(constraint_column_names) AS column_name, constraint_type
        FROM duckdb_constraints()
        WHERE database_name = current_database()
            AND schema_name = ?
            AND table_name = ?
            AND constraint_type IN ('PRIMARY KEY', 'UNIQUE')
    )
    SELECT
        c.column_name,
        c.data_type,
        c.is_nullable,
        c.column_default,
        c.comment,
        bool_or(k.constraint_type = 'PRIMARY KEY') AS is_primary,
        bool_or(k.constraint_type = 'UNIQUE') AS is_unique
    FROM duckdb_columns() c
    LEFT JOIN keys k ON k.column_name = c.column_name
    WHERE c.database_name = current_database()
        AND c.schema_name = ?
        AND c.table_name = ?
    GROUP BY c.column_index, c.column_name, c.data_type, c.is_nullable, c.column_default, c.comment
    ORDER BY c.column_index
"#;

/// Describe a table, or `None` if it does not exist.
///
/// DuckDB tables and views always have at least one column, so an empty
/// catalog answer means the table is missing.
pub(super) fn describe_table(conn: &Connection, table: &TableRef) -> Result<Option<Vec<TableColumn>>> {
    let schema = match table.schema() {
        Some(schema) => schema.to_string(),
        None => conn
            .query_row("SELECT current_schema()", [], |row| row.get::<_, String>(0))
            .context("Failed to read current schema")?,
    };

    let mut stmt = conn.prepare(COLUMNS_QUERY)?;
    let rows = stmt.query_map(
        params![schema, table.name, schema, table.name],
        |row| {
            let name: String = row.get(0)?;
            let data_type: String = row.get(1)?;
            let is_nullable: bool = row.get(2)?;
            let default: Option<String> = row.get(3)?;
            let comment: Option<String> = row.get(4)?;
            let is_primary: Option<bool> = row.get(5)?;
            let is_unique: Option<bool> = row.get(6)?;

            let index_type = if is_primary.unwrap_or(false) {
                Some(IndexType::Primary)
            } else if is_unique.unwrap_or(false) {
                Some(IndexType::Unique)
            } else {
                None
            };

            Ok(TableColumn::new(name, data_type)
                .with_nullable(is_nullable)
                .with_default(default.map(Value::Text))
                .with_index(index_type)
                .with_comment(comment))
        },
    )?;

    let columns = rows.collect::<Result<Vec<_>, _>>()?;
    Ok((!columns.is_empty()).then_some(columns))
}
