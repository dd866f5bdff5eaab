//! DuckDB engine adapter.
//!
//! DuckDB uses a synchronous API. The connection moves into `smol::unblock`
//! for each call and comes back when the call finishes; if the future is
//! dropped mid-call the connection is gone and the adapter reports itself
//! disconnected.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use duckdb::{params_from_iter, AccessMode, Config, Connection};
use std::path::PathBuf;

use super::schema;
use super::types::DuckDbValueConverter;
use crate::database::statement::StatementKind;
use crate::database::traits::{
    BoxedAdapter, Credentials, Dialect, EngineAdapter, Params, RawResponse, TableColumn, TableRef,
};

/// One DuckDB connection (file-backed or in-memory).
pub struct DuckDbAdapter {
    target: String,
    connection: Option<Connection>,
}

impl std::fmt::Debug for DuckDbAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbAdapter")
            .field("target", &self.target)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

enum Target {
    File { path: PathBuf, read_only: bool },
    InMemory,
}

impl DuckDbAdapter {
    /// Open a DuckDB database.
    pub async fn open(credentials: &Credentials) -> Result<Self> {
        let target = Self::target(credentials)?;
        let label = match &target {
            Target::File { path, .. } => path.display().to_string(),
            Target::InMemory => ":memory:".to_string(),
        };

        let connection = smol::unblock(move || Self::build_connection(target)).await?;

        Ok(Self {
            target: label,
            connection: Some(connection),
        })
    }

    /// Create a boxed adapter (for factory use).
    pub async fn boxed(credentials: &Credentials) -> Result<BoxedAdapter> {
        Ok(Box::new(Self::open(credentials).await?))
    }

    fn target(credentials: &Credentials) -> Result<Target> {
        match credentials {
            Credentials::File { path, read_only } => Ok(Target::File {
                path: path.clone(),
                read_only: *read_only,
            }),
            Credentials::InMemory => Ok(Target::InMemory),
            Credentials::Server { .. } => Err(anyhow!("DuckDB does not support server connections")),
        }
    }

    fn build_connection(target: Target) -> Result<Connection> {
        match target {
            Target::File { path, read_only } => {
                let cfg = if read_only {
                    Config::default().access_mode(AccessMode::ReadOnly)?
                } else {
                    Config::default()
                };

                Connection::open_with_flags(&path, cfg)
                    .with_context(|| format!("Failed to open DuckDB file {}", path.display()))
            }
            Target::InMemory => {
                Connection::open_in_memory().context("Failed to create in-memory DuckDB")
            }
        }
    }

    /// Run `work` against the connection on the blocking pool.
    async fn with_connection<T, F>(&mut self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self
            .connection
            .take()
            .ok_or_else(|| anyhow!("DuckDB connection is not available"))?;

        let (conn, result) = smol::unblock(move || {
            let result = work(&conn);
            (conn, result)
        })
        .await;

        self.connection = Some(conn);
        result
    }

    fn execute_sync(
        conn: &Connection,
        sql: &str,
        kind: StatementKind,
        params: Vec<duckdb::types::Value>,
    ) -> Result<RawResponse> {
        let mut stmt = conn.prepare(sql)?;

        match kind {
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete => {
                let affected = stmt.execute(params_from_iter(params))?;
                Ok(RawResponse::Affected(affected as u64))
            }
            StatementKind::Schema | StatementKind::Transaction => {
                stmt.execute(params_from_iter(params))?;
                Ok(RawResponse::Completed)
            }
            StatementKind::Read | StatementKind::Other => {
                let mut rows = stmt.query(params_from_iter(params))?;
                let columns = rows
                    .as_ref()
                    .map(DuckDbValueConverter::build_column_info)
                    .unwrap_or_default();

                let mut values = Vec::new();
                while let Some(row) = rows.next()? {
                    values.push(DuckDbValueConverter::convert_row(row, columns.len()));
                }

                if columns.is_empty() && kind == StatementKind::Other {
                    return Ok(RawResponse::Completed);
                }
                Ok(RawResponse::Rows {
                    columns,
                    rows: values,
                })
            }
        }
    }

    async fn run_batch(&mut self, sql: &'static str) -> Result<()> {
        self.with_connection(move |conn| conn.execute_batch(sql).map_err(Into::into))
            .await
    }
}

#[async_trait]
impl EngineAdapter for DuckDbAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDB
    }

    async fn execute(&mut self, sql: &str, kind: StatementKind, params: &Params) -> Result<RawResponse> {
        let params: Vec<_> = params
            .as_positional()?
            .iter()
            .map(DuckDbValueConverter::to_duckdb)
            .collect();
        let sql = sql.to_string();

        self.with_connection(move |conn| {
            Self::execute_sync(conn, &sql, kind, params).context("Query failed")
        })
        .await
    }

    async fn describe_table(&mut self, table: &TableRef) -> Result<Option<Vec<TableColumn>>> {
        let table = table.clone();
        self.with_connection(move |conn| schema::describe_table(conn, &table))
            .await
    }

    async fn begin(&mut self) -> Result<()> {
        self.run_batch("BEGIN TRANSACTION").await
    }

    async fn commit(&mut self) -> Result<()> {
        self.run_batch("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.run_batch("ROLLBACK").await
    }

    async fn ping(&mut self) -> Result<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
            Ok(())
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => smol::unblock(move || conn.close().map_err(|(_, e)| anyhow!(e))).await,
            None => Ok(()),
        }
    }
}
