//! MySQL engine adapter.
//!
//! Holds a single SQLx `MySqlConnection` so that transaction state lives on
//! one server session.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use super::schema;
use super::types::{bind_mysql_value, MySqlValueConverter};
use crate::database::statement::StatementKind;
use crate::database::traits::{
    BoxedAdapter, Credentials, Dialect, EngineAdapter, Params, RawResponse, TableColumn, TableRef,
};

/// One MySQL session.
pub struct MySqlAdapter {
    endpoint: String,
    connection: Option<MySqlConnection>,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter")
            .field("endpoint", &self.endpoint)
            .field("connection", &"<MySqlConnection>")
            .finish()
    }
}

impl MySqlAdapter {
    /// Connect to a MySQL server.
    pub async fn open(credentials: &Credentials) -> Result<Self> {
        let options = Self::build_connect_options(credentials)?;
        let connection = MySqlConnection::connect_with(&options).await?;

        Ok(Self {
            endpoint: endpoint(credentials),
            connection: Some(connection),
        })
    }

    /// Create a boxed adapter (for factory use).
    pub async fn boxed(credentials: &Credentials) -> Result<BoxedAdapter> {
        Ok(Box::new(Self::open(credentials).await?))
    }

    /// Build MySqlConnectOptions from the credentials.
    fn build_connect_options(credentials: &Credentials) -> Result<MySqlConnectOptions> {
        match credentials {
            Credentials::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
                ..
            } => {
                let mut options = MySqlConnectOptions::new()
                    .host(hostname)
                    .port(*port)
                    .username(username)
                    .password(password)
                    .ssl_mode(MySqlValueConverter::map_ssl_mode(ssl_mode));
                if !database.is_empty() {
                    options = options.database(database);
                }
                Ok(options)
            }
            Credentials::File { .. } | Credentials::InMemory => Err(anyhow!(
                "MySQL does not support file-based or in-memory connections"
            )),
        }
    }

    fn connection(&mut self) -> Result<&mut MySqlConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| anyhow!("MySQL connection is closed"))
    }

    async fn run_raw(&mut self, sql: &str) -> Result<()> {
        let conn = self.connection()?;
        sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }
}

fn endpoint(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Server {
            hostname,
            port,
            database,
            ..
        } => format!("{hostname}:{port}/{database}"),
        _ => String::new(),
    }
}

#[async_trait]
impl EngineAdapter for MySqlAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    async fn execute(&mut self, sql: &str, kind: StatementKind, params: &Params) -> Result<RawResponse> {
        let values = params.as_positional()?;
        let conn = self.connection()?;

        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_mysql_value(query, value);
        }

        if kind.returns_rows() || kind == StatementKind::Other {
            let rows = query.fetch_all(&mut *conn).await.context("Query failed")?;
            let Some(first) = rows.first() else {
                return Ok(if kind.returns_rows() {
                    RawResponse::empty_rows()
                } else {
                    RawResponse::Completed
                });
            };
            let columns = MySqlValueConverter::build_column_info(first);
            let rows = rows.iter().map(MySqlValueConverter::convert_row).collect();
            return Ok(RawResponse::Rows { columns, rows });
        }

        let result = query.execute(&mut *conn).await.context("Query failed")?;
        Ok(if kind.is_write() {
            RawResponse::Affected(result.rows_affected())
        } else {
            RawResponse::Completed
        })
    }

    async fn describe_table(&mut self, table: &TableRef) -> Result<Option<Vec<TableColumn>>> {
        let conn = self.connection()?;
        schema::describe_table(conn, table).await
    }

    async fn begin(&mut self) -> Result<()> {
        self.run_raw("START TRANSACTION").await
    }

    async fn commit(&mut self) -> Result<()> {
        self.run_raw("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.run_raw("ROLLBACK").await
    }

    async fn ping(&mut self) -> Result<()> {
        self.connection()?.ping().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => conn.close().await.map_err(Into::into),
            None => Ok(()),
        }
    }
}
