//! PostgreSQL engine adapter.
//!
//! Holds a single SQLx `PgConnection` so that transaction state lives on one
//! server session.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use super::schema;
use super::types::{bind_postgres_value, PgValueConverter};
use crate::database::statement::StatementKind;
use crate::database::traits::{
    BoxedAdapter, Credentials, Dialect, EngineAdapter, Params, RawResponse, TableColumn, TableRef,
};

/// One PostgreSQL session.
pub struct PostgresAdapter {
    endpoint: String,
    connection: Option<PgConnection>,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("endpoint", &self.endpoint)
            .field("connection", &"<PgConnection>")
            .finish()
    }
}

impl PostgresAdapter {
    /// Connect to a PostgreSQL server.
    pub async fn open(credentials: &Credentials) -> Result<Self> {
        let options = Self::build_connect_options(credentials)?;
        let connection = PgConnection::connect_with(&options).await?;

        Ok(Self {
            endpoint: endpoint(credentials),
            connection: Some(connection),
        })
    }

    /// Create a boxed adapter (for factory use).
    pub async fn boxed(credentials: &Credentials) -> Result<BoxedAdapter> {
        Ok(Box::new(Self::open(credentials).await?))
    }

    /// Build PgConnectOptions from the credentials.
    fn build_connect_options(credentials: &Credentials) -> Result<PgConnectOptions> {
        match credentials {
            Credentials::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
                options,
            } => {
                let mut connect = PgConnectOptions::new()
                    .host(hostname)
                    .port(*port)
                    .username(username)
                    .password(password)
                    .ssl_mode(PgValueConverter::map_ssl_mode(ssl_mode));
                if !database.is_empty() {
                    connect = connect.database(database);
                }
                if let Some(name) = options.get("application_name") {
                    connect = connect.application_name(name);
                }
                Ok(connect)
            }
            Credentials::File { .. } | Credentials::InMemory => Err(anyhow!(
                "PostgreSQL does not support file-based or in-memory connections"
            )),
        }
    }

    fn connection(&mut self) -> Result<&mut PgConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| anyhow!("PostgreSQL connection is closed"))
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
impl EngineAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&mut self, sql: &str, kind: StatementKind, params: &Params) -> Result<RawResponse> {
        let values = params.as_positional()?;
        let conn = self.connection()?;

        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_postgres_value(query, value);
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
            let columns = PgValueConverter::build_column_info(first);
            let rows = rows.iter().map(PgValueConverter::convert_row).collect();
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
        self.run_raw("BEGIN").await
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_connect_options() {
        let creds = Credentials::server("localhost", 5432, "postgres", "password", "postgres");
        assert!(PostgresAdapter::build_connect_options(&creds).is_ok());
        assert_eq!(endpoint(&creds), "localhost:5432/postgres");
    }

    #[test]
    fn test_file_credentials_rejected() {
        let creds = Credentials::file("/tmp/test.db", false);
        assert!(PostgresAdapter::build_connect_options(&creds).is_err());
        assert!(PostgresAdapter::build_connect_options(&Credentials::in_memory()).is_err());
    }
}
