//! Adapter factory.
//!
//! Picks the adapter for a dialect and opens it.

use anyhow::{anyhow, Result};

use super::{ClickHouseAdapter, DuckDbAdapter, MySqlAdapter, PostgresAdapter};
use crate::database::traits::{BoxedAdapter, Credentials, Dialect, SUPPORTED_DIALECTS};

/// Factory for engine adapters.
///
/// # Example
///
/// ```ignore
/// use dash_connector::database::drivers::ConnectionFactory;
/// use dash_connector::database::traits::{Credentials, Dialect};
///
/// let adapter = ConnectionFactory::open(Dialect::DuckDB, &Credentials::in_memory()).await?;
/// ```
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Open a session for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The dialect has no adapter
    /// - The credentials do not fit the dialect
    /// - The engine cannot be reached
    pub async fn open(dialect: Dialect, credentials: &Credentials) -> Result<BoxedAdapter> {
        credentials.validate(dialect)?;

        match dialect {
            Dialect::Postgres => PostgresAdapter::boxed(credentials).await,
            Dialect::MySQL => MySqlAdapter::boxed(credentials).await,
            Dialect::ClickHouse => ClickHouseAdapter::boxed(credentials).await,
            Dialect::DuckDB => DuckDbAdapter::boxed(credentials).await,
            Dialect::Unknown => Err(anyhow!("no adapter for an unknown dialect")),
        }
    }

    /// Check if a dialect has an adapter.
    pub fn is_supported(dialect: Dialect) -> bool {
        dialect.is_supported()
    }

    /// Dialects that have adapters.
    pub fn supported_dialects() -> Vec<Dialect> {
        SUPPORTED_DIALECTS.to_vec()
    }
}
