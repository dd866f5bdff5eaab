//! Engine-agnostic connectors for ClickHouse, DuckDB, MySQL and PostgreSQL.
//!
//! ```ignore
//! use dash_connector::database::{Connector, DbExecutor};
//! use dash_connector::database::traits::{Credentials, Dialect, Params};
//!
//! let mut connector = Connector::open(Dialect::DuckDB, &Credentials::in_memory()).await?;
//! let result = connector.execute("SELECT 42 AS answer", &Params::None).await?;
//!
//! let mut tx = connector.begin_transaction().await?;
//! tx.insert("INSERT INTO t VALUES (?)", &Params::positional([1i64])).await?;
//! tx.commit().await?;
//! ```

pub mod database;
pub mod error;
pub mod logging;

pub use database::traits::{resolve_dialect, Dialect};
pub use error::{ConnectorError, ErrorKind};
