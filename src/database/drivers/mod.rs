//! Engine adapter implementations.
//!
//! - **PostgreSQL**: single SQLx connection
//! - **MySQL**: single SQLx connection
//! - **ClickHouse**: HTTP interface, no transactions
//! - **DuckDB**: embedded, via duckdb-rs on the blocking pool
//!
//! Each driver implements [`EngineAdapter`](crate::database::traits::EngineAdapter).

pub mod clickhouse;
pub mod duckdb;
mod factory;
pub mod mysql;
pub mod postgres;

pub use clickhouse::ClickHouseAdapter;
pub use duckdb::DuckDbAdapter;
pub use factory::ConnectionFactory;
pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
