//! DuckDB driver implementation.
//!
//! This module provides embedded DuckDB support using the duckdb-rs crate.
//!
//! # Example
//!
//! ```ignore
//! use dash_connector::database::drivers::DuckDbAdapter;
//! use dash_connector::database::traits::Credentials;
//!
//! // File-based DuckDB
//! let adapter = DuckDbAdapter::open(&Credentials::file("/path/to/database.duckdb", false)).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::DuckDbAdapter;
