//! ClickHouse driver implementation.
//!
//! This module talks to ClickHouse over its HTTP interface, requesting
//! `JSONCompact` output so result sets of unknown shape can be decoded.
//!
//! # Example
//!
//! ```ignore
//! use dash_connector::database::drivers::ClickHouseAdapter;
//! use dash_connector::database::traits::Credentials;
//!
//! let credentials = Credentials::server("localhost", 8123, "default", "", "default");
//! let adapter = ClickHouseAdapter::open(&credentials).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::ClickHouseAdapter;
