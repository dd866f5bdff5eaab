//! PostgreSQL driver implementation.
//!
//! This module provides a PostgreSQL adapter built on a single SQLx
//! connection.
//!
//! # Example
//!
//! ```ignore
//! use dash_connector::database::drivers::PostgresAdapter;
//! use dash_connector::database::traits::{Credentials, SslMode};
//!
//! let credentials = Credentials::server("localhost", 5432, "user", "password", "mydb")
//!     .with_ssl_mode(SslMode::Prefer);
//! let adapter = PostgresAdapter::open(&credentials).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::PostgresAdapter;
