//! MySQL driver implementation.
//!
//! This module provides a MySQL/MariaDB adapter built on a single SQLx
//! connection.
//!
//! # Example
//!
//! ```ignore
//! use dash_connector::database::drivers::MySqlAdapter;
//! use dash_connector::database::traits::Credentials;
//!
//! let credentials = Credentials::server("localhost", 3306, "root", "password", "shop");
//! let adapter = MySqlAdapter::open(&credentials).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::MySqlAdapter;
