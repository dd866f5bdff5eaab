//! Engine abstraction traits and types.
//!
//! This module defines:
//!
//! - **Dialect** (`dialect`): Supported engines and their capabilities
//! - **Credentials** (`credentials`): Connection parameters, URL parsing, SSL modes
//! - **Row/Value** (`row`): Engine-agnostic value representation
//! - **Params** (`params`): Bound statement parameters
//! - **Schema** (`schema`): Table column metadata
//! - **Connection** (`connection`): The adapter trait every driver implements
//!
//! # Example
//!
//! ```ignore
//! use dash_connector::database::traits::{Credentials, resolve_dialect};
//!
//! let dialect = resolve_dialect("postgres")?;
//! let credentials = Credentials::server("localhost", 5432, "user", "password", "mydb");
//! ```

pub mod connection;
pub mod credentials;
pub mod dialect;
pub mod params;
pub mod row;
pub mod schema;

pub use connection::{BoxedAdapter, EngineAdapter, RawResponse};
pub use credentials::{Credentials, SslMode};
pub use dialect::{resolve_dialect, Dialect, DialectCapabilities, ParamStyle, SUPPORTED_DIALECTS};
pub use params::Params;
pub use row::{rows_from_values, ColumnInfo, Row, Value};
pub use schema::{IndexType, TableColumn, TableRef};
