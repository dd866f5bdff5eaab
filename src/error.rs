//! Error types for the connector layer.
//!
//! Every hard failure a caller can observe is a [`ConnectorError`]. Statement
//! level failures (a bad SQL string, a constraint violation) are not errors in
//! this sense: they come back inside an
//! [`ExecutionResult`](crate::database::ExecutionResult).
//!
//! Drivers work with `anyhow::Result` internally; the connector maps those
//! into the variants below and keeps the original error as the `source`.

use serde::Serialize;
use thiserror::Error;

use crate::database::traits::Dialect;

/// Boxed engine error kept as the `source` of a [`ConnectorError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ConnectorError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Unsupported dialect: '{name}'")]
    UnsupportedDialect { name: String },

    #[error("{dialect} connection failed: {message}")]
    Connection {
        dialect: Dialect,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("Connection '{connection_id}' ({dialect}) is closed")]
    ConnectionClosed {
        connection_id: String,
        dialect: Dialect,
    },

    #[error("Failed to describe {dialect} table '{table}': {message}")]
    SchemaIntrospection {
        dialect: Dialect,
        table: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Cannot start {dialect} transaction: {reason}")]
    TransactionStart {
        dialect: Dialect,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{dialect} transaction scope already committed or rolled back")]
    ScopeClosed { dialect: Dialect },

    #[error("{dialect} execution failed: {message}")]
    Execution {
        dialect: Dialect,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Invalid {dialect} statement: {message}")]
    InvalidStatement { dialect: Dialect, message: String },

    #[error("A {dialect} transaction is open on this connection; use its executor scope")]
    TransactionActive { dialect: Dialect },
}

/// Stable, serializable classification of a [`ConnectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedDialect,
    Connection,
    ConnectionNotFound,
    ConnectionClosed,
    SchemaIntrospection,
    TransactionStart,
    ScopeClosed,
    Execution,
    InvalidStatement,
    TransactionActive,
}

/// Presentation form of an error, for layers that answer with JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub dialect: Dialect,
    pub message: String,
}

impl ConnectorError {
    pub fn unsupported_dialect(name: impl Into<String>) -> Self {
        Self::UnsupportedDialect { name: name.into() }
    }

    /// Connection failure wrapping the driver error.
    pub fn connection(dialect: Dialect, error: anyhow::Error) -> Self {
        Self::Connection {
            dialect,
            message: format!("{error:#}"),
            source: Some(error.into()),
        }
    }

    /// Connection failure with no underlying driver error.
    pub fn connection_msg(dialect: Dialect, message: impl Into<String>) -> Self {
        Self::Connection {
            dialect,
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    pub fn connection_closed(connection_id: impl Into<String>, dialect: Dialect) -> Self {
        Self::ConnectionClosed {
            connection_id: connection_id.into(),
            dialect,
        }
    }

    pub fn schema(dialect: Dialect, table: impl Into<String>, error: anyhow::Error) -> Self {
        Self::SchemaIntrospection {
            dialect,
            table: table.into(),
            message: format!("{error:#}"),
            source: Some(error.into()),
        }
    }

    pub fn table_not_found(dialect: Dialect, table: impl Into<String>) -> Self {
        Self::SchemaIntrospection {
            dialect,
            table: table.into(),
            message: "table not found".to_string(),
            source: None,
        }
    }

    pub fn transaction_start(dialect: Dialect, reason: impl Into<String>) -> Self {
        Self::TransactionStart {
            dialect,
            reason: reason.into(),
            source: None,
        }
    }

    pub fn transaction_rejected(dialect: Dialect, error: anyhow::Error) -> Self {
        Self::TransactionStart {
            dialect,
            reason: format!("{error:#}"),
            source: Some(error.into()),
        }
    }

    pub fn execution(dialect: Dialect, message: impl Into<String>) -> Self {
        Self::Execution {
            dialect,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_statement(dialect: Dialect, message: impl Into<String>) -> Self {
        Self::InvalidStatement {
            dialect,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedDialect { .. } => ErrorKind::UnsupportedDialect,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::ConnectionNotFound { .. } => ErrorKind::ConnectionNotFound,
            Self::ConnectionClosed { .. } => ErrorKind::ConnectionClosed,
            Self::SchemaIntrospection { .. } => ErrorKind::SchemaIntrospection,
            Self::TransactionStart { .. } => ErrorKind::TransactionStart,
            Self::ScopeClosed { .. } => ErrorKind::ScopeClosed,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::InvalidStatement { .. } => ErrorKind::InvalidStatement,
            Self::TransactionActive { .. } => ErrorKind::TransactionActive,
        }
    }

    /// Dialect the failure happened on. `Unknown` when no connector was involved.
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::UnsupportedDialect { .. } | Self::ConnectionNotFound { .. } => Dialect::Unknown,
            Self::Connection { dialect, .. }
            | Self::ConnectionClosed { dialect, .. }
            | Self::SchemaIntrospection { dialect, .. }
            | Self::TransactionStart { dialect, .. }
            | Self::ScopeClosed { dialect }
            | Self::Execution { dialect, .. }
            | Self::InvalidStatement { dialect, .. }
            | Self::TransactionActive { dialect } => *dialect,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            dialect: self.dialect(),
            message: self.to_string(),
        }
    }
}
