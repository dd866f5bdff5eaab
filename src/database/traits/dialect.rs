//! Dialect registry.
//!
//! The closed set of engines the connector layer can talk to, and what each
//! of them can do.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConnectorError;

/// SQL engine flavor of a connector.
///
/// `Unknown` is a legal runtime value (the engine could not be determined)
/// but [`resolve_dialect`] never returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    ClickHouse,
    DuckDB,
    MySQL,
    Postgres,
    Unknown,
}

/// Engines the registry resolves to.
pub const SUPPORTED_DIALECTS: [Dialect; 4] = [
    Dialect::ClickHouse,
    Dialect::DuckDB,
    Dialect::MySQL,
    Dialect::Postgres,
];

/// Placeholder syntax an engine expects for bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `$1`, `$2`, ...
    DollarNumbered,
    /// `?`
    QuestionMark,
    /// `{name:Type}`
    Named,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectCapabilities {
    /// Explicit BEGIN/COMMIT/ROLLBACK is available.
    pub transactions: bool,
    /// Writes report how many rows they touched.
    pub affected_rows: bool,
    pub param_style: ParamStyle,
    /// Runs in-process rather than over the network.
    pub embedded: bool,
    pub default_port: Option<u16>,
}

impl Dialect {
    /// Get the display name for this dialect
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ClickHouse => "ClickHouse",
            Self::DuckDB => "DuckDB",
            Self::MySQL => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Unknown => "Unknown",
        }
    }

    /// Canonical lowercase name, as accepted by [`resolve_dialect`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClickHouse => "clickhouse",
            Self::DuckDB => "duckdb",
            Self::MySQL => "mysql",
            Self::Postgres => "postgres",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn capabilities(&self) -> DialectCapabilities {
        match self {
            Self::ClickHouse => DialectCapabilities {
                transactions: false,
                affected_rows: false,
                param_style: ParamStyle::Named,
                embedded: false,
                default_port: Some(8123), // HTTP interface
            },
            Self::DuckDB => DialectCapabilities {
                transactions: true,
                affected_rows: true,
                param_style: ParamStyle::QuestionMark,
                embedded: true,
                default_port: None,
            },
            Self::MySQL => DialectCapabilities {
                transactions: true,
                affected_rows: true,
                param_style: ParamStyle::QuestionMark,
                embedded: false,
                default_port: Some(3306),
            },
            Self::Postgres => DialectCapabilities {
                transactions: true,
                affected_rows: true,
                param_style: ParamStyle::DollarNumbered,
                embedded: false,
                default_port: Some(5432),
            },
            Self::Unknown => DialectCapabilities {
                transactions: false,
                affected_rows: false,
                param_style: ParamStyle::None,
                embedded: false,
                default_port: None,
            },
        }
    }

    pub fn supports_transactions(&self) -> bool {
        self.capabilities().transactions
    }

    pub fn reports_affected_rows(&self) -> bool {
        self.capabilities().affected_rows
    }

    /// Tokenizer dialect used for statement classification.
    pub fn sql_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            ClickHouseDialect, DuckDbDialect, GenericDialect, MySqlDialect, PostgreSqlDialect,
        };

        match self {
            Self::ClickHouse => Box::new(ClickHouseDialect {}),
            Self::DuckDB => Box::new(DuckDbDialect {}),
            Self::MySQL => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Unknown => Box::new(GenericDialect {}),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Dialect {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_dialect(s)
    }
}

/// Map a dialect name to a supported [`Dialect`].
///
/// Matching ignores case and surrounding whitespace. `postgresql` is accepted
/// as an alias for `postgres`.
pub fn resolve_dialect(name: &str) -> Result<Dialect, ConnectorError> {
    match name.trim().to_lowercase().as_str() {
        "clickhouse" => Ok(Dialect::ClickHouse),
        "duckdb" => Ok(Dialect::DuckDB),
        "mysql" => Ok(Dialect::MySQL),
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        _ => Err(ConnectorError::unsupported_dialect(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_resolve_supported_names() {
        assert_eq!(resolve_dialect("postgres").unwrap(), Dialect::Postgres);
        assert_eq!(resolve_dialect("PostgreSQL").unwrap(), Dialect::Postgres);
        assert_eq!(resolve_dialect(" MySQL ").unwrap(), Dialect::MySQL);
        assert_eq!(resolve_dialect("duckdb").unwrap(), Dialect::DuckDB);
        assert_eq!(resolve_dialect("CLICKHOUSE").unwrap(), Dialect::ClickHouse);
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let err = resolve_dialect("oracle").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDialect);
        assert!(err.to_string().contains("oracle"));

        // Unknown is a runtime value, not a registry target
        assert!(resolve_dialect("unknown").is_err());
        assert!(resolve_dialect("").is_err());
    }

    #[test]
    fn test_round_trip_names() {
        for dialect in SUPPORTED_DIALECTS {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
            assert!(dialect.is_supported());
        }
        assert!(!Dialect::Unknown.is_supported());
    }

    #[test]
    fn test_capabilities() {
        assert!(!Dialect::ClickHouse.supports_transactions());
        assert!(!Dialect::ClickHouse.reports_affected_rows());
        assert!(Dialect::Postgres.supports_transactions());
        assert!(Dialect::DuckDB.capabilities().embedded);
        assert_eq!(
            Dialect::Postgres.capabilities().param_style,
            ParamStyle::DollarNumbered
        );
        assert_eq!(Dialect::MySQL.capabilities().default_port, Some(3306));
        assert_eq!(Dialect::ClickHouse.capabilities().default_port, Some(8123));
        assert!(!Dialect::Unknown.supports_transactions());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Dialect::ClickHouse).unwrap(),
            "\"clickhouse\""
        );
        assert_eq!(
            serde_json::to_string(&Dialect::Postgres).unwrap(),
            "\"postgres\""
        );
    }
}
