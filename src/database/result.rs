//! Normalized execution results.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::database::traits::{rows_from_values, ColumnInfo, Dialect, RawResponse, Row};
use crate::error::ConnectorError;

/// Outcome of one statement, in the same shape for every dialect.
///
/// When `error` is set the rows are empty and must not be read as data;
/// [`ExecutionResult::raw_result`] enforces that.
///
/// Serializes as `{ "rawResult": [...], "affectedRows"?: n, "error"?: "..." }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    raw_result: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affected_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    columns: Vec<ColumnInfo>,
    #[serde(skip)]
    dialect: Dialect,
    #[serde(skip)]
    elapsed: Duration,
    #[serde(skip)]
    cause: Option<Arc<anyhow::Error>>,
}

impl ExecutionResult {
    pub fn rows(dialect: Dialect, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            raw_result: rows,
            affected_rows: None,
            error: None,
            columns,
            dialect,
            elapsed: Duration::ZERO,
            cause: None,
        }
    }

    /// Result of a statement that returned nothing. `affected_rows` is only
    /// kept when the dialect reports row counts.
    pub fn completed(dialect: Dialect, affected_rows: Option<u64>) -> Self {
        Self {
            affected_rows: affected_rows.filter(|_| dialect.reports_affected_rows()),
            ..Self::rows(dialect, Vec::new(), Vec::new())
        }
    }

    /// A failed statement. The message is never empty.
    pub fn failed(dialect: Dialect, error: anyhow::Error) -> Self {
        let mut message = format!("{error:#}");
        if message.trim().is_empty() {
            message = format!("{} statement failed", dialect.display_name());
        }
        Self {
            error: Some(message),
            cause: Some(Arc::new(error)),
            ..Self::rows(dialect, Vec::new(), Vec::new())
        }
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Result rows. Always empty when the statement failed.
    pub fn raw_result(&self) -> &[Row] {
        if self.error.is_some() {
            return &[];
        }
        &self.raw_result
    }

    pub fn into_rows(self) -> Vec<Row> {
        if self.error.is_some() {
            return Vec::new();
        }
        self.raw_result
    }

    pub fn affected_rows(&self) -> Option<u64> {
        self.affected_rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The engine error behind `error`, for logging.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Turn a failed result into a hard [`ConnectorError::Execution`].
    pub fn into_checked(self) -> Result<Self, ConnectorError> {
        match self.error {
            None => Ok(self),
            Some(message) => Err(ConnectorError::Execution {
                dialect: self.dialect,
                message,
                source: self
                    .cause
                    .map(|cause| Box::new(SharedCause(cause)) as crate::error::BoxError),
            }),
        }
    }
}

/// Convert an adapter response into an [`ExecutionResult`].
pub fn normalize(dialect: Dialect, raw: anyhow::Result<RawResponse>) -> ExecutionResult {
    match raw {
        Ok(RawResponse::Rows { columns, rows }) => {
            let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
            let rows = rows_from_values(&names, rows);
            ExecutionResult::rows(dialect, columns, rows)
        }
        Ok(RawResponse::Affected(count)) => ExecutionResult::completed(dialect, Some(count)),
        Ok(RawResponse::Completed) => ExecutionResult::completed(dialect, None),
        Err(error) => ExecutionResult::failed(dialect, error),
    }
}

/// Error adapter so a shared `anyhow::Error` can sit in a `source` chain.
#[derive(Debug)]
struct SharedCause(Arc<anyhow::Error>);

impl std::fmt::Display for SharedCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for SharedCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::traits::Value;
    use crate::error::ErrorKind;
    use anyhow::anyhow;
    use serde_json::json;

    #[test]
    fn test_rows_normalized() {
        let raw = RawResponse::Rows {
            columns: vec![ColumnInfo::new("1", "INT4", 0)],
            rows: vec![vec![Value::Int32(1)]],
        };
        let result = normalize(Dialect::Postgres, Ok(raw));
        assert!(result.is_ok());
        assert_eq!(result.affected_rows(), None);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "rawResult": [{ "1": 1 }] })
        );
    }

    #[test]
    fn test_affected_rows_only_when_reported() {
        let result = normalize(Dialect::MySQL, Ok(RawResponse::Affected(3)));
        assert_eq!(result.affected_rows(), Some(3));
        assert!(result.raw_result().is_empty());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "rawResult": [], "affectedRows": 3 })
        );

        // Zero is a real count, not an absent one
        let result = normalize(Dialect::Postgres, Ok(RawResponse::Affected(0)));
        assert_eq!(result.affected_rows(), Some(0));

        let result = normalize(Dialect::ClickHouse, Ok(RawResponse::Affected(3)));
        assert_eq!(result.affected_rows(), None);

        let result = normalize(Dialect::Postgres, Ok(RawResponse::Completed));
        assert_eq!(result.affected_rows(), None);
    }

    #[test]
    fn test_error_result() {
        let result = normalize(
            Dialect::DuckDB,
            Err(anyhow!("Table with name nope does not exist").context("Query failed")),
        );
        assert!(!result.is_ok());
        assert!(result.raw_result().is_empty());
        let message = result.error().unwrap();
        assert!(message.contains("Query failed"));
        assert!(message.contains("nope"));
        assert!(result.cause().is_some());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rawResult"], json!([]));
        assert!(json.get("affectedRows").is_none());

        let err = result.into_checked().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.dialect(), Dialect::DuckDB);
    }

    #[test]
    fn test_error_message_never_empty() {
        let result = normalize(Dialect::MySQL, Err(anyhow!("")));
        assert_eq!(result.error(), Some("MySQL statement failed"));
    }
}
