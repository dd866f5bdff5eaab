//! Engine adapter trait.
//!
//! An adapter owns exactly one live engine session and speaks the engine's
//! native protocol. It knows nothing about executor scopes or result
//! normalization; the [`Connector`](crate::database::Connector) layers those
//! on top.

use anyhow::Result;
use async_trait::async_trait;

use super::dialect::Dialect;
use super::params::Params;
use super::row::{ColumnInfo, Value};
use super::schema::{TableColumn, TableRef};
use crate::database::statement::StatementKind;

/// What an engine sent back for one statement, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Statement produced a result set.
    Rows {
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    },
    /// Write with an engine-reported row count.
    Affected(u64),
    /// Statement finished without rows or a count (DDL, writes on engines
    /// that do not count).
    Completed,
}

impl RawResponse {
    pub fn empty_rows() -> Self {
        Self::Rows {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Boxed adapter, as stored by a connector.
pub type BoxedAdapter = Box<dyn EngineAdapter>;

/// One engine session.
///
/// Methods take `&mut self`: a session runs one statement at a time.
#[async_trait]
pub trait EngineAdapter: Send {
    fn dialect(&self) -> Dialect;

    /// Run one statement. `kind` tells the adapter whether to expect rows.
    ///
    /// `Err` means the statement failed; the session is still usable.
    async fn execute(&mut self, sql: &str, kind: StatementKind, params: &Params) -> Result<RawResponse>;

    /// Columns of `table` in declaration order, or `None` if the table does
    /// not exist.
    async fn describe_table(&mut self, table: &TableRef) -> Result<Option<Vec<TableColumn>>>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Cheap round trip to check the session is alive.
    async fn ping(&mut self) -> Result<()>;

    /// Release the session. Called at most once.
    async fn close(&mut self) -> Result<()>;
}
