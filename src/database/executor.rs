//! Restricted executors.
//!
//! [`DbExecutor`] is the narrow surface transactional code is written
//! against: `select`, `insert` and `update`, nothing else. Deletes, DDL and
//! connection control are not reachable through it.
//!
//! [`ExecutorScope`] is the executor handed out by
//! [`Connector::begin_transaction`]. It mutably borrows its connector, so
//! the connector cannot be used for anything else until the scope ends.

use async_trait::async_trait;

use super::connector::Connector;
use super::result::ExecutionResult;
use super::statement::StatementKind;
use crate::database::traits::{Dialect, Params};
use crate::error::{ConnectorError, Result};

/// What a caller asked to run, and therefore which statement kinds it may
/// carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Execute,
    Select,
    Insert,
    Update,
}

impl Operation {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }

    pub(crate) fn accepts(&self, kind: StatementKind) -> bool {
        match self {
            Self::Execute => kind != StatementKind::Transaction,
            Self::Select => kind == StatementKind::Read,
            Self::Insert => kind == StatementKind::Insert,
            Self::Update => kind == StatementKind::Update,
        }
    }

    pub(crate) fn rejection(&self, dialect: Dialect, kind: StatementKind) -> ConnectorError {
        let message = match (self, kind) {
            (Self::Execute, _) => {
                "transaction control statements are not allowed here; use begin_transaction".to_string()
            }
            _ => format!("{} does not accept {} statements", self.name(), kind),
        };
        ConnectorError::invalid_statement(dialect, message)
    }
}

/// Read, insert and update. Nothing else.
#[async_trait]
pub trait DbExecutor: Send {
    fn dialect(&self) -> Dialect;

    /// Run a read statement.
    async fn select(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult>;

    /// Run an `INSERT`.
    async fn insert(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult>;

    /// Run an `UPDATE`.
    async fn update(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Active,
    Terminated,
}

/// An open transaction.
///
/// Ends with [`commit`](Self::commit) or [`rollback`](Self::rollback); every
/// call after that fails with [`ConnectorError::ScopeClosed`]. A scope
/// dropped while still active leaves its transaction to be rolled back by
/// the connector before its next operation.
pub struct ExecutorScope<'c> {
    connector: &'c mut Connector,
    state: ScopeState,
}

impl std::fmt::Debug for ExecutorScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorScope")
            .field("dialect", &self.connector.dialect())
            .field("state", &self.state)
            .finish()
    }
}

impl<'c> ExecutorScope<'c> {
    pub(crate) fn new(connector: &'c mut Connector) -> Self {
        Self {
            connector,
            state: ScopeState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            ScopeState::Active => Ok(()),
            ScopeState::Terminated => Err(ConnectorError::ScopeClosed {
                dialect: self.connector.dialect(),
            }),
        }
    }

    async fn run(&mut self, operation: Operation, sql: &str, params: &Params) -> Result<ExecutionResult> {
        self.ensure_active()?;
        self.connector.run(operation, sql, params, true).await
    }

    /// Commit the transaction.
    ///
    /// The scope is terminated whatever the outcome. An engine failure comes
    /// back as an [`ExecutionResult`] carrying the error; the transaction is
    /// then rolled back on a best-effort basis and is not retried.
    pub async fn commit(&mut self) -> Result<ExecutionResult> {
        self.ensure_active()?;
        self.state = ScopeState::Terminated;
        self.connector.finish_transaction(true).await
    }

    /// Roll the transaction back. The scope is terminated whatever the
    /// outcome.
    pub async fn rollback(&mut self) -> Result<ExecutionResult> {
        self.ensure_active()?;
        self.state = ScopeState::Terminated;
        self.connector.finish_transaction(false).await
    }
}

#[async_trait]
impl DbExecutor for ExecutorScope<'_> {
    fn dialect(&self) -> Dialect {
        self.connector.dialect()
    }

    async fn select(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult> {
        self.run(Operation::Select, sql, params).await
    }

    async fn insert(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult> {
        self.run(Operation::Insert, sql, params).await
    }

    async fn update(&mut self, sql: &str, params: &Params) -> Result<ExecutionResult> {
        self.run(Operation::Update, sql, params).await
    }
}

impl Drop for ExecutorScope<'_> {
    fn drop(&mut self) {
        if self.state == ScopeState::Active {
            tracing::warn!(
                "{} transaction scope dropped without commit or rollback; it will be rolled back",
                self.connector.dialect()
            );
            self.connector.abandon_transaction();
        }
    }
}
