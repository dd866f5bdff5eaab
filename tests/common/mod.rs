//! Scripted in-memory adapter for connector tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dash_connector::database::traits::{
    ColumnInfo, Dialect, EngineAdapter, Params, RawResponse, TableColumn, TableRef, Value,
};
use dash_connector::database::{Connector, StatementKind};

/// One call the adapter received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute { sql: String, kind: StatementKind },
    Describe(String),
    Begin,
    Commit,
    Rollback,
    Ping,
    Close,
}

#[derive(Default)]
struct State {
    responses: VecDeque<Result<RawResponse>>,
    tables: Vec<(String, Vec<TableColumn>)>,
    calls: Vec<Call>,
    fail_begin: bool,
    fail_commit: bool,
    hang: bool,
}

/// Test-side handle to script the adapter and inspect its calls.
#[derive(Clone, Default)]
pub struct Script(Arc<Mutex<State>>);

impl Script {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.0.lock().unwrap())
    }

    /// Queue the answer to the next `execute`. Unscripted calls complete.
    pub fn respond(&self, response: Result<RawResponse>) -> &Self {
        self.with(|s| s.responses.push_back(response));
        self
    }

    pub fn respond_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnInfo::new(*name, "TEXT", idx))
            .collect();
        self.respond(Ok(RawResponse::Rows { columns, rows }))
    }

    pub fn add_table(&self, name: &str, columns: Vec<TableColumn>) -> &Self {
        self.with(|s| s.tables.push((name.to_string(), columns)));
        self
    }

    pub fn fail_begin(&self) -> &Self {
        self.with(|s| s.fail_begin = true);
        self
    }

    pub fn fail_commit(&self) -> &Self {
        self.with(|s| s.fail_commit = true);
        self
    }

    /// Make every `execute` wait forever.
    pub fn hang(&self) -> &Self {
        self.with(|s| s.hang = true);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, call: &Call) -> usize {
        self.with(|s| s.calls.iter().filter(|c| *c == call).count())
    }
}

pub struct FakeAdapter {
    dialect: Dialect,
    script: Script,
}

impl FakeAdapter {
    pub fn new(dialect: Dialect) -> (Self, Script) {
        let script = Script::default();
        (
            Self {
                dialect,
                script: script.clone(),
            },
            script,
        )
    }

    fn record(&self, call: Call) {
        self.script.with(|s| s.calls.push(call));
    }
}

#[async_trait]
impl EngineAdapter for FakeAdapter {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&mut self, sql: &str, kind: StatementKind, _params: &Params) -> Result<RawResponse> {
        self.record(Call::Execute {
            sql: sql.to_string(),
            kind,
        });
        if self.script.with(|s| s.hang) {
            futures::future::pending::<()>().await;
        }
        self.script
            .with(|s| s.responses.pop_front())
            .unwrap_or(Ok(RawResponse::Completed))
    }

    async fn describe_table(&mut self, table: &TableRef) -> Result<Option<Vec<TableColumn>>> {
        self.record(Call::Describe(table.to_string()));
        Ok(self.script.with(|s| {
            s.tables
                .iter()
                .find(|(name, _)| *name == table.name)
                .map(|(_, columns)| columns.clone())
        }))
    }

    async fn begin(&mut self) -> Result<()> {
        self.record(Call::Begin);
        if self.script.with(|s| s.fail_begin) {
            return Err(anyhow!("cannot begin: read-only session"));
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(Call::Commit);
        if self.script.with(|s| s.fail_commit) {
            return Err(anyhow!("could not serialize access due to concurrent update"));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(Call::Rollback);
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.record(Call::Ping);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

/// A connector over a fresh fake adapter.
pub fn fake_connector(dialect: Dialect) -> (Connector, Script) {
    let (adapter, script) = FakeAdapter::new(dialect);
    (Connector::with_adapter(Box::new(adapter)), script)
}
