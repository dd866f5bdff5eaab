mod common;

use anyhow::anyhow;
use futures::FutureExt;
use serde_json::json;

use common::{fake_connector, Call};
use dash_connector::database::traits::{
    Dialect, IndexType, Params, RawResponse, TableColumn, Value,
};
use dash_connector::database::{describe_table, DbExecutor, StatementKind};
use dash_connector::ErrorKind;

#[test]
fn test_select_one_on_postgres() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);
    script.respond_rows(&["1"], vec![vec![Value::Int32(1)]]);

    let result = smol::block_on(connector.execute("SELECT 1", &Params::None)).unwrap();

    assert!(result.is_ok());
    assert_eq!(result.affected_rows(), None);
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "rawResult": [{ "1": 1 }] }));
    assert_eq!(
        script.calls(),
        vec![Call::Execute {
            sql: "SELECT 1".into(),
            kind: StatementKind::Read
        }]
    );
}

#[test]
fn test_insert_reports_affected_rows() {
    let (mut connector, script) = fake_connector(Dialect::MySQL);
    script.respond(Ok(RawResponse::Affected(1)));

    let result = smol::block_on(connector.execute(
        "INSERT INTO users (name) VALUES (?)",
        &Params::positional(["alice"]),
    ))
    .unwrap();

    assert_eq!(result.affected_rows(), Some(1));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "rawResult": [], "affectedRows": 1 })
    );
}

#[test]
fn test_clickhouse_insert_has_no_affected_rows() {
    let (mut connector, script) = fake_connector(Dialect::ClickHouse);
    script.respond(Ok(RawResponse::Affected(3)));

    let result = smol::block_on(connector.execute("INSERT INTO events VALUES (1)", &Params::None)).unwrap();

    assert!(result.is_ok());
    assert_eq!(result.affected_rows(), None);
}

#[test]
fn test_statement_failure_is_a_result() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);
    script.respond(Err(anyhow!("relation \"nope\" does not exist")));

    let result = smol::block_on(connector.execute("SELECT * FROM nope", &Params::None)).unwrap();

    assert!(!result.is_ok());
    assert!(result.raw_result().is_empty());
    assert!(result.error().unwrap().contains("does not exist"));
    assert!(result.cause().is_some());

    let err = result.into_checked().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.dialect(), Dialect::Postgres);
}

#[test]
fn test_rejected_before_dispatch() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);

    smol::block_on(async {
        let err = connector.execute("   ", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        let err = connector
            .execute("SELECT 1; DROP TABLE users", &Params::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        let err = connector.execute("BEGIN", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);
    });

    assert!(script.calls().is_empty());
}

#[test]
fn test_restricted_executor_on_connector() {
    let (mut connector, script) = fake_connector(Dialect::DuckDB);

    smol::block_on(async {
        let err = connector.select("DELETE FROM users", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        let err = connector.update("CREATE TABLE t (id INT)", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        connector.update("UPDATE users SET name = 'x'", &Params::None).await.unwrap();
    });

    assert_eq!(script.calls().len(), 1);
}

#[test]
fn test_close_is_idempotent() {
    let (mut connector, script) = fake_connector(Dialect::MySQL);

    smol::block_on(async {
        connector.close().await.unwrap();
        connector.close().await.unwrap();
        assert!(connector.is_closed());

        let err = connector.execute("SELECT 1", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.dialect(), Dialect::MySQL);
    });

    assert_eq!(script.count(&Call::Close), 1);
}

#[test]
fn test_cancelled_call_poisons_connector() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);
    script.hang();

    // Poll once, then drop the future mid-flight.
    assert!(connector.execute("SELECT 1", &Params::None).now_or_never().is_none());

    smol::block_on(async {
        let err = connector.execute("SELECT 2", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("close and reopen"));

        let err = connector.begin_transaction().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        connector.close().await.unwrap();
    });

    assert_eq!(script.count(&Call::Close), 1);
}

#[test]
fn test_describe_table() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);
    script.add_table(
        "users",
        vec![
            TableColumn::new("id", "integer")
                .with_nullable(false)
                .with_index(Some(IndexType::Primary)),
            TableColumn::new("email", "text").with_index(Some(IndexType::Unique)),
        ],
    );

    smol::block_on(async {
        let columns = describe_table(&mut connector, "public.users").await.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].is_primary_key);
        assert!(!columns[1].is_primary_key);

        let json = serde_json::to_value(&columns[0]).unwrap();
        assert_eq!(json["columnName"], "id");
        assert_eq!(json["isPrimaryKey"], true);
        assert_eq!(json["indexType"], "primary");

        let err = connector.describe_table("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntrospection);
        assert!(err.to_string().contains("table not found"));
    });

    assert_eq!(script.calls()[0], Call::Describe("public.users".into()));
}

#[test]
fn test_ping() {
    let (mut connector, script) = fake_connector(Dialect::ClickHouse);
    smol::block_on(connector.ping()).unwrap();
    assert_eq!(script.calls(), vec![Call::Ping]);
}

#[test]
fn test_unknown_dialect_cannot_open() {
    let err = smol::block_on(dash_connector::database::Connector::open(
        Dialect::Unknown,
        &dash_connector::database::traits::Credentials::in_memory(),
    ))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedDialect);
}

#[test]
fn test_mismatched_credentials_are_connection_errors() {
    let err = smol::block_on(dash_connector::database::Connector::open(
        Dialect::Postgres,
        &dash_connector::database::traits::Credentials::in_memory(),
    ))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.dialect(), Dialect::Postgres);
}

#[test]
fn test_restricted_executor_needs_a_readable_statement() {
    let (mut connector, script) = fake_connector(Dialect::DuckDB);

    smol::block_on(async {
        let err = connector
            .select("SELECT 1; DELETE FROM users; SELECT E'\\''", &Params::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        let err = connector.select("SELECT 'unterminated", &Params::None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        let err = connector
            .select("EXPLAIN ANALYZE DELETE FROM users", &Params::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);

        // Auto-commit execute still routes broken input to the engine
        connector.execute("SELECT 'unterminated", &Params::None).await.unwrap();
    });

    assert_eq!(script.calls().len(), 1);
}

#[test]
fn test_postgres_table_names_fold_to_lowercase() {
    let (mut connector, script) = fake_connector(Dialect::Postgres);
    script.add_table("users", vec![TableColumn::new("id", "integer")]);

    smol::block_on(async {
        let columns = connector.describe_table("Users").await.unwrap();
        assert_eq!(columns.len(), 1);

        let err = connector.describe_table(r#""Users""#).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntrospection);
    });

    assert_eq!(
        script.calls(),
        vec![Call::Describe("users".into()), Call::Describe("Users".into())]
    );
}
