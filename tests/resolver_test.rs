mod common;

use std::sync::Arc;

use common::{fake_connector, Call};
use dash_connector::database::traits::{Dialect, Params};
use dash_connector::database::{ConnectionResolver, DashboardConnection};
use dash_connector::ErrorKind;

#[test]
fn test_register_and_resolve() {
    let resolver = ConnectionResolver::new();
    let (connector, _script) = fake_connector(Dialect::Postgres);

    smol::block_on(async {
        let shared = resolver
            .register(DashboardConnection::new("c1").with_enter_app(true), connector)
            .await;

        let resolved = resolver.resolve("c1").await.unwrap();
        assert!(Arc::ptr_eq(&shared, &resolved));
        assert_eq!(resolved.lock().await.dialect(), Dialect::Postgres);

        let meta = resolver.connection("c1").await.unwrap();
        assert!(meta.enter_app);
        assert_eq!(resolver.ids().await, vec!["c1".to_string()]);
        assert_eq!(resolver.len().await, 1);
    });
}

#[test]
fn test_unknown_id() {
    let resolver = ConnectionResolver::new();
    let err = smol::block_on(resolver.resolve("nope")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionNotFound);
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_closed_connector() {
    let resolver = ConnectionResolver::new();
    let (connector, _script) = fake_connector(Dialect::MySQL);

    smol::block_on(async {
        let shared = resolver.register(DashboardConnection::new("c1"), connector).await;
        shared.lock().await.close().await.unwrap();

        let err = resolver.resolve("c1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
        assert_eq!(err.dialect(), Dialect::MySQL);
    });
}

#[test]
fn test_header_takes_precedence() {
    let resolver = ConnectionResolver::new();
    let (from_header, _) = fake_connector(Dialect::Postgres);
    let (from_query, _) = fake_connector(Dialect::DuckDB);

    smol::block_on(async {
        resolver.register(DashboardConnection::new("h"), from_header).await;
        resolver.register(DashboardConnection::new("q"), from_query).await;

        let shared = resolver.resolve_request(Some("h"), Some("q")).await.unwrap();
        assert_eq!(shared.lock().await.dialect(), Dialect::Postgres);

        let shared = resolver.resolve_request(None, Some("q")).await.unwrap();
        assert_eq!(shared.lock().await.dialect(), Dialect::DuckDB);

        let err = resolver.resolve_request(None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionNotFound);
    });
}

#[test]
fn test_close_unregisters() {
    let resolver = ConnectionResolver::new();
    let (connector, script) = fake_connector(Dialect::Postgres);

    smol::block_on(async {
        let shared = resolver.register(DashboardConnection::new("c1"), connector).await;
        resolver.close("c1").await.unwrap();

        assert!(shared.lock().await.is_closed());
        let err = resolver.resolve("c1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionNotFound);

        let err = resolver.close("c1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionNotFound);
    });

    assert_eq!(script.count(&Call::Close), 1);
}

#[test]
fn test_reregister_closes_previous() {
    let resolver = ConnectionResolver::new();
    let (first, first_script) = fake_connector(Dialect::Postgres);
    let (second, _) = fake_connector(Dialect::Postgres);

    smol::block_on(async {
        resolver.register(DashboardConnection::new("c1"), first).await;
        let shared = resolver.register(DashboardConnection::new("c1"), second).await;

        let resolved = resolver.resolve("c1").await.unwrap();
        assert!(Arc::ptr_eq(&shared, &resolved));
        assert_eq!(resolver.len().await, 1);
    });

    assert_eq!(first_script.count(&Call::Close), 1);
}

#[test]
fn test_close_all() {
    let resolver = ConnectionResolver::new();
    let (a, a_script) = fake_connector(Dialect::Postgres);
    let (b, b_script) = fake_connector(Dialect::ClickHouse);

    smol::block_on(async {
        resolver.register(DashboardConnection::new("a"), a).await;
        let shared = resolver.register(DashboardConnection::new("b"), b).await;
        shared
            .lock()
            .await
            .execute("SELECT 1", &Params::None)
            .await
            .unwrap();

        resolver.close_all().await;
        assert!(resolver.is_empty().await);
    });

    assert_eq!(a_script.count(&Call::Close), 1);
    assert_eq!(b_script.count(&Call::Close), 1);
}
