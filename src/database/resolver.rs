//! Connection resolver.
//!
//! Maps opaque connection ids to registered connectors. Registration is done
//! by whoever opens connections; the resolver itself never opens one.

use async_lock::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::connector::{Connector, Liveness};
use super::traits::Dialect;
use crate::error::{ConnectorError, Result};

/// Request header carrying the connection id.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

/// Query parameter carrying the connection id when the header is absent.
pub const CONNECTION_ID_QUERY_PARAM: &str = "connectionId";

/// A connector shared between callers. The mutex serializes statements.
pub type SharedConnector = Arc<Mutex<Connector>>;

/// A logical connection as known to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConnection {
    pub id: String,
    /// Scoped to an embedded ("enter app") context
    #[serde(rename = "isEnterApp", default)]
    pub enter_app: bool,
}

impl DashboardConnection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enter_app: false,
        }
    }

    pub fn with_enter_app(mut self, enter_app: bool) -> Self {
        self.enter_app = enter_app;
        self
    }
}

struct Entry {
    connection: DashboardConnection,
    dialect: Dialect,
    connector: SharedConnector,
    liveness: Liveness,
}

/// Pick the connection id from a request: the header wins over the query
/// parameter, and blank values count as absent.
pub fn connection_id_from_request<'a>(header: Option<&'a str>, query: Option<&'a str>) -> Option<&'a str> {
    header
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .or_else(|| query.map(str::trim).filter(|id| !id.is_empty()))
}

/// Registry of live connectors by connection id.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone, Default)]
pub struct ConnectionResolver {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl std::fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionResolver").finish_non_exhaustive()
    }
}

impl ConnectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `connector` to `connection.id`.
    ///
    /// A connector previously registered under the same id is closed.
    pub async fn register(&self, connection: DashboardConnection, connector: Connector) -> SharedConnector {
        let id = connection.id.clone();
        let dialect = connector.dialect();
        let liveness = connector.liveness();
        let shared: SharedConnector = Arc::new(Mutex::new(connector));

        let replaced = {
            let mut entries = self.entries.write().await;
            entries.insert(
                id.clone(),
                Entry {
                    connection,
                    dialect,
                    connector: Arc::clone(&shared),
                    liveness,
                },
            )
        };

        tracing::debug!("Registered {} connection '{}'", dialect, id);
        if let Some(old) = replaced {
            tracing::info!("Connection '{}' re-registered; closing the previous connector", id);
            if let Err(e) = old.connector.lock().await.close().await {
                tracing::warn!("Failed to close replaced connection '{}': {}", id, e);
            }
        }

        shared
    }

    /// Look up the connector for `id`.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::ConnectionNotFound`] for an unknown id
    /// - [`ConnectorError::ConnectionClosed`] when the connector was closed
    pub async fn resolve(&self, id: &str) -> Result<SharedConnector> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(id)
            .ok_or_else(|| ConnectorError::connection_not_found(id))?;

        if entry.liveness.is_closed() {
            return Err(ConnectorError::connection_closed(id, entry.dialect));
        }

        Ok(Arc::clone(&entry.connector))
    }

    /// Resolve the connection named by a request's header or query
    /// parameter.
    pub async fn resolve_request(&self, header: Option<&str>, query: Option<&str>) -> Result<SharedConnector> {
        match connection_id_from_request(header, query) {
            Some(id) => self.resolve(id).await,
            None => Err(ConnectorError::connection_not_found("<none>")),
        }
    }

    /// Metadata of a registered connection.
    pub async fn connection(&self, id: &str) -> Option<DashboardConnection> {
        let entries = self.entries.read().await;
        entries.get(id).map(|entry| entry.connection.clone())
    }

    /// Unregister `id` and close its connector.
    pub async fn close(&self, id: &str) -> Result<()> {
        let entry = {
            let mut entries = self.entries.write().await;
            entries
                .remove(id)
                .ok_or_else(|| ConnectorError::connection_not_found(id))?
        };

        let result = entry.connector.lock().await.close().await;
        tracing::debug!("Unregistered connection '{}'", id);
        result
    }

    /// Unregister and close every connection. Close failures are logged.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Entry)> = {
            let mut entries = self.entries.write().await;
            entries.drain().collect()
        };

        for (id, entry) in drained {
            if let Err(e) = entry.connector.lock().await.close().await {
                tracing::warn!("Failed to close connection '{}': {}", id, e);
            }
        }
    }

    /// Registered ids, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wins_over_query() {
        assert_eq!(connection_id_from_request(Some("a"), Some("b")), Some("a"));
        assert_eq!(connection_id_from_request(None, Some("b")), Some("b"));
        assert_eq!(connection_id_from_request(Some("  "), Some("b")), Some("b"));
        assert_eq!(connection_id_from_request(None, None), None);
    }

    #[test]
    fn test_dashboard_connection_json() {
        let conn = DashboardConnection::new("c1").with_enter_app(true);
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json, serde_json::json!({"id": "c1", "isEnterApp": true}));

        let parsed: DashboardConnection = serde_json::from_str(r#"{"id":"c2"}"#).unwrap();
        assert!(!parsed.enter_app);
    }

    #[test]
    fn test_unknown_id() {
        let resolver = ConnectionResolver::new();
        let err = smol::block_on(resolver.resolve("missing")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConnectionNotFound);
        assert!(smol::block_on(resolver.is_empty()));
    }
}
