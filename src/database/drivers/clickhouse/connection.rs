//! ClickHouse engine adapter.
//!
//! ClickHouse is reached through its HTTP interface (default port 8123).
//! Every statement is one POST; the server keeps no session state between
//! requests, so "closing" only forgets the endpoint.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value as JsonValue;
use url::Url;

use super::schema;
use super::types::{param_value, ClickHouseValueConverter};
use crate::database::statement::StatementKind;
use crate::database::traits::{
    BoxedAdapter, Credentials, Dialect, EngineAdapter, Params, RawResponse, TableColumn, TableRef,
    Value,
};

/// Output format requested for every statement.
const OUTPUT_FORMAT: &str = "JSONCompact";

/// HTTP endpoint plus the settings sent with every request.
#[derive(Clone)]
pub(super) struct HttpEndpoint {
    base_url: Url,
    username: String,
    password: String,
    database: String,
    settings: Vec<(String, String)>,
}

impl std::fmt::Debug for HttpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpoint")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl HttpEndpoint {
    fn from_credentials(credentials: &Credentials) -> Result<Self> {
        match credentials {
            Credentials::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
                options,
            } => {
                let scheme = if ClickHouseValueConverter::use_https(ssl_mode) {
                    "https"
                } else {
                    "http"
                };
                let base_url = Url::parse(&format!("{scheme}://{hostname}:{port}/"))
                    .with_context(|| format!("invalid ClickHouse host '{hostname}'"))?;

                let mut settings: Vec<(String, String)> =
                    options.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                settings.sort();

                Ok(Self {
                    base_url,
                    username: username.clone(),
                    password: password.clone(),
                    database: database.clone(),
                    settings,
                })
            }
            Credentials::File { .. } | Credentials::InMemory => Err(anyhow!(
                "ClickHouse does not support file-based or in-memory connections"
            )),
        }
    }

    /// Request URL for one statement, with named parameters as
    /// `param_<name>` settings.
    fn request_url(&self, params: &[(String, Value)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            if !self.database.is_empty() {
                query.append_pair("database", &self.database);
            }
            query.append_pair("default_format", OUTPUT_FORMAT);
            query.append_pair("output_format_json_quote_64bit_integers", "0");
            for (key, value) in &self.settings {
                query.append_pair(key, value);
            }
            for (name, value) in params {
                query.append_pair(&format!("param_{name}"), &param_value(value));
            }
        }
        url
    }

    fn auth_header(&self) -> String {
        let auth = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(auth))
    }

    /// POST one statement and return the response body.
    pub(super) async fn post(&self, sql: &str, params: &[(String, Value)]) -> Result<String> {
        let url = self.request_url(params).to_string();
        let auth_header = self.auth_header();
        let sql_body = sql.to_string();

        // smolhttp is blocking
        let (status, reason, body) = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?
                .post()
                .headers(vec![
                    ("Authorization".to_string(), auth_header),
                    ("Content-Type".to_string(), "text/plain".to_string()),
                ])
                .body(sql_body.into_bytes())
                .send()
                .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

            Ok::<_, anyhow::Error>((response.status_code(), response.reason(), response.text()))
        })
        .await?;

        check_status(status, &reason, body)
    }

    /// POST a statement and parse the `JSONCompact` body.
    pub(super) async fn query_json(&self, sql: &str, params: &[(String, Value)]) -> Result<JsonValue> {
        let body = self.post(sql, params).await?;
        serde_json::from_str(&body).context("Failed to parse ClickHouse response")
    }
}

/// Any status outside 2xx is an error; the body carries the server's message.
fn check_status(status: usize, reason: &str, body: String) -> Result<String> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    let message = body.trim();
    if message.is_empty() {
        bail!("ClickHouse HTTP {} {}", status, reason.trim());
    }
    bail!("ClickHouse error (HTTP {}): {}", status, message)
}

/// One ClickHouse HTTP endpoint.
#[derive(Debug)]
pub struct ClickHouseAdapter {
    endpoint: Option<HttpEndpoint>,
}

impl ClickHouseAdapter {
    /// Resolve the endpoint and check it answers `SELECT 1`.
    pub async fn open(credentials: &Credentials) -> Result<Self> {
        let endpoint = HttpEndpoint::from_credentials(credentials)?;
        endpoint
            .post("SELECT 1", &[])
            .await
            .context("Failed to connect to ClickHouse")?;

        Ok(Self {
            endpoint: Some(endpoint),
        })
    }

    /// Create a boxed adapter (for factory use).
    pub async fn boxed(credentials: &Credentials) -> Result<BoxedAdapter> {
        Ok(Box::new(Self::open(credentials).await?))
    }

    fn endpoint(&self) -> Result<&HttpEndpoint> {
        self.endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("ClickHouse connection is closed"))
    }
}

#[async_trait]
impl EngineAdapter for ClickHouseAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::ClickHouse
    }

    async fn execute(&mut self, sql: &str, kind: StatementKind, params: &Params) -> Result<RawResponse> {
        let named = params.as_named()?;
        let endpoint = self.endpoint()?;
        let body = endpoint.post(sql, named).await.context("Query failed")?;

        if !(kind.returns_rows() || kind == StatementKind::Other) {
            // ClickHouse reports no row counts over HTTP
            return Ok(RawResponse::Completed);
        }

        if body.trim().is_empty() {
            return Ok(if kind.returns_rows() {
                RawResponse::empty_rows()
            } else {
                RawResponse::Completed
            });
        }

        let json: JsonValue =
            serde_json::from_str(&body).context("Failed to parse ClickHouse response")?;
        let (columns, rows) = ClickHouseValueConverter::parse_json_compact(&json);
        Ok(RawResponse::Rows { columns, rows })
    }

    async fn describe_table(&mut self, table: &TableRef) -> Result<Option<Vec<TableColumn>>> {
        schema::describe_table(self.endpoint()?, table).await
    }

    async fn begin(&mut self) -> Result<()> {
        bail!("ClickHouse does not support transactions")
    }

    async fn commit(&mut self) -> Result<()> {
        bail!("ClickHouse does not support transactions")
    }

    async fn rollback(&mut self) -> Result<()> {
        bail!("ClickHouse does not support transactions")
    }

    async fn ping(&mut self) -> Result<()> {
        self.endpoint()?.post("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.endpoint = None;
        Ok(())
    }
}
