//! `dashq`: run one statement, or describe one table, and print JSON.

use anyhow::{bail, Result};
use clap::Parser;
use std::process::ExitCode;

use dash_connector::database::traits::{Credentials, Params, Value};
use dash_connector::database::Connector;
use dash_connector::logging::init_tracing;
use dash_connector::{resolve_dialect, ConnectorError};

/// Query any supported engine from the command line.
#[derive(Parser, Debug)]
#[command(name = "dashq")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Connection URL (postgres://, mysql://, clickhouse://, duckdb:path or duckdb::memory:)
    #[arg(long, env = "DASHQ_URL", value_name = "URL", hide_env_values = true)]
    url: String,

    /// Dialect to use instead of the one implied by the URL scheme
    #[arg(long, value_name = "DIALECT")]
    dialect: Option<String>,

    /// Describe a table instead of running a statement
    #[arg(long, value_name = "TABLE", conflicts_with = "sql")]
    describe: Option<String>,

    /// Positional parameter; JSON literals are typed, anything else is text
    #[arg(long = "param", value_name = "VALUE", conflicts_with = "named")]
    params: Vec<String>,

    /// Named parameter (ClickHouse)
    #[arg(long = "named", value_name = "NAME=VALUE")]
    named: Vec<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    log: String,

    /// Statement to run
    #[arg(value_name = "SQL", required_unless_present = "describe")]
    sql: Option<String>,
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw)
        .map(Value::from_json)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

fn build_params(cli: &Cli) -> Result<Params> {
    if !cli.named.is_empty() {
        let mut pairs = Vec::with_capacity(cli.named.len());
        for entry in &cli.named {
            let Some((name, value)) = entry.split_once('=') else {
                bail!("named parameter '{}' must look like name=value", entry);
            };
            pairs.push((name.trim().to_string(), parse_value(value)));
        }
        return Ok(Params::named(pairs));
    }

    if !cli.params.is_empty() {
        return Ok(Params::positional(cli.params.iter().map(|p| parse_value(p))));
    }

    Ok(Params::None)
}

/// Returns the JSON to print and whether the statement succeeded.
async fn run(cli: &Cli, connector: &mut Connector) -> Result<(serde_json::Value, bool)> {
    if let Some(table) = &cli.describe {
        let columns = connector.describe_table(table).await?;
        return Ok((serde_json::to_value(columns)?, true));
    }

    let Some(sql) = &cli.sql else {
        bail!("no statement given");
    };
    let params = build_params(cli)?;
    let result = connector.execute(sql, &params).await?;
    Ok((serde_json::to_value(&result)?, result.is_ok()))
}

async fn open(cli: &Cli) -> Result<Connector> {
    let (url_dialect, credentials) = Credentials::from_url(&cli.url)?;
    let dialect = match cli.dialect.as_deref() {
        Some(name) => resolve_dialect(name)?,
        None => url_dialect,
    };
    Ok(Connector::open(dialect, &credentials).await?)
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<ConnectorError>() {
        Some(connector_error) => match serde_json::to_string_pretty(&connector_error.report()) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("{connector_error}"),
        },
        None => eprintln!("error: {error:#}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    smol::block_on(async {
        let mut connector = match open(&cli).await {
            Ok(connector) => connector,
            Err(e) => {
                report(&e);
                return ExitCode::FAILURE;
            }
        };

        let outcome = run(&cli, &mut connector).await;
        if let Err(e) = connector.close().await {
            tracing::warn!("close failed: {}", e);
        }

        match outcome {
            Ok((json, ok)) => {
                match serde_json::to_string_pretty(&json) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return ExitCode::FAILURE;
                    }
                }
                if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
            }
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        }
    })
}
