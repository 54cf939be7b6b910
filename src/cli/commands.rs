//! CLI command implementations
//!
//! Both commands build a gateway from the config file and run startup
//! validation; `query` then serves exactly one request.

use std::path::Path;

use serde_json::{json, Value};

use crate::execution::QueryOutcome;
use crate::gateway::{GatewayConfig, QueryGateway};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response, QueryRequest};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Query { config } => query(&config),
    }
}

/// Build a gateway from a config file and validate its schema
fn boot(config_path: &Path) -> CliResult<QueryGateway> {
    let config = GatewayConfig::load(config_path)?;
    let gateway = QueryGateway::new(config)?;
    gateway.ready()?;
    Ok(gateway)
}

/// Load the schema and run startup validation
pub fn check(config_path: &Path) -> CliResult<()> {
    let gateway = boot(config_path)?;
    let schema = gateway.schema();
    write_response(&json!({
        "ready": true,
        "types": schema.types().count(),
    }))
}

/// Execute a single query read from stdin
///
/// The response is always written; a response carrying errors then fails
/// the command.
pub fn query(config_path: &Path) -> CliResult<()> {
    let gateway = boot(config_path)?;
    let request = read_request()?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;
    let (response, status) = runtime.block_on(run_request(&gateway, request))?;

    write_response(&response)?;
    if status >= 400 {
        return Err(CliError::query_failed(status));
    }
    Ok(())
}

/// Run one request against a ready gateway; returns the response JSON and status
pub async fn run_request(gateway: &QueryGateway, request: QueryRequest) -> CliResult<(Value, u16)> {
    let outcome = gateway
        .run(
            &request.query,
            request.context.unwrap_or_default(),
            request.variables.unwrap_or_default(),
            request.operation_name.as_deref(),
        )
        .await;

    match outcome {
        QueryOutcome::Single(response) => Ok((response.to_json(), response.status_code())),
        QueryOutcome::Stream(stream) => {
            stream.close();
            Err(CliError::io_error(
                "Subscriptions need a streaming transport; the query command serves one response",
            ))
        }
    }
}
