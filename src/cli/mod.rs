//! CLI module for querygate
//!
//! Provides command-line interface for:
//! - check: load the configured schema and run startup validation
//! - query: one-shot query execution against the configured gateway

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, query, run, run_command, run_request};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response, QueryRequest};
