//! CLI argument definitions using clap
//!
//! Commands:
//! - querygate check --config <path>
//! - querygate query --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// querygate - compiled-query cache and subscription bridge for a GraphQL gateway
#[derive(Parser, Debug)]
#[command(name = "querygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the schema and run startup validation
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,
    },

    /// Execute a single query read from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./querygate.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
