//! # Occam CLI Module
//!
//! This module implements the CLI interface for Occam.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `step` - Decide one step from a JSON request (file or stdin)
//! - `stages` - Show the stage table and loopback allow-list
//! - `prompts` - Show guidance texts

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use occam_core::OccamError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Occam - Occam's-razor guidance for LLM problem solving
///
/// A stateless engine that walks an agent from context analysis to
/// implementation, always steering toward the simplest effective solution.
#[derive(Parser, Debug)]
#[command(name = "occam")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (overrides OCCAM_CONFIG)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Whether stdout must carry only machine output.
    #[must_use]
    pub fn machine_output(&self) -> bool {
        self.json_mode || matches!(self.command, Some(Commands::Step { .. }))
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Decide one step from a JSON request
    Step {
        /// Path to the request file (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the stage table and loopback allow-list
    Stages,

    /// Show guidance texts
    Prompts {
        /// Show only the text for this canonical key
        #[arg(short, long)]
        key: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and loaded configuration.
pub async fn execute(cli: Cli, config: Config) -> Result<(), OccamError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Step { file }) => cmd_step(&config, file.as_deref()),
        Some(Commands::Prompts { key }) => cmd_prompts(&config, json_mode, key.as_deref()),
        Some(Commands::Stages) | None => cmd_stages(json_mode),
    }
}
