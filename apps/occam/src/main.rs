//! # Occam - Occam's-Razor Guidance Server
//!
//! The main binary for the Occam stage-transition engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for single steps and catalog inspection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 apps/occam (THE BINARY)                 │
//! │                                                         │
//! │   ┌─────────────┐   ┌─────────────┐   ┌────────────┐    │
//! │   │   CLI       │   │   HTTP API  │   │  Config    │    │
//! │   │  (clap)     │   │   (axum)    │   │ (toml/env) │    │
//! │   └──────┬──────┘   └──────┬──────┘   └─────┬──────┘    │
//! │          └─────────────────┼────────────────┘           │
//! │                            ▼                            │
//! │                    ┌───────────────┐                    │
//! │                    │  occam-core   │                    │
//! │                    │ (THE ENGINE)  │                    │
//! │                    └───────────────┘                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! occam server --host 0.0.0.0 --port 8080
//!
//! # Decide one step
//! echo '{"thought":"...","thought_number":1,...}' | occam step
//! occam stages
//! occam prompts --key implementation_refinement
//! ```

use clap::Parser;
use occam::cli;
use occam::config::{Config, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Configuration is needed before logging so [logging] format applies.
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.logging.format, cli.verbose);

    // Display startup banner
    if !cli.quiet && !cli.machine_output() {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` wins over the built-in filter.
fn init_tracing(format: LogFormat, verbose: bool) {
    let default_filter = if verbose {
        "occam=debug,occam_core=debug,tower_http=debug"
    } else {
        "occam=info,occam_core=info,tower_http=debug"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so `step` and `--json-mode` keep stdout clean.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Occam startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗  ██████╗ ██████╗ █████╗ ███╗   ███╗
  ██╔═══██╗██╔════╝██╔════╝██╔══██╗████╗ ████║
  ██║   ██║██║     ██║     ███████║██╔████╔██║
  ██║   ██║██║     ██║     ██╔══██║██║╚██╔╝██║
  ╚██████╔╝╚██████╗╚██████╗██║  ██║██║ ╚═╝ ██║
   ╚═════╝  ╚═════╝ ╚═════╝╚═╝  ╚═╝╚═╝     ╚═╝

  Occam's-Razor Guidance Engine v{}

  Simple • Sufficient • Stateless
"#,
        env!("CARGO_PKG_VERSION")
    );
}
