//! # agentdeck - Back-Office Agent Dashboard
//!
//! The main binary of agentdeck.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface to inspect agents and play runs in the terminal
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  apps/agentdeck (THE BINARY)                │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────────┐   │
//! │  │    CLI      │    │   HTTP API  │    │ Engine driver  │   │
//! │  │   (clap)    │    │   (axum)    │    │ (tokio clock)  │   │
//! │  └──────┬──────┘    └──────┬──────┘    └───────┬────────┘   │
//! │         │                  │                   │            │
//! │         └──────────────────┼───────────────────┘            │
//! │                            ▼                                │
//! │                   ┌────────────────┐                        │
//! │                   │ agentdeck-core │                        │
//! │                   │  (THE LOGIC)   │                        │
//! │                   └────────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! agentdeck server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! agentdeck agents
//! agentdeck run logistics --entity TRK-12
//! agentdeck run cost --category fuel --instant --json-mode
//! ```

use agentdeck::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments first: --verbose changes the default log filter.
    let cli = cli::Cli::parse();

    // AGENTDECK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("AGENTDECK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "agentdeck=debug,tower_http=debug"
    } else {
        "agentdeck=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the agentdeck startup banner.
fn print_banner() {
    println!(
        r#"
   ___   ____ ____ _  __ ______ ___   ____ _____ __ __
  / _ | / __// __// |/ //_  __// _ \ / __// ___// //_/
 / __ |/ (_ // _/ /    /  / /  / // // _/ / /__ / ,<
/_/ |_|\___//___//_/|_/  /_/  /____//___/ \___//_/|_|

  Back-office agent dashboard v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
