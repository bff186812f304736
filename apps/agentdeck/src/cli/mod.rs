//! # agentdeck CLI Module
//!
//! This module implements the CLI interface for agentdeck.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `agents` - List configured agents
//! - `stages` - Show the stage catalog of an agent
//! - `dataset` - Print the dataset of an agent
//! - `run` - Play a run in the terminal
//! - `check-config` - Validate configuration and fixtures

mod commands;

use crate::error::AppError;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// agentdeck - back-office agent dashboard
///
/// Plays scripted staged analyses of logistics, pricing, cost and
/// reconciliation data and serves them to the dashboard.
#[derive(Parser, Debug)]
#[command(name = "agentdeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (defaults to AGENTDECK_CONFIG, then the built-in config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List configured agents
    Agents,

    /// Show the stage catalog of an agent
    Stages {
        /// Agent id
        agent: String,
    },

    /// Print the unfiltered dataset of an agent
    Dataset {
        /// Agent id
        agent: String,
    },

    /// Play a run and print its result
    Run {
        /// Agent id
        agent: String,

        /// Only records of this entity
        #[arg(short, long)]
        entity: Option<String>,

        /// Only records of this category
        #[arg(short = 'k', long)]
        category: Option<String>,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Fast-forward virtual time instead of waiting
        #[arg(short, long)]
        instant: bool,
    },

    /// Validate configuration and fixtures
    CheckConfig,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = crate::config::AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&config, host, port).await,
        Some(Commands::Agents) | None => cmd_agents(&config, json_mode),
        Some(Commands::Stages { agent }) => cmd_stages(&config, json_mode, &agent),
        Some(Commands::Dataset { agent }) => cmd_dataset(&config, json_mode, &agent),
        Some(Commands::Run {
            agent,
            entity,
            category,
            from,
            to,
            instant,
        }) => {
            let request = RunRequest {
                agent,
                entity,
                category,
                from,
                to,
            };
            if instant {
                cmd_run_instant(&config, json_mode, request)
            } else {
                cmd_run(&config, json_mode, request).await
            }
        }
        Some(Commands::CheckConfig) => cmd_check_config(&config, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
