//! # agentdeck
//!
//! Library half of the agentdeck binary: configuration, fixtures, the
//! real-time engine around `agentdeck-core`, the HTTP API and the CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;

pub use config::{AppConfig, Scenario, Scenarios};
pub use engine::Engine;
pub use error::AppError;
