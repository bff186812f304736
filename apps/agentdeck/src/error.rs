//! # Application Errors
//!
//! Everything that can go wrong outside the deterministic core: reading the
//! configuration, loading fixtures, binding sockets.

use agentdeck_core::SimError;
use thiserror::Error;

/// Errors raised by the agentdeck binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error reported by the simulator core.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// A request was well-formed JSON but carried an unusable value.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The configuration file is missing, malformed, or inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// A dataset fixture could not be found or parsed.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// I/O error (file access, socket bind, server loop).
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
