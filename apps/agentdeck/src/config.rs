//! # Configuration
//!
//! agentdeck reads a single TOML file describing the sequencer timing, the
//! HTTP server, and the agents with their stage catalogs. Without a file the
//! embedded `agentdeck.toml` is used.
//!
//! ## Environment Overrides
//!
//! - `AGENTDECK_CONFIG`: Path to the configuration file
//! - `AGENTDECK_TICK_MS`: Interpolator polling cadence
//! - `AGENTDECK_PAUSE_MS`: Pause between stages
//! - `AGENTDECK_RATE_LIMIT`: Run starts per second (0 disables)
//! - `AGENTDECK_CORS_ORIGINS`: Comma-separated origins, or "*" for all

use crate::error::AppError;
use agentdeck_core::{AgentId, SequencerConfig, SimError, StageCatalog, StageDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../agentdeck.toml");

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

pub const ENV_CONFIG: &str = "AGENTDECK_CONFIG";
pub const ENV_TICK_MS: &str = "AGENTDECK_TICK_MS";
pub const ENV_PAUSE_MS: &str = "AGENTDECK_PAUSE_MS";
pub const ENV_RATE_LIMIT: &str = "AGENTDECK_RATE_LIMIT";
pub const ENV_CORS_ORIGINS: &str = "AGENTDECK_CORS_ORIGINS";

// =============================================================================
// FILE FORMAT
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Run starts allowed per second. 0 disables the limiter.
    pub rate_limit_per_second: u32,
    /// Allowed CORS origins. Empty means localhost only, `["*"]` means any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit_per_second: 10,
            cors_origins: Vec::new(),
        }
    }
}

/// One stage as written in the file. `target` is a whole percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub label: String,
    pub target: u8,
    pub duration_ms: u64,
}

/// One agent card of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub id: AgentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// JSON fixture for this agent, relative to `fixtures_dir`.
    /// Falls back to the bundled fixture of the same agent id.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
    pub stages: Vec<StageConfig>,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub agents: Vec<AgentConfig>,
}

impl AppConfig {
    /// Parse a configuration from TOML text. No overrides are applied.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// The embedded default configuration.
    pub fn embedded() -> Result<Self, AppError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Load the configuration and apply environment overrides.
    ///
    /// `path` wins over `AGENTDECK_CONFIG`; with neither, the embedded default
    /// is used.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`AppConfig::load`] with variables looked up through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = lookup(ENV_CONFIG).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                let text = read_config_file(&path)?;
                let mut config = Self::from_toml_str(&text)?;
                config.resolve_fixtures_dir(&path);
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                tracing::debug!("Using embedded configuration");
                Self::embedded()?
            }
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tick) = parse_override(&lookup, ENV_TICK_MS)? {
            self.sequencer.tick_interval_ms = tick;
        }
        if let Some(pause) = parse_override(&lookup, ENV_PAUSE_MS)? {
            self.sequencer.stage_pause_ms = pause;
        }
        if let Some(limit) = parse_override(&lookup, ENV_RATE_LIMIT)? {
            self.server.rate_limit_per_second = limit;
        }
        if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Validate everything and build the agent registry.
    pub fn scenarios(&self) -> Result<Scenarios, AppError> {
        self.sequencer.validate()?;

        if self.agents.is_empty() {
            return Err(AppError::Config("no agents configured".to_string()));
        }

        let mut scenarios = BTreeMap::new();
        for agent in &self.agents {
            if agent.id.as_str().is_empty() {
                return Err(AppError::Config("agent id cannot be empty".to_string()));
            }
            let catalog = agent.catalog().map_err(|e| {
                AppError::Config(format!("agent '{}': {}", agent.id, e))
            })?;
            let scenario = Scenario {
                id: agent.id.clone(),
                title: agent.title.clone(),
                description: agent.description.clone(),
                catalog,
            };
            if scenarios.insert(agent.id.clone(), scenario).is_some() {
                return Err(AppError::Config(format!(
                    "agent '{}' is configured twice",
                    agent.id
                )));
            }
        }
        Ok(Scenarios(scenarios))
    }

    /// Relative `fixtures_dir` paths are taken relative to the config file.
    fn resolve_fixtures_dir(&mut self, config_path: &Path) {
        if let (Some(dir), Some(parent)) = (&self.fixtures_dir, config_path.parent())
            && dir.is_relative()
        {
            let resolved = parent.join(dir);
            self.fixtures_dir = Some(resolved);
        }
    }
}

impl AgentConfig {
    /// Build and validate the stage catalog of this agent.
    pub fn catalog(&self) -> Result<StageCatalog, SimError> {
        let stages = self
            .stages
            .iter()
            .map(|s| StageDescriptor::with_percent(s.label.clone(), s.target, s.duration_ms))
            .collect::<Result<Vec<_>, _>>()?;
        StageCatalog::new(stages)
    }
}

fn read_config_file(path: &Path) -> Result<String, AppError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        AppError::Io(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(AppError::Config(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Io(format!("Cannot read config '{}': {}", path.display(), e)))
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} is not a valid number: '{}'", key, raw))),
    }
}

// =============================================================================
// AGENT REGISTRY
// =============================================================================

/// A validated agent: display data plus its stage catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: AgentId,
    pub title: String,
    pub description: String,
    pub catalog: StageCatalog,
}

/// All configured agents, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenarios(BTreeMap<AgentId, Scenario>);

impl Scenarios {
    /// Look up an agent.
    pub fn get(&self, agent: &AgentId) -> Result<&Scenario, SimError> {
        self.0
            .get(agent)
            .ok_or_else(|| SimError::UnknownAgent(agent.to_string()))
    }

    /// Iterate agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.0.values()
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no agents are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
