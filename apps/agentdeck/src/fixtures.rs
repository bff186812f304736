//! # Dataset Fixtures
//!
//! Static JSON datasets, one per agent. The four default agents ship with
//! bundled fixtures; any agent may point at a file under `fixtures_dir`
//! instead.

use crate::config::{AgentConfig, AppConfig};
use crate::error::AppError;
use agentdeck_core::{AgentId, Record, StaticDatasets};
use std::collections::BTreeSet;
use std::path::Path;

/// Maximum fixture file size (16 MB).
const MAX_FIXTURE_FILE_SIZE: u64 = 16 * 1024 * 1024;

const LOGISTICS: &str = include_str!("../fixtures/logistics.json");
const PRICING: &str = include_str!("../fixtures/pricing.json");
const COST: &str = include_str!("../fixtures/cost.json");
const RECONCILIATION: &str = include_str!("../fixtures/reconciliation.json");

/// Bundled fixture for an agent id, if one ships with the binary.
#[must_use]
pub fn bundled_fixture(agent: &AgentId) -> Option<&'static str> {
    match agent.as_str() {
        "logistics" => Some(LOGISTICS),
        "pricing" => Some(PRICING),
        "cost" => Some(COST),
        "reconciliation" => Some(RECONCILIATION),
        _ => None,
    }
}

/// Parse a fixture. `source` names it in error messages.
///
/// Record ids must be unique within a fixture.
pub fn parse_fixture(text: &str, source: &str) -> Result<Vec<Record>, AppError> {
    let records: Vec<Record> = serde_json::from_str(text)
        .map_err(|e| AppError::Fixture(format!("{}: {}", source, e)))?;

    let mut seen = BTreeSet::new();
    for record in &records {
        if !seen.insert(record.id.as_str()) {
            return Err(AppError::Fixture(format!(
                "{}: duplicate record id '{}'",
                source, record.id
            )));
        }
    }
    Ok(records)
}

/// Load the dataset of every configured agent.
pub fn load_datasets(config: &AppConfig) -> Result<StaticDatasets, AppError> {
    let mut datasets = StaticDatasets::new();
    for agent in &config.agents {
        let records = load_agent(agent, config.fixtures_dir.as_deref())?;
        tracing::debug!("Loaded {} records for agent '{}'", records.len(), agent.id);
        datasets.insert(agent.id.clone(), records);
    }
    Ok(datasets)
}

fn load_agent(agent: &AgentConfig, fixtures_dir: Option<&Path>) -> Result<Vec<Record>, AppError> {
    match &agent.fixture {
        Some(file) => {
            let path = match fixtures_dir {
                Some(dir) => dir.join(file),
                None => file.clone(),
            };
            let text = read_fixture_file(&path)?;
            parse_fixture(&text, &path.display().to_string())
        }
        None => {
            let text = bundled_fixture(&agent.id).ok_or_else(|| {
                AppError::Fixture(format!(
                    "agent '{}' has no fixture file and no bundled dataset",
                    agent.id
                ))
            })?;
            parse_fixture(text, agent.id.as_str())
        }
    }
}

fn read_fixture_file(path: &Path) -> Result<String, AppError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        AppError::Fixture(format!("Cannot read fixture '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(AppError::Fixture(format!(
            "Fixture '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_FIXTURE_FILE_SIZE {
        return Err(AppError::Fixture(format!(
            "Fixture size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_FIXTURE_FILE_SIZE
        )));
    }
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Io(format!("Cannot read fixture '{}': {}", path.display(), e)))
}

// =============================================================================
// TESTS
// =============================================================================
