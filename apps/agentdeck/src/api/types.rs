//! # API Types
//!
//! Request and response types for the HTTP API.

use agentdeck_core::{
    Record, ResultPayload, RunSnapshot, SelectionParts, SequencerStats, StageCatalog,
};
use serde::{Deserialize, Serialize};

use crate::config::Scenario;

// =============================================================================
// HEALTH
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// AGENTS
// =============================================================================

/// Stage of an agent catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageJson {
    pub label: String,
    pub target_percent: u8,
    pub duration_ms: u64,
}

/// One agent card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub stages: Vec<StageJson>,
    pub total_duration_ms: u64,
}

impl AgentSummary {
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id.to_string(),
            title: scenario.title.clone(),
            description: scenario.description.clone(),
            stages: stages_json(&scenario.catalog),
            total_duration_ms: scenario.catalog.total_duration_ms(),
        }
    }
}

/// Convert a catalog to its JSON form.
#[must_use]
pub fn stages_json(catalog: &StageCatalog) -> Vec<StageJson> {
    catalog
        .stages()
        .map(|s| StageJson {
            label: s.label.clone(),
            target_percent: s.target.percent(),
            duration_ms: s.duration_ms,
        })
        .collect()
}

/// Agent list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentSummary>,
}

/// Static dataset of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetResponse {
    pub agent: String,
    pub records: Vec<Record>,
}

// =============================================================================
// RUNS
// =============================================================================

/// Start a run. Selector fields are optional; blank strings count as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunRequest {
    pub agent: String,
    #[serde(flatten)]
    pub selection: SelectionParts,
}

/// Signal an explicit failure of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailRunRequest {
    pub generation: u64,
    pub message: String,
}

/// JSON view of a run snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJson {
    pub generation: u64,
    pub agent: Option<String>,
    pub status: String,
    pub stage_index: usize,
    pub stage_count: usize,
    pub stage_label: Option<String>,
    pub progress_percent: u8,
    pub progress_basis_points: u16,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

impl From<&RunSnapshot> for RunJson {
    fn from(snapshot: &RunSnapshot) -> Self {
        Self {
            generation: snapshot.generation.value(),
            agent: snapshot.agent.as_ref().map(ToString::to_string),
            status: snapshot.status.name().to_string(),
            stage_index: snapshot.stage_index,
            stage_count: snapshot.stage_count,
            stage_label: snapshot.stage_label.clone(),
            progress_percent: snapshot.percent(),
            progress_basis_points: snapshot.progress.basis_points(),
            elapsed_ms: snapshot.elapsed_ms,
            error: snapshot.error.clone(),
        }
    }
}

/// Response carrying a run snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    pub run: RunJson,
}

impl RunResponse {
    #[must_use]
    pub fn success(snapshot: &RunSnapshot) -> Self {
        Self {
            success: true,
            run: RunJson::from(snapshot),
        }
    }
}

/// Response to a cancel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    /// Generation of the cancelled run; absent when nothing was running.
    pub cancelled: Option<u64>,
}

/// Result payload of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub success: bool,
    pub generation: u64,
    pub agent: String,
    pub selection: SelectionParts,
    pub unfiltered: bool,
    pub record_count: usize,
    pub total_amount_cents: i64,
    pub records: Vec<Record>,
}

impl From<ResultPayload> for ResultResponse {
    fn from(payload: ResultPayload) -> Self {
        Self {
            success: true,
            generation: payload.generation.value(),
            agent: payload.agent.to_string(),
            record_count: payload.len(),
            total_amount_cents: payload.total_amount_cents(),
            unfiltered: payload.unfiltered,
            selection: payload.selection.into(),
            records: payload.records,
        }
    }
}

/// Sequencer counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub runs_cancelled: u64,
    pub ticks: u64,
    pub discarded_timers: u64,
}

impl From<SequencerStats> for StatsResponse {
    fn from(stats: SequencerStats) -> Self {
        Self {
            runs_started: stats.runs_started,
            runs_completed: stats.runs_completed,
            runs_failed: stats.runs_failed,
            runs_cancelled: stats.runs_cancelled,
            ticks: stats.ticks,
            discarded_timers: stats.discarded_timers,
        }
    }
}

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}
