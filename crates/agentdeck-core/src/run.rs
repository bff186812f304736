//! # Run State
//!
//! The mutable state of a single run and the immutable snapshots handed to
//! observers.
//!
//! ## Lifecycle
//!
//! ```text
//!   Idle ──start──▶ Running ──last stage done──▶ Completed
//!                      │
//!                      └──────error signal─────▶ Failed
//! ```
//!
//! `Completed` and `Failed` are terminal. A new run always gets a fresh
//! [`RunState`]; an old one is never reset in place.

use crate::{AgentId, Generation, Progress};
use serde::{Deserialize, Serialize};

// =============================================================================
// RUN STATUS
// =============================================================================

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run has been started (or the last one was cancelled).
    Idle,
    /// Stages are being played.
    Running,
    /// Every stage reached its target and the payload was published.
    Completed,
    /// An explicit error signal ended the run.
    Failed,
}

impl RunStatus {
    /// Get the status name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Check if this status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RUN STATE
// =============================================================================

/// State of one run. Owned and mutated only by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    generation: Generation,
    agent: AgentId,
    stage_index: usize,
    progress: Progress,
    status: RunStatus,
    started_at_ms: u64,
    stage_started_at_ms: u64,
    finished_at_ms: Option<u64>,
    error: Option<String>,
}

impl RunState {
    /// Create the state of a freshly started run.
    pub(crate) fn start(generation: Generation, agent: AgentId, now_ms: u64) -> Self {
        Self {
            generation,
            agent,
            stage_index: 0,
            progress: Progress::ZERO,
            status: RunStatus::Running,
            started_at_ms: now_ms,
            stage_started_at_ms: now_ms,
            finished_at_ms: None,
            error: None,
        }
    }

    /// Generation of this run.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Agent this run belongs to.
    #[must_use]
    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    /// Index of the current stage.
    #[must_use]
    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Current cumulative progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Virtual time at which the current stage started.
    #[must_use]
    pub fn stage_started_at_ms(&self) -> u64 {
        self.stage_started_at_ms
    }

    /// Error message of a failed run.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check whether the run is still playing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Record a new progress value. Progress never decreases.
    pub(crate) fn record_progress(&mut self, progress: Progress) {
        self.progress = self.progress.max(progress);
    }

    /// Move to the next stage.
    pub(crate) fn advance_stage(&mut self, now_ms: u64) {
        self.stage_index = self.stage_index.saturating_add(1);
        self.stage_started_at_ms = now_ms;
    }

    pub(crate) fn complete(&mut self, now_ms: u64) {
        self.status = RunStatus::Completed;
        self.progress = Progress::COMPLETE;
        self.finished_at_ms = Some(now_ms);
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>, now_ms: u64) {
        self.status = RunStatus::Failed;
        self.error = Some(message.into());
        self.finished_at_ms = Some(now_ms);
    }

    /// Milliseconds since the run started, measured at `now_ms`.
    /// Frozen once the run is terminal.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.finished_at_ms
            .unwrap_or(now_ms)
            .saturating_sub(self.started_at_ms)
    }
}

// =============================================================================
// RUN SNAPSHOT
// =============================================================================

/// Immutable view of a run, delivered to observers on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub generation: Generation,
    pub agent: Option<AgentId>,
    pub status: RunStatus,
    pub stage_index: usize,
    pub stage_count: usize,
    pub stage_label: Option<String>,
    pub progress: Progress,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

impl RunSnapshot {
    /// Snapshot of a sequencer with no current run.
    #[must_use]
    pub fn idle(generation: Generation) -> Self {
        Self {
            generation,
            agent: None,
            status: RunStatus::Idle,
            stage_index: 0,
            stage_count: 0,
            stage_label: None,
            progress: Progress::ZERO,
            elapsed_ms: 0,
            error: None,
        }
    }

    /// Whole-percent progress for display.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.progress.percent()
    }
}

// =============================================================================
// TESTS
// =============================================================================
