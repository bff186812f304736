//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the simulator:
//! - Identifiers (`AgentId`, `Generation`)
//! - Progress representation (`Progress`)
//! - Error types (`SimError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for counters to prevent overflow

use crate::primitives::BASIS_POINTS_PER_WHOLE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a back-office agent (e.g. `logistics`, `pricing`).
///
/// Always stored lowercase and trimmed so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Create a new agent id, normalizing case and surrounding whitespace.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_ascii_lowercase())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run generation token.
///
/// Every run started on a sequencer receives the next generation. Timers and
/// payloads are stamped with the generation that produced them, and anything
/// carrying an older generation is silently discarded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    /// Generation of a sequencer that has never started a run.
    pub const INITIAL: Self = Self(0);

    /// The generation following this one, or `None` once the counter is
    /// exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Cumulative run progress in basis points (`0..=10_000`).
///
/// Stored as an integer so interpolation is exact. Use [`Progress::percent`]
/// for whole-percent display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct Progress(u16);

impl Progress {
    /// No progress.
    pub const ZERO: Self = Self(0);

    /// 100%.
    pub const COMPLETE: Self = Self(BASIS_POINTS_PER_WHOLE);

    /// Create progress from basis points. Returns `None` above 100%.
    #[must_use]
    pub const fn from_basis_points(bp: u16) -> Option<Self> {
        if bp > BASIS_POINTS_PER_WHOLE {
            None
        } else {
            Some(Self(bp))
        }
    }

    /// Create progress from a whole percentage. Returns `None` above 100.
    #[must_use]
    pub const fn from_percent(percent: u8) -> Option<Self> {
        if percent > 100 {
            None
        } else {
            Some(Self(percent as u16 * 100))
        }
    }

    /// Raw basis points.
    #[must_use]
    pub const fn basis_points(self) -> u16 {
        self.0
    }

    /// Whole percent, rounded down.
    #[must_use]
    pub const fn percent(self) -> u8 {
        (self.0 / 100) as u8
    }

    /// Check whether this is 100%.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.0 == BASIS_POINTS_PER_WHOLE
    }
}

impl TryFrom<u16> for Progress {
    type Error = SimError;

    fn try_from(bp: u16) -> Result<Self, Self::Error> {
        Self::from_basis_points(bp).ok_or_else(|| {
            SimError::Configuration(format!(
                "progress {} exceeds {} basis points",
                bp, BASIS_POINTS_PER_WHOLE
            ))
        })
    }
}

impl From<Progress> for u16 {
    fn from(p: Progress) -> Self {
        p.0
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the simulator.
///
/// - Configuration errors are fatal and must prevent any run from starting
/// - `CancelledRun` is never shown to users; superseded runs are dropped silently
/// - The CORE never panics; all errors are recoverable values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The stage catalog or sequencer settings are invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run was superseded by a newer one.
    #[error("Run {0} was superseded")]
    CancelledRun(Generation),

    /// The operation backing a run failed mid-run.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// No dataset or scenario is registered for the agent.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// The user selection is malformed (e.g. inverted date range).
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// The operation needs a running run and there is none.
    #[error("No active run")]
    NoActiveRun,

    /// A signal addressed a run that is no longer current.
    #[error("Stale generation: expected {expected}, got {got}")]
    StaleGeneration {
        expected: Generation,
        got: Generation,
    },
}

// =============================================================================
// TESTS
// =============================================================================
