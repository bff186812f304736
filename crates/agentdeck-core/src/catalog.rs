//! # Stage Catalog
//!
//! An ordered, immutable list of [`StageDescriptor`]s describing one scripted
//! agent run.
//!
//! ## Invariants (checked at construction)
//!
//! - The catalog is non-empty and holds at most [`MAX_STAGES`] stages
//! - Targets are strictly increasing, starting above the implicit 0
//! - The final target is exactly 100%
//! - Labels are non-empty and at most [`MAX_LABEL_LENGTH`] bytes
//! - No stage lasts longer than [`MAX_STAGE_DURATION_MS`]
//!
//! A catalog that violates any of these is a [`SimError::Configuration`] and
//! can never be handed to the sequencer.

use crate::primitives::{MAX_LABEL_LENGTH, MAX_STAGE_DURATION_MS, MAX_STAGES};
use crate::{Progress, SimError};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE DESCRIPTOR
// =============================================================================

/// One labeled phase of a simulated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Human-readable description of the stage.
    pub label: String,
    /// Cumulative progress this stage must reach.
    pub target: Progress,
    /// Time budget for interpolating from the previous target to this one.
    pub duration_ms: u64,
}

impl StageDescriptor {
    /// Create a new stage descriptor.
    #[must_use]
    pub fn new(label: impl Into<String>, target: Progress, duration_ms: u64) -> Self {
        Self {
            label: label.into(),
            target,
            duration_ms,
        }
    }

    /// Create a stage descriptor from a whole-percent target.
    pub fn with_percent(
        label: impl Into<String>,
        percent: u8,
        duration_ms: u64,
    ) -> Result<Self, SimError> {
        let target = Progress::from_percent(percent).ok_or_else(|| {
            SimError::Configuration(format!("stage target {}% exceeds 100%", percent))
        })?;
        Ok(Self::new(label, target, duration_ms))
    }
}

// =============================================================================
// STAGE CATALOG
// =============================================================================

/// Validated, ordered list of stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StageDescriptor>", into = "Vec<StageDescriptor>")]
pub struct StageCatalog {
    stages: Vec<StageDescriptor>,
}

impl StageCatalog {
    /// Build a catalog, validating every invariant.
    pub fn new(stages: Vec<StageDescriptor>) -> Result<Self, SimError> {
        Self::validate(&stages)?;
        Ok(Self { stages })
    }

    /// Build a catalog from `(label, percent, duration_ms)` triples.
    pub fn from_percent_steps(steps: &[(&str, u8, u64)]) -> Result<Self, SimError> {
        let stages = steps
            .iter()
            .map(|&(label, percent, duration)| {
                StageDescriptor::with_percent(label, percent, duration)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    /// Check catalog invariants without building a catalog.
    pub fn validate(stages: &[StageDescriptor]) -> Result<(), SimError> {
        if stages.is_empty() {
            return Err(SimError::Configuration("stage catalog is empty".into()));
        }
        if stages.len() > MAX_STAGES {
            return Err(SimError::Configuration(format!(
                "stage catalog has {} stages, maximum is {}",
                stages.len(),
                MAX_STAGES
            )));
        }

        let mut previous = Progress::ZERO;
        for (index, stage) in stages.iter().enumerate() {
            if stage.label.trim().is_empty() {
                return Err(SimError::Configuration(format!(
                    "stage {} has an empty label",
                    index
                )));
            }
            if stage.label.len() > MAX_LABEL_LENGTH {
                return Err(SimError::Configuration(format!(
                    "stage {} label length {} exceeds maximum {} bytes",
                    index,
                    stage.label.len(),
                    MAX_LABEL_LENGTH
                )));
            }
            if stage.duration_ms > MAX_STAGE_DURATION_MS {
                return Err(SimError::Configuration(format!(
                    "stage {} duration {}ms exceeds maximum {}ms",
                    index, stage.duration_ms, MAX_STAGE_DURATION_MS
                )));
            }
            if stage.target <= previous {
                return Err(SimError::Configuration(format!(
                    "stage {} target {} does not exceed previous target {}",
                    index, stage.target, previous
                )));
            }
            previous = stage.target;
        }

        if !previous.is_complete() {
            return Err(SimError::Configuration(format!(
                "final stage target is {}, must be 100%",
                previous
            )));
        }

        Ok(())
    }

    /// Get the stage at `index`.
    #[must_use]
    pub fn stage_at(&self, index: usize) -> Option<&StageDescriptor> {
        self.stages.get(index)
    }

    /// Number of stages (always at least 1).
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Check if `index` is the final stage.
    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index.saturating_add(1) == self.stages.len()
    }

    /// Progress at which stage `index` starts: the previous target, or 0.
    #[must_use]
    pub fn start_of(&self, index: usize) -> Progress {
        index
            .checked_sub(1)
            .and_then(|prev| self.stages.get(prev))
            .map(|s| s.target)
            .unwrap_or(Progress::ZERO)
    }

    /// Sum of all stage durations (excluding ticks and pauses).
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.stages
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.duration_ms))
    }

    /// Iterate stages in order.
    pub fn stages(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter()
    }
}

impl TryFrom<Vec<StageDescriptor>> for StageCatalog {
    type Error = SimError;

    fn try_from(stages: Vec<StageDescriptor>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<StageCatalog> for Vec<StageDescriptor> {
    fn from(catalog: StageCatalog) -> Self {
        catalog.stages
    }
}

// =============================================================================
// TESTS
// =============================================================================
