//! # agentdeck-core
//!
//! The deterministic Staged Progress Simulator - THE LOGIC.
//!
//! Each back-office agent of the agentdeck dashboard "analyses" its data by
//! playing a scripted list of stages. This crate plays those scripts:
//!
//! ```text
//!   StageCatalog ──▶ Sequencer ──ticks──▶ Interpolator
//!                        │
//!                        ├──snapshots──▶ RunObserver (presentation)
//!                        │
//!                        └──completion──▶ ResultPublisher ──▶ ResultPayload
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no I/O, no clock: virtual time is an input
//! - Integer arithmetic only; progress is stored in basis points
//! - One run at a time per sequencer; newer runs supersede older ones
//! - Stale timers are discarded by generation token, never cancelled

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod interpolator;
pub mod primitives;
pub mod publisher;
pub mod run;
pub mod sequencer;
pub mod timers;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AgentId, Generation, Progress, SimError};

// =============================================================================
// RE-EXPORTS: Simulator
// =============================================================================

pub use catalog::{StageCatalog, StageDescriptor};
pub use interpolator::{StageInterpolation, interpolate};
pub use publisher::{
    DatasetProvider, DateRange, Record, ResultPayload, ResultPublisher, Selection,
    SelectionParts, StaticDatasets, select_records,
};
pub use run::{RunSnapshot, RunState, RunStatus};
pub use sequencer::{
    NullObserver, RunObserver, RunPlan, Sequencer, SequencerConfig, SequencerStats,
};
pub use timers::{Timer, TimerKind, TimerQueue};
