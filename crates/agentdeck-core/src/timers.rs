//! # Virtual Timer Queue
//!
//! Pending sequencer timers, ordered by `(due_ms, sequence)`.
//!
//! Timers are never removed on cancellation. Each carries the generation of
//! the run that scheduled it and the sequencer drops it when it fires for a
//! superseded run.

use crate::Generation;
use std::collections::BTreeMap;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Sample the interpolator and publish progress.
    Tick,
    /// Leave the current stage after the inter-stage pause.
    StageAdvance,
}

/// A fired timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub due_ms: u64,
    pub generation: Generation,
    pub kind: TimerKind,
}

/// Deterministic timer queue keyed on virtual milliseconds.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    entries: BTreeMap<(u64, u64), (Generation, TimerKind)>,
    sequence: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer.
    pub fn schedule(&mut self, due_ms: u64, generation: Generation, kind: TimerKind) {
        self.entries.insert((due_ms, self.sequence), (generation, kind));
        self.sequence = self.sequence.saturating_add(1);
    }

    /// Pop the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let (&(due_ms, _), _) = self.entries.first_key_value()?;
        if due_ms > now_ms {
            return None;
        }
        self.entries
            .pop_first()
            .map(|((due_ms, _), (generation, kind))| Timer {
                due_ms,
                generation,
                kind,
            })
    }

    /// Due time of the earliest pending timer.
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.first_key_value().map(|(&(due, _), _)| due)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
