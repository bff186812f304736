//! # Sequencer
//!
//! Plays a [`StageCatalog`] as a run: samples the interpolator at a fixed
//! cadence, advances stages once their target is reached, and publishes the
//! result payload exactly once when the final stage is done.
//!
//! ## Scheduling
//!
//! The sequencer has no clock. Callers feed it virtual time through
//! [`Sequencer::advance_to`], and it fires every timer due up to that
//! instant. Stage-relative time is measured from each timer's due time, so
//! the output does not depend on how often `advance_to` is called.
//!
//! ## Cancellation
//!
//! Every run gets a fresh [`Generation`]. Timers carry the generation that
//! scheduled them. Starting a new run or cancelling the current one leaves
//! old timers in the queue; when they fire they no longer match the current
//! running run and are discarded without touching any state.

use crate::interpolator::StageInterpolation;
use crate::primitives::{
    DEFAULT_STAGE_PAUSE_MS, DEFAULT_TICK_INTERVAL_MS, MAX_STAGE_PAUSE_MS, MAX_TICK_INTERVAL_MS,
};
use crate::publisher::{DatasetProvider, ResultPayload, ResultPublisher, Selection};
use crate::run::{RunSnapshot, RunState};
use crate::timers::{Timer, TimerKind, TimerQueue};
use crate::{AgentId, Generation, SimError, StageCatalog};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Timing settings of a sequencer. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    /// Polling cadence of the interpolator.
    pub tick_interval_ms: u64,
    /// Pause between reaching a stage target and entering the next stage.
    pub stage_pause_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            stage_pause_ms: DEFAULT_STAGE_PAUSE_MS,
        }
    }
}

impl SequencerConfig {
    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(SimError::Configuration(format!(
                "tick interval must be within 1..={}ms, got {}ms",
                MAX_TICK_INTERVAL_MS, self.tick_interval_ms
            )));
        }
        if self.stage_pause_ms > MAX_STAGE_PAUSE_MS {
            return Err(SimError::Configuration(format!(
                "stage pause {}ms exceeds maximum {}ms",
                self.stage_pause_ms, MAX_STAGE_PAUSE_MS
            )));
        }
        Ok(())
    }
}

// =============================================================================
// RUN PLAN
// =============================================================================

/// Everything needed to start a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub agent: AgentId,
    pub catalog: StageCatalog,
    pub selection: Selection,
}

impl RunPlan {
    /// Create a run plan.
    #[must_use]
    pub fn new(agent: AgentId, catalog: StageCatalog, selection: Selection) -> Self {
        Self {
            agent,
            catalog,
            selection,
        }
    }
}

// =============================================================================
// OBSERVER
// =============================================================================

/// Presentation-layer seam.
///
/// For each run the observer sees any number of `on_progress` calls followed
/// by at most one of `on_completed` / `on_failed`. A superseded or cancelled
/// run produces no terminal call at all.
pub trait RunObserver {
    /// Called on run start, on every tick, and on cancellation.
    fn on_progress(&mut self, snapshot: &RunSnapshot);

    /// Called once when the run completes.
    fn on_completed(&mut self, snapshot: &RunSnapshot, payload: &ResultPayload);

    /// Called once when the run fails.
    fn on_failed(&mut self, snapshot: &RunSnapshot, error: &SimError);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_progress(&mut self, _snapshot: &RunSnapshot) {}

    fn on_completed(&mut self, _snapshot: &RunSnapshot, _payload: &ResultPayload) {}

    fn on_failed(&mut self, _snapshot: &RunSnapshot, _error: &SimError) {}
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Counters accumulated across all runs of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencerStats {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    /// Runs that were still running when superseded or cancelled.
    pub runs_cancelled: u64,
    pub ticks: u64,
    /// Timers that fired for a run that was no longer current and running.
    pub discarded_timers: u64,
}

// =============================================================================
// SEQUENCER
// =============================================================================

#[derive(Debug)]
struct CurrentRun {
    state: RunState,
    plan: RunPlan,
    interpolation: StageInterpolation,
}

/// The staged progress state machine.
#[derive(Debug)]
pub struct Sequencer<D, O> {
    config: SequencerConfig,
    datasets: D,
    observer: O,
    generation: Generation,
    current: Option<CurrentRun>,
    timers: TimerQueue,
    publisher: ResultPublisher,
    payload: Option<ResultPayload>,
    stats: SequencerStats,
    /// Latest virtual time seen by the sequencer.
    clock_ms: u64,
}

impl<D: DatasetProvider, O: RunObserver> Sequencer<D, O> {
    /// Create an idle sequencer.
    pub fn new(config: SequencerConfig, datasets: D, observer: O) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            datasets,
            observer,
            generation: Generation::INITIAL,
            current: None,
            timers: TimerQueue::new(),
            publisher: ResultPublisher::new(),
            payload: None,
            stats: SequencerStats::default(),
            clock_ms: 0,
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Timing settings.
    #[must_use]
    pub fn config(&self) -> SequencerConfig {
        self.config
    }

    /// Generation of the current (or most recent) run.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Dataset provider.
    #[must_use]
    pub fn datasets(&self) -> &D {
        &self.datasets
    }

    /// Observer.
    #[must_use]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// State of the current run, if any.
    #[must_use]
    pub fn run_state(&self) -> Option<&RunState> {
        self.current.as_ref().map(|run| &run.state)
    }

    /// Check whether a run is playing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state().is_some_and(RunState::is_running)
    }

    /// Payload of the current run, once completed.
    #[must_use]
    pub fn payload(&self) -> Option<&ResultPayload> {
        self.payload.as_ref()
    }

    /// Accumulated counters.
    #[must_use]
    pub fn stats(&self) -> SequencerStats {
        self.stats
    }

    /// Due time of the earliest pending timer, stale ones included.
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    /// Number of pending timers, stale ones included.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Snapshot of the current run, measured at `now_ms`.
    #[must_use]
    pub fn snapshot_at(&self, now_ms: u64) -> RunSnapshot {
        match &self.current {
            Some(run) => Self::snapshot_of(run, now_ms),
            None => RunSnapshot::idle(self.generation),
        }
    }

    /// Snapshot of the current run at the latest virtual time seen.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.snapshot_at(self.clock_ms)
    }

    /// Latest virtual time passed to `start`, `advance_to` or `fail`.
    #[must_use]
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    fn snapshot_of(run: &CurrentRun, now_ms: u64) -> RunSnapshot {
        let state = &run.state;
        RunSnapshot {
            generation: state.generation(),
            agent: Some(state.agent().clone()),
            status: state.status(),
            stage_index: state.stage_index(),
            stage_count: run.plan.catalog.stage_count(),
            stage_label: run
                .plan
                .catalog
                .stage_at(state.stage_index())
                .map(|s| s.label.clone()),
            progress: state.progress(),
            elapsed_ms: state.elapsed_ms(now_ms),
            error: state.error().map(str::to_string),
        }
    }

    // =========================================================================
    // RUN CONTROL
    // =========================================================================

    /// Start a new run at `now_ms`, superseding any run in flight.
    ///
    /// Fails without touching the current run if the plan's agent has no
    /// dataset.
    pub fn start(&mut self, plan: RunPlan, now_ms: u64) -> Result<Generation, SimError> {
        self.datasets.records(&plan.agent)?;
        let first_stage = plan.catalog.stage_at(0).map(|s| (s.target, s.duration_ms));
        let Some((target, duration_ms)) = first_stage else {
            return Err(SimError::Configuration("stage catalog is empty".into()));
        };
        let Some(generation) = self.generation.next() else {
            return Err(SimError::Configuration("generation counter exhausted".into()));
        };

        if self.is_running() {
            self.stats.runs_cancelled = self.stats.runs_cancelled.saturating_add(1);
        }

        self.generation = generation;
        self.clock_ms = self.clock_ms.max(now_ms);

        let run = CurrentRun {
            state: RunState::start(generation, plan.agent.clone(), now_ms),
            interpolation: StageInterpolation::new(plan.catalog.start_of(0), target, duration_ms),
            plan,
        };
        self.current = Some(run);
        self.payload = None;
        self.stats.runs_started = self.stats.runs_started.saturating_add(1);

        self.timers.schedule(
            now_ms.saturating_add(self.config.tick_interval_ms),
            generation,
            TimerKind::Tick,
        );

        let snapshot = self.snapshot_at(now_ms);
        self.observer.on_progress(&snapshot);

        Ok(generation)
    }

    /// Cancel the current run without starting another.
    ///
    /// Returns the generation that was cancelled, if a run was playing.
    /// The cancelled run produces no terminal signal.
    pub fn cancel(&mut self) -> Option<Generation> {
        let run = self.current.take()?;
        self.payload = None;
        let cancelled = run.state.is_running().then(|| run.state.generation());
        if cancelled.is_some() {
            self.stats.runs_cancelled = self.stats.runs_cancelled.saturating_add(1);
        }
        let snapshot = RunSnapshot::idle(self.generation);
        self.observer.on_progress(&snapshot);
        cancelled
    }

    /// Signal that the operation behind run `generation` failed.
    ///
    /// The run moves to Failed, its result stays unset and the observer gets
    /// exactly one `on_failed`.
    pub fn fail(
        &mut self,
        generation: Generation,
        message: impl Into<String>,
        now_ms: u64,
    ) -> Result<(), SimError> {
        if generation != self.generation {
            return Err(SimError::StaleGeneration {
                expected: self.generation,
                got: generation,
            });
        }
        match &self.current {
            Some(run) if run.state.is_running() => {}
            _ => return Err(SimError::NoActiveRun),
        }

        self.clock_ms = self.clock_ms.max(now_ms);
        let error = SimError::OperationFailed(message.into());
        self.finish_failed(&error, now_ms);
        Ok(())
    }

    // =========================================================================
    // SCHEDULER LOOP
    // =========================================================================

    /// Fire every timer due at or before `now_ms`.
    ///
    /// Returns the number of timers that changed the current run.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let mut fired = 0usize;
        while let Some(timer) = self.timers.pop_due(now_ms) {
            if !self.accepts(&timer) {
                self.stats.discarded_timers = self.stats.discarded_timers.saturating_add(1);
                continue;
            }
            match timer.kind {
                TimerKind::Tick => self.on_tick(timer.due_ms),
                TimerKind::StageAdvance => self.on_stage_advance(timer.due_ms),
            }
            fired = fired.saturating_add(1);
        }
        self.clock_ms = self.clock_ms.max(now_ms);
        fired
    }

    /// Fire timers until none remain. Returns the virtual time reached.
    ///
    /// Every run terminates, so this always returns.
    pub fn fast_forward(&mut self) -> u64 {
        let mut now = self.next_due_ms().unwrap_or(0);
        while let Some(due) = self.next_due_ms() {
            now = due;
            self.advance_to(due);
        }
        now
    }

    /// A timer may act only on the current generation while it is running.
    fn accepts(&self, timer: &Timer) -> bool {
        timer.generation == self.generation && self.is_running()
    }

    fn on_tick(&mut self, at_ms: u64) {
        let Some(run) = self.current.as_mut() else {
            return;
        };
        let elapsed = at_ms.saturating_sub(run.state.stage_started_at_ms());
        let progress = run.interpolation.sample(elapsed);
        run.state.record_progress(progress);
        let stage_done = run.interpolation.is_complete();
        let generation = run.state.generation();
        self.stats.ticks = self.stats.ticks.saturating_add(1);

        let snapshot = self.snapshot_at(at_ms);
        self.observer.on_progress(&snapshot);

        if stage_done {
            self.timers.schedule(
                at_ms.saturating_add(self.config.stage_pause_ms),
                generation,
                TimerKind::StageAdvance,
            );
        } else {
            self.timers.schedule(
                at_ms.saturating_add(self.config.tick_interval_ms),
                generation,
                TimerKind::Tick,
            );
        }
    }

    fn on_stage_advance(&mut self, at_ms: u64) {
        let Some(run) = self.current.as_mut() else {
            return;
        };
        let index = run.state.stage_index();
        if run.plan.catalog.is_last(index) {
            self.finish_completed(at_ms);
            return;
        }

        let next = index.saturating_add(1);
        let Some(stage) = run.plan.catalog.stage_at(next) else {
            self.finish_completed(at_ms);
            return;
        };
        run.interpolation =
            StageInterpolation::new(run.plan.catalog.start_of(next), stage.target, stage.duration_ms);
        run.state.advance_stage(at_ms);
        let generation = run.state.generation();

        self.timers.schedule(
            at_ms.saturating_add(self.config.tick_interval_ms),
            generation,
            TimerKind::Tick,
        );
    }

    fn finish_completed(&mut self, at_ms: u64) {
        let Some(run) = self.current.as_mut() else {
            return;
        };
        let published = self.publisher.publish(
            run.state.generation(),
            &run.plan.agent,
            &run.plan.selection,
            &self.datasets,
        );

        match published {
            Ok(Some(payload)) => {
                run.state.complete(at_ms);
                self.stats.runs_completed = self.stats.runs_completed.saturating_add(1);
                let snapshot = self.snapshot_at(at_ms);
                self.observer.on_completed(&snapshot, &payload);
                self.payload = Some(payload);
            }
            Ok(None) => {
                // Already published for this generation; nothing to deliver.
                run.state.complete(at_ms);
            }
            Err(e) => {
                let error = SimError::OperationFailed(format!("result publication failed: {}", e));
                self.finish_failed(&error, at_ms);
            }
        }
    }

    fn finish_failed(&mut self, error: &SimError, at_ms: u64) {
        let Some(run) = self.current.as_mut() else {
            return;
        };
        run.state.fail(error.to_string(), at_ms);
        self.payload = None;
        self.stats.runs_failed = self.stats.runs_failed.saturating_add(1);
        let snapshot = self.snapshot_at(at_ms);
        self.observer.on_failed(&snapshot, error);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{Record, StaticDatasets};
    use crate::{Progress, RunStatus};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    struct Recorder {
        progress: Vec<RunSnapshot>,
        completed: Vec<(RunSnapshot, ResultPayload)>,
        failed: Vec<(RunSnapshot, SimError)>,
    }

    impl RunObserver for Recorder {
        fn on_progress(&mut self, snapshot: &RunSnapshot) {
            self.progress.push(snapshot.clone());
        }

        fn on_completed(&mut self, snapshot: &RunSnapshot, payload: &ResultPayload) {
            self.completed.push((snapshot.clone(), payload.clone()));
        }

        fn on_failed(&mut self, snapshot: &RunSnapshot, error: &SimError) {
            self.failed.push((snapshot.clone(), error.clone()));
        }
    }

    fn datasets() -> StaticDatasets {
        let mut datasets = StaticDatasets::new();
        datasets.insert(
            AgentId::new("reconciliation"),
            vec![Record {
                id: "r1".into(),
                entity: "ACC-1".into(),
                category: "matched".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date"),
                amount_cents: 12_500,
                attributes: BTreeMap::new(),
            }],
        );
        datasets
    }

    fn plan() -> RunPlan {
        let catalog = StageCatalog::from_percent_steps(&[
            ("Reading statements", 30, 100),
            ("Matching entries", 70, 100),
            ("Summarizing", 100, 100),
        ])
        .expect("valid catalog");
        RunPlan::new(AgentId::new("reconciliation"), catalog, Selection::all())
    }

    fn sequencer() -> Sequencer<StaticDatasets, Recorder> {
        Sequencer::new(SequencerConfig::default(), datasets(), Recorder::default())
            .expect("valid config")
    }

    #[test]
    fn completes_within_350ms() {
        let mut seq = sequencer();
        seq.start(plan(), 0).expect("start");
        seq.advance_to(350);

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.status, RunStatus::Completed);
        assert_eq!(snapshot.progress, Progress::COMPLETE);
        assert_eq!(seq.observer().completed.len(), 1);
        assert!(seq.payload().is_some());
    }

    #[test]
    fn start_publishes_zero_progress() {
        let mut seq = sequencer();
        let generation = seq.start(plan(), 0).expect("start");
        let first = seq.observer().progress.first().expect("initial snapshot");
        assert_eq!(first.generation, generation);
        assert_eq!(first.status, RunStatus::Running);
        assert_eq!(first.progress, Progress::ZERO);
    }

    #[test]
    fn interpolates_between_ticks() {
        let config = SequencerConfig {
            tick_interval_ms: 25,
            stage_pause_ms: 0,
        };
        let mut seq = Sequencer::new(config, datasets(), Recorder::default()).expect("config");
        seq.start(plan(), 0).expect("start");
        seq.advance_to(50);
        assert_eq!(seq.snapshot().progress, Progress::from_percent(15).expect("valid"));
        assert_eq!(seq.snapshot().stage_index, 0);
    }

    #[test]
    fn pause_delays_next_stage() {
        let config = SequencerConfig {
            tick_interval_ms: 100,
            stage_pause_ms: 500,
        };
        let mut seq = Sequencer::new(config, datasets(), Recorder::default()).expect("config");
        seq.start(plan(), 0).expect("start");
        seq.advance_to(599);
        assert_eq!(seq.snapshot().stage_index, 0);
        seq.advance_to(600);
        assert_eq!(seq.snapshot().stage_index, 1);
    }

    #[test]
    fn coarse_and_fine_advancement_agree() {
        let mut coarse = sequencer();
        let mut fine = sequencer();
        coarse.start(plan(), 0).expect("start");
        fine.start(plan(), 0).expect("start");

        coarse.advance_to(1_000);
        for now in 0..=1_000 {
            fine.advance_to(now);
        }

        let a: Vec<_> = coarse.observer().progress.iter().map(|s| s.progress).collect();
        let b: Vec<_> = fine.observer().progress.iter().map(|s| s.progress).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn superseded_run_timers_are_discarded() {
        let mut seq = sequencer();
        let first = seq.start(plan(), 0).expect("start");
        seq.advance_to(50);
        let second = seq.start(plan(), 50).expect("restart");
        assert!(second > first);

        // The first run's tick at 100ms fires but must not touch run two.
        seq.advance_to(100);
        assert_eq!(seq.stats().discarded_timers, 1);
        let snapshot = seq.snapshot();
        assert_eq!(snapshot.generation, second);
        assert_eq!(snapshot.progress, Progress::ZERO);

        seq.fast_forward();
        assert_eq!(seq.observer().completed.len(), 1);
        assert_eq!(seq.observer().completed[0].1.generation, second);
        assert_eq!(seq.stats().runs_cancelled, 1);
    }

    #[test]
    fn double_start_yields_one_terminal_signal() {
        let mut seq = sequencer();
        seq.start(plan(), 0).expect("start");
        seq.start(plan(), 0).expect("start again");
        seq.fast_forward();

        let observer = seq.observer();
        assert_eq!(observer.completed.len() + observer.failed.len(), 1);
    }

    #[test]
    fn fail_moves_to_failed_without_payload() {
        let mut seq = sequencer();
        let generation = seq.start(plan(), 0).expect("start");
        seq.advance_to(150);
        seq.fail(generation, "bank feed timed out", 150).expect("fail");

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.status, RunStatus::Failed);
        assert!(seq.payload().is_none());
        assert_eq!(seq.observer().failed.len(), 1);

        seq.fast_forward();
        assert!(seq.observer().completed.is_empty());
        assert_eq!(seq.observer().failed.len(), 1);
    }

    #[test]
    fn fail_with_stale_generation_is_rejected() {
        let mut seq = sequencer();
        let first = seq.start(plan(), 0).expect("start");
        seq.start(plan(), 10).expect("restart");
        let result = seq.fail(first, "late error", 20);
        assert!(matches!(result, Err(SimError::StaleGeneration { .. })));
        assert!(seq.is_running());
    }

    #[test]
    fn fail_after_completion_is_rejected() {
        let mut seq = sequencer();
        let generation = seq.start(plan(), 0).expect("start");
        seq.fast_forward();
        assert!(matches!(
            seq.fail(generation, "too late", 1_000),
            Err(SimError::NoActiveRun)
        ));
    }

    #[test]
    fn cancel_returns_to_idle_silently() {
        let mut seq = sequencer();
        let generation = seq.start(plan(), 0).expect("start");
        assert_eq!(seq.cancel(), Some(generation));
        assert_eq!(seq.snapshot().status, RunStatus::Idle);

        seq.fast_forward();
        assert!(seq.observer().completed.is_empty());
        assert!(seq.observer().failed.is_empty());
        assert_eq!(seq.stats().discarded_timers, 1);
    }

    #[test]
    fn unknown_agent_does_not_start() {
        let mut seq = sequencer();
        let mut bad = plan();
        bad.agent = AgentId::new("payroll");
        assert!(matches!(seq.start(bad, 0), Err(SimError::UnknownAgent(_))));
        assert_eq!(seq.generation(), Generation::INITIAL);
        assert_eq!(seq.snapshot().status, RunStatus::Idle);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SequencerConfig {
            tick_interval_ms: 0,
            stage_pause_ms: 0,
        };
        assert!(matches!(
            Sequencer::new(config, datasets(), NullObserver),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn config_upper_bounds_rejected() {
        let slow_tick = SequencerConfig {
            tick_interval_ms: MAX_TICK_INTERVAL_MS + 1,
            stage_pause_ms: 0,
        };
        assert!(matches!(slow_tick.validate(), Err(SimError::Configuration(_))));

        let long_pause = SequencerConfig {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            stage_pause_ms: MAX_STAGE_PAUSE_MS + 1,
        };
        assert!(matches!(long_pause.validate(), Err(SimError::Configuration(_))));

        let at_limits = SequencerConfig {
            tick_interval_ms: MAX_TICK_INTERVAL_MS,
            stage_pause_ms: MAX_STAGE_PAUSE_MS,
        };
        assert!(at_limits.validate().is_ok());
    }

    #[test]
    fn exhausted_generation_refuses_to_start() {
        let mut seq = sequencer();
        seq.generation = Generation(u64::MAX - 1);

        let last = seq.start(plan(), 0).expect("last generation");
        assert_eq!(last, Generation(u64::MAX));

        assert!(matches!(seq.start(plan(), 50), Err(SimError::Configuration(_))));
        assert_eq!(seq.generation(), Generation(u64::MAX));
        assert_eq!(seq.stats().runs_started, 1);

        seq.advance_to(350);
        assert_eq!(seq.snapshot().status, RunStatus::Completed);
        assert_eq!(seq.observer().completed.len(), 1);
        assert!(seq.payload().is_some());
    }
}
