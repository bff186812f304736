//! # Real-Time Engine
//!
//! Drives the core [`Sequencer`] with a tokio clock.
//!
//! ```text
//!   HTTP / CLI ──start/cancel/fail──▶ Engine ──lock──▶ Sequencer
//!                                       │                  │
//!                                  driver task        WatchObserver
//!                              (sleep until next due)      │
//!                                                     watch channel ──▶ subscribers
//! ```
//!
//! Virtual time is milliseconds since the engine was created, read from
//! `tokio::time::Instant` so that tests can run under a paused clock.

use crate::config::{AppConfig, Scenarios};
use crate::error::AppError;
use crate::fixtures::load_datasets;
use agentdeck_core::{
    AgentId, Generation, ResultPayload, RunObserver, RunPlan, RunSnapshot, RunStatus, Selection,
    Sequencer, SequencerConfig, SequencerStats, SimError, StaticDatasets,
};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Datasets shared between the engine and the sequencer.
pub type SharedDatasets = Arc<StaticDatasets>;

type EngineSequencer = Sequencer<SharedDatasets, WatchObserver>;

// =============================================================================
// OBSERVER
// =============================================================================

/// Publishes every snapshot on a watch channel and logs terminal events.
#[derive(Debug)]
pub struct WatchObserver {
    tx: watch::Sender<RunSnapshot>,
}

impl WatchObserver {
    #[must_use]
    pub fn new(tx: watch::Sender<RunSnapshot>) -> Self {
        Self { tx }
    }
}

impl RunObserver for WatchObserver {
    fn on_progress(&mut self, snapshot: &RunSnapshot) {
        tracing::trace!(
            "Run {} stage {}/{} at {}",
            snapshot.generation,
            snapshot.stage_index + 1,
            snapshot.stage_count,
            snapshot.progress
        );
        self.tx.send_replace(snapshot.clone());
    }

    fn on_completed(&mut self, snapshot: &RunSnapshot, payload: &ResultPayload) {
        tracing::info!(
            "Run {} completed for agent '{}' in {}ms: {} records{}",
            snapshot.generation,
            payload.agent,
            snapshot.elapsed_ms,
            payload.len(),
            if payload.unfiltered { " (unfiltered)" } else { "" }
        );
        self.tx.send_replace(snapshot.clone());
    }

    fn on_failed(&mut self, snapshot: &RunSnapshot, error: &SimError) {
        tracing::warn!("Run {} failed: {}", snapshot.generation, error);
        self.tx.send_replace(snapshot.clone());
    }
}

// =============================================================================
// ENGINE
// =============================================================================

struct Inner {
    sequencer: Mutex<EngineSequencer>,
    scenarios: Scenarios,
    datasets: SharedDatasets,
    epoch: Instant,
    wake: Notify,
    snapshots: watch::Receiver<RunSnapshot>,
}

/// Cloneable handle to the single shared sequencer.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("agents", &self.inner.scenarios.len())
            .finish()
    }
}

impl Engine {
    /// Create an idle engine. The driver is not started.
    pub fn new(
        config: SequencerConfig,
        scenarios: Scenarios,
        datasets: SharedDatasets,
    ) -> Result<Self, AppError> {
        let (tx, rx) = watch::channel(RunSnapshot::idle(Generation::INITIAL));
        let sequencer = Sequencer::new(config, Arc::clone(&datasets), WatchObserver::new(tx))?;
        Ok(Self {
            inner: Arc::new(Inner {
                sequencer: Mutex::new(sequencer),
                scenarios,
                datasets,
                epoch: Instant::now(),
                wake: Notify::new(),
                snapshots: rx,
            }),
        })
    }

    /// Build an engine from a loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let scenarios = config.scenarios()?;
        let datasets = load_datasets(config)?;
        Self::new(config.sequencer, scenarios, Arc::new(datasets))
    }

    /// Configured agents.
    #[must_use]
    pub fn scenarios(&self) -> &Scenarios {
        &self.inner.scenarios
    }

    /// Static datasets of all agents.
    #[must_use]
    pub fn datasets(&self) -> &StaticDatasets {
        &self.inner.datasets
    }

    /// Milliseconds since the engine was created.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.inner.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Receive every snapshot the sequencer publishes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.inner.snapshots.clone()
    }

    /// Lock the sequencer, bring it up to the current time, and run `f`.
    async fn with_sequencer<R>(&self, f: impl FnOnce(&mut EngineSequencer, u64) -> R) -> R {
        let mut sequencer = self.inner.sequencer.lock().await;
        let now = self.now_ms();
        sequencer.advance_to(now);
        f(&mut sequencer, now)
    }

    // =========================================================================
    // RUN CONTROL
    // =========================================================================

    /// Start a run for `agent`, superseding any run in progress.
    pub async fn start_run(
        &self,
        agent: &AgentId,
        selection: Selection,
    ) -> Result<RunSnapshot, AppError> {
        let scenario = self.inner.scenarios.get(agent)?;
        let plan = RunPlan::new(scenario.id.clone(), scenario.catalog.clone(), selection);

        let snapshot = self
            .with_sequencer(|seq, now| {
                let superseded = seq.is_running().then(|| seq.generation());
                let generation = seq.start(plan, now)?;
                if let Some(old) = superseded {
                    tracing::info!("Run {} superseded by run {}", old, generation);
                }
                tracing::info!("Run {} started for agent '{}'", generation, agent);
                Ok::<_, SimError>(seq.snapshot_at(now))
            })
            .await?;

        self.inner.wake.notify_one();
        Ok(snapshot)
    }

    /// Cancel the run in progress. Returns its generation, if one was running.
    pub async fn cancel(&self) -> Option<Generation> {
        let cancelled = self.with_sequencer(|seq, _| seq.cancel()).await;
        if let Some(generation) = cancelled {
            tracing::info!("Run {} cancelled", generation);
        }
        cancelled
    }

    /// Fail the run in progress with an explicit error.
    pub async fn fail(
        &self,
        generation: Generation,
        message: String,
    ) -> Result<RunSnapshot, AppError> {
        let snapshot = self
            .with_sequencer(|seq, now| {
                seq.fail(generation, message, now)?;
                Ok::<_, SimError>(seq.snapshot_at(now))
            })
            .await?;
        Ok(snapshot)
    }

    /// Snapshot of the current run.
    pub async fn snapshot(&self) -> RunSnapshot {
        self.with_sequencer(|seq, now| seq.snapshot_at(now)).await
    }

    /// Result payload of the current run, once completed.
    pub async fn result(&self) -> Option<ResultPayload> {
        self.with_sequencer(|seq, _| seq.payload().cloned()).await
    }

    /// Counters accumulated since startup.
    pub async fn stats(&self) -> SequencerStats {
        self.with_sequencer(|seq, _| seq.stats()).await
    }

    // =========================================================================
    // DRIVER
    // =========================================================================

    /// Spawn the task that fires timers as they fall due.
    pub fn spawn_driver(&self) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move { engine.drive().await })
    }

    async fn drive(&self) {
        tracing::debug!("Sequencer driver started");
        loop {
            let next_due = self.with_sequencer(|seq, _| seq.next_due_ms()).await;
            match next_due {
                Some(due) => {
                    let deadline = self.inner.epoch + Duration::from_millis(due);
                    tokio::select! {
                        () = tokio::time::sleep_until(deadline) => {}
                        () = self.inner.wake.notified() => {}
                    }
                }
                None => self.inner.wake.notified().await,
            }
        }
    }

    /// Wait until run `generation` stops running.
    ///
    /// `on_snapshot` sees every observed snapshot of that run. Returns the
    /// last snapshot seen: terminal, idle after a cancel, or the snapshot of
    /// a newer run that superseded it.
    pub async fn wait_for_end<F>(&self, generation: Generation, mut on_snapshot: F) -> RunSnapshot
    where
        F: FnMut(&RunSnapshot),
    {
        let mut rx = self.subscribe();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.generation == generation {
                on_snapshot(&snapshot);
            }
            if snapshot.generation != generation || snapshot.status != RunStatus::Running {
                return snapshot;
            }
            if rx.changed().await.is_err() {
                return snapshot;
            }
        }
    }
}
