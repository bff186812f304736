//! # Property-Based Tests
//!
//! Invariants of the interpolator and the sequencer, checked with proptest.

use agentdeck_core::{
    AgentId, NullObserver, Progress, Record, RunPlan, RunStatus, Selection, Sequencer,
    SequencerConfig, StageCatalog, StageDescriptor, StaticDatasets, interpolate,
};
use chrono::NaiveDate;
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn datasets() -> StaticDatasets {
    let mut datasets = StaticDatasets::new();
    datasets.insert(
        AgentId::new("pricing"),
        vec![Record {
            id: "p1".into(),
            entity: "SKU-1".into(),
            category: "beverages".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            amount_cents: 299,
            attributes: BTreeMap::new(),
        }],
    );
    datasets
}

/// Build a valid catalog from arbitrary increments and durations.
fn catalog_from(increments: &[u16], durations: &[u64]) -> StageCatalog {
    let total: u32 = increments.iter().map(|&i| u32::from(i)).sum();
    let mut acc = 0u32;
    let mut stages = Vec::new();
    for (i, (&inc, &duration)) in increments.iter().zip(durations).enumerate() {
        acc += u32::from(inc);
        // Scale cumulative increments onto 1..=10_000, strictly increasing.
        let bp = ((acc * 10_000) / total).max(i as u32 + 1);
        stages.push(StageDescriptor::new(
            format!("stage {}", i),
            Progress::from_basis_points(bp as u16).expect("in range"),
            duration,
        ));
    }
    if let Some(last) = stages.last_mut() {
        last.target = Progress::COMPLETE;
    }
    StageCatalog::new(stages).expect("valid catalog")
}

proptest! {
    /// Interpolation never exceeds the target and never decreases with time.
    #[test]
    fn interpolation_monotonic_and_bounded(
        start in 0u16..5_000,
        span in 1u16..5_000,
        duration in 0u64..5_000,
        mut elapsed in vec(0u64..10_000, 1..40)
    ) {
        let start_p = Progress::from_basis_points(start).expect("valid");
        let target = Progress::from_basis_points(start + span).expect("valid");
        elapsed.sort_unstable();

        let mut previous = start_p;
        for e in elapsed {
            let p = interpolate(start_p, target, duration, e);
            prop_assert!(p <= target);
            prop_assert!(p >= previous);
            previous = p;
        }
    }

    /// Any valid catalog runs to Completed at exactly 100%.
    #[test]
    fn every_valid_catalog_completes(
        increments in vec(1u16..100, 1..8),
        durations in vec(0u64..1_000, 8),
        tick in 1u64..250,
        pause in 0u64..300
    ) {
        let catalog = catalog_from(&increments, &durations);
        let config = SequencerConfig { tick_interval_ms: tick, stage_pause_ms: pause };
        let mut seq = Sequencer::new(config, datasets(), NullObserver).expect("config");
        seq.start(RunPlan::new(AgentId::new("pricing"), catalog, Selection::all()), 0)
            .expect("start");
        seq.fast_forward();

        let snapshot = seq.snapshot();
        prop_assert_eq!(snapshot.status, RunStatus::Completed);
        prop_assert_eq!(snapshot.progress, Progress::COMPLETE);
        prop_assert_eq!(seq.stats().runs_completed, 1);
    }

    /// Progress observed across a run never decreases and stage indices only grow.
    #[test]
    fn run_progress_is_ordered(
        increments in vec(1u16..100, 1..6),
        durations in vec(0u64..600, 6),
        steps in vec(1u64..150, 1..60)
    ) {
        let catalog = catalog_from(&increments, &durations);
        let mut seq = Sequencer::new(SequencerConfig::default(), datasets(), NullObserver)
            .expect("config");
        seq.start(RunPlan::new(AgentId::new("pricing"), catalog, Selection::all()), 0)
            .expect("start");

        let mut now = 0u64;
        let mut last = seq.snapshot();
        for step in steps {
            now += step;
            seq.advance_to(now);
            let snapshot = seq.snapshot();
            prop_assert!(snapshot.progress >= last.progress);
            prop_assert!(snapshot.stage_index >= last.stage_index);
            last = snapshot;
        }
    }

    /// Restarting at arbitrary instants leaves only the newest run alive.
    #[test]
    fn restarts_leave_one_live_run(restart_times in vec(0u64..250, 1..6)) {
        let catalog = StageCatalog::from_percent_steps(&[("a", 30, 100), ("b", 70, 100), ("c", 100, 100)])
            .expect("valid");
        let mut seq = Sequencer::new(SequencerConfig::default(), datasets(), NullObserver)
            .expect("config");

        let mut sorted = restart_times;
        sorted.sort_unstable();
        let mut latest = None;
        for t in sorted {
            seq.advance_to(t);
            latest = Some(
                seq.start(RunPlan::new(AgentId::new("pricing"), catalog.clone(), Selection::all()), t)
                    .expect("start"),
            );
        }
        seq.fast_forward();

        prop_assert_eq!(Some(seq.snapshot().generation), latest);
        prop_assert_eq!(seq.stats().runs_completed, 1);
        prop_assert_eq!(seq.payload().map(|p| p.generation), latest);
    }
}
