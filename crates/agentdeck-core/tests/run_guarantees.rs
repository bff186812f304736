//! # Run Guarantees (G0-G3)
//!
//! End-to-end guarantees of the simulator, exercised through the public API.
//!
//! ## Tiers
//! - G0: Catalog integrity
//! - G1: Completion
//! - G2: Supersession and cancellation
//! - G3: Result selection

use agentdeck_core::{
    AgentId, DateRange, Progress, Record, ResultPayload, RunObserver, RunPlan, RunSnapshot,
    RunStatus, Selection, Sequencer, SequencerConfig, SimError, StageCatalog, StaticDatasets,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

// =============================================================================
// HELPERS
// =============================================================================

#[derive(Debug, Default)]
struct Terminals {
    ticks: usize,
    completed: Vec<ResultPayload>,
    failed: Vec<SimError>,
}

impl RunObserver for Terminals {
    fn on_progress(&mut self, _snapshot: &RunSnapshot) {
        self.ticks += 1;
    }

    fn on_completed(&mut self, _snapshot: &RunSnapshot, payload: &ResultPayload) {
        self.completed.push(payload.clone());
    }

    fn on_failed(&mut self, _snapshot: &RunSnapshot, error: &SimError) {
        self.failed.push(error.clone());
    }
}

fn trip(id: &str, unit: &str, category: &str, day: u32) -> Record {
    Record {
        id: id.into(),
        entity: unit.into(),
        category: category.into(),
        date: NaiveDate::from_ymd_opt(2024, 6, day).expect("valid date"),
        amount_cents: 4_200,
        attributes: BTreeMap::new(),
    }
}

fn logistics() -> StaticDatasets {
    let mut datasets = StaticDatasets::new();
    datasets.insert(
        AgentId::new("logistics"),
        vec![
            trip("T-1", "VAN-07", "urban", 3),
            trip("T-2", "VAN-07", "regional", 11),
            trip("T-3", "TRK-12", "regional", 19),
        ],
    );
    datasets
}

fn three_stage_catalog() -> StageCatalog {
    StageCatalog::from_percent_steps(&[
        ("Loading trips", 30, 100),
        ("Optimizing routes", 70, 100),
        ("Building report", 100, 100),
    ])
    .expect("valid catalog")
}

fn sequencer() -> Sequencer<StaticDatasets, Terminals> {
    Sequencer::new(SequencerConfig::default(), logistics(), Terminals::default())
        .expect("valid config")
}

fn plan(selection: Selection) -> RunPlan {
    RunPlan::new(AgentId::new("logistics"), three_stage_catalog(), selection)
}

// =============================================================================
// TIER G0: CATALOG INTEGRITY
// =============================================================================

mod g0_catalog_integrity {
    use super::*;

    /// G0.1: An empty catalog is a configuration error.
    #[test]
    fn empty_catalog_is_configuration_error() {
        assert!(matches!(
            StageCatalog::new(Vec::new()),
            Err(SimError::Configuration(_))
        ));
    }

    /// G0.2: Decreasing targets are a configuration error.
    #[test]
    fn decreasing_targets_rejected() {
        let result = StageCatalog::from_percent_steps(&[("a", 60, 10), ("b", 40, 10), ("c", 100, 10)]);
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    /// G0.3: Catalogs round-trip through their serialized form with validation.
    #[test]
    fn catalog_deserialization_validates() {
        let stages: Vec<agentdeck_core::StageDescriptor> = three_stage_catalog().into();
        let rebuilt = StageCatalog::try_from(stages).expect("still valid");
        assert_eq!(rebuilt, three_stage_catalog());
    }
}

// =============================================================================
// TIER G1: COMPLETION
// =============================================================================

mod g1_completion {
    use super::*;

    /// G1.1: The reference catalog completes by 350ms.
    #[test]
    fn reference_catalog_completes_by_350ms() {
        let mut seq = sequencer();
        seq.start(plan(Selection::all()), 0).expect("start");
        seq.advance_to(350);

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.status, RunStatus::Completed);
        assert_eq!(snapshot.progress, Progress::COMPLETE);
        assert_eq!(snapshot.percent(), 100);
    }

    /// G1.2: Not complete before the last stage's duration has elapsed.
    #[test]
    fn not_complete_at_250ms() {
        let mut seq = sequencer();
        seq.start(plan(Selection::all()), 0).expect("start");
        seq.advance_to(250);

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.status, RunStatus::Running);
        assert_eq!(snapshot.stage_index, 2);
        assert_eq!(snapshot.progress, Progress::from_percent(70).expect("valid"));
    }

    /// G1.3: A completed run emits exactly one terminal signal.
    #[test]
    fn exactly_one_completion() {
        let mut seq = sequencer();
        seq.start(plan(Selection::all()), 0).expect("start");
        seq.advance_to(350);
        seq.advance_to(10_000);

        assert_eq!(seq.observer().completed.len(), 1);
        assert!(seq.observer().failed.is_empty());
    }
}

// =============================================================================
// TIER G2: SUPERSESSION AND CANCELLATION
// =============================================================================

mod g2_supersession {
    use super::*;

    /// G2.1: Two immediate starts deliver exactly one terminal signal.
    #[test]
    fn double_start_single_terminal() {
        let mut seq = sequencer();
        let first = seq.start(plan(Selection::all()), 0).expect("first");
        let second = seq.start(plan(Selection::all()), 0).expect("second");
        assert_ne!(first, second);

        seq.fast_forward();
        let observer = seq.observer();
        assert_eq!(observer.completed.len() + observer.failed.len(), 1);
        assert_eq!(observer.completed[0].generation, second);
    }

    /// G2.2: Late timers of a superseded run never reach the new run.
    #[test]
    fn stale_timers_do_not_mutate_new_run() {
        let mut seq = sequencer();
        seq.start(plan(Selection::all()), 0).expect("first");
        seq.advance_to(120);
        let second = seq.start(plan(Selection::all()), 120).expect("second");

        // First run would have ticked at 200; second run ticks at 220.
        seq.advance_to(210);
        let snapshot = seq.snapshot();
        assert_eq!(snapshot.generation, second);
        assert_eq!(snapshot.stage_index, 0);
        assert_eq!(snapshot.progress, Progress::ZERO);
        assert!(seq.stats().discarded_timers >= 1);
    }

    /// G2.3: Failure is reachable only through an explicit error signal.
    #[test]
    fn explicit_failure_surfaces_once() {
        let mut seq = sequencer();
        let generation = seq.start(plan(Selection::all()), 0).expect("start");
        seq.advance_to(100);
        seq.fail(generation, "carrier API unreachable", 100).expect("fail");
        seq.fast_forward();

        let observer = seq.observer();
        assert!(observer.completed.is_empty());
        assert_eq!(
            observer.failed,
            vec![SimError::OperationFailed("carrier API unreachable".into())]
        );
        assert_eq!(seq.snapshot().error.as_deref(), Some("Operation failed: carrier API unreachable"));
    }

    /// G2.4: A new run after a terminal one starts from a fresh state.
    #[test]
    fn restart_after_completion_is_fresh() {
        let mut seq = sequencer();
        seq.start(plan(Selection::all()), 0).expect("first");
        seq.fast_forward();
        let now = seq.clock_ms();
        seq.start(plan(Selection::all()), now).expect("second");

        let snapshot = seq.snapshot();
        assert_eq!(snapshot.status, RunStatus::Running);
        assert_eq!(snapshot.progress, Progress::ZERO);
        assert!(seq.payload().is_none());
    }
}

// =============================================================================
// TIER G3: RESULT SELECTION
// =============================================================================

mod g3_result_selection {
    use super::*;

    fn run_with(selection: Selection) -> ResultPayload {
        let mut seq = sequencer();
        seq.start(plan(selection), 0).expect("start");
        seq.fast_forward();
        seq.payload().cloned().expect("payload")
    }

    /// G3.1: No selector delivers the full dataset.
    #[test]
    fn no_selector_full_dataset() {
        let payload = run_with(Selection::all());
        assert!(payload.unfiltered);
        assert_eq!(payload.len(), 3);
    }

    /// G3.2: An explicit selector that matches nothing delivers nothing.
    #[test]
    fn explicit_selector_no_match_is_empty() {
        let selection = Selection::new(Some("BUS-99".into()), None, None).expect("valid");
        let payload = run_with(selection);
        assert!(!payload.unfiltered);
        assert!(payload.is_empty());
    }

    /// G3.3: Date ranges filter inclusively.
    #[test]
    fn date_range_filters() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 11),
            NaiveDate::from_ymd_opt(2024, 6, 19),
        )
        .expect("valid");
        let payload = run_with(Selection::new(None, None, range).expect("valid"));
        let ids: Vec<_> = payload.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["T-2", "T-3"]);
        assert_eq!(payload.total_amount_cents(), 8_400);
    }
}
