//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AgentSummary, ResultResponse, RunJson, stages_json};
use crate::config::AppConfig;
use crate::engine::Engine;
use crate::error::AppError;
use crate::fixtures::load_datasets;
use agentdeck_core::{
    AgentId, DatasetProvider, DateRange, Record, ResultPayload, RunObserver, RunPlan, RunSnapshot,
    RunStatus, Selection, Sequencer, SimError,
};
use chrono::NaiveDate;
use serde::Serialize;

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!("{}", text.unwrap_or_default());
}

/// Format cents as a decimal amount, e.g. `-1234` as `-12.34`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// One progress line: `[#3] Optimizing routes (3/4)  45%`.
#[must_use]
pub fn progress_line(snapshot: &RunSnapshot) -> String {
    match snapshot.status {
        RunStatus::Idle => format!("[{}] idle", snapshot.generation),
        RunStatus::Failed => format!(
            "[{}] failed: {}",
            snapshot.generation,
            snapshot.error.as_deref().unwrap_or("unknown error")
        ),
        RunStatus::Running | RunStatus::Completed => format!(
            "[{}] {} ({}/{}) {:>3}%",
            snapshot.generation,
            snapshot.stage_label.as_deref().unwrap_or("-"),
            snapshot.stage_index + 1,
            snapshot.stage_count,
            snapshot.percent()
        ),
    }
}

fn print_snapshot(snapshot: &RunSnapshot, json_mode: bool) {
    if json_mode {
        print_json(&RunJson::from(snapshot), false);
    } else {
        println!("{}", progress_line(snapshot));
    }
}

fn print_records(records: &[Record]) {
    println!(
        "  {:<12} {:<16} {:<12} {:<10} {:>14}",
        "ID", "ENTITY", "CATEGORY", "DATE", "AMOUNT"
    );
    for r in records {
        println!(
            "  {:<12} {:<16} {:<12} {:<10} {:>14}",
            r.id,
            r.entity,
            r.category,
            r.date,
            format_cents(r.amount_cents)
        );
    }
}

fn print_payload(payload: &ResultPayload, json_mode: bool) {
    if json_mode {
        print_json(&ResultResponse::from(payload.clone()), true);
        return;
    }
    println!();
    println!("Result of run {} ({})", payload.generation, payload.agent);
    if payload.unfiltered {
        println!("  No selector given: showing the full dataset.");
    }
    if payload.is_empty() {
        println!("  No records match the selection.");
        return;
    }
    print_records(&payload.records);
    println!();
    println!(
        "  {} records, total {}",
        payload.len(),
        format_cents(payload.total_amount_cents())
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    let engine = Engine::from_config(config)?;
    let mut server = config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    println!("agentdeck Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", server.host);
    println!("  Port:       {}", server.port);
    println!("  Agents:     {}", engine.scenarios().len());
    println!("  Tick:       {}ms", config.sequencer.tick_interval_ms);
    println!("  Pause:      {}ms", config.sequencer.stage_pause_ms);
    println!();

    let addr = format!("{}:{}", server.host, server.port);
    api::run_server(&addr, engine, &server).await
}

// =============================================================================
// AGENT COMMANDS
// =============================================================================

/// List configured agents.
pub fn cmd_agents(config: &AppConfig, json_mode: bool) -> Result<(), AppError> {
    let scenarios = config.scenarios()?;

    if json_mode {
        let agents: Vec<AgentSummary> = scenarios.iter().map(AgentSummary::from_scenario).collect();
        print_json(&agents, true);
        return Ok(());
    }

    println!("Agents:");
    for scenario in scenarios.iter() {
        println!(
            "  {:<16} {} ({} stages, {}ms)",
            scenario.id,
            scenario.title,
            scenario.catalog.stage_count(),
            scenario.catalog.total_duration_ms()
        );
        if !scenario.description.is_empty() {
            println!("  {:<16} {}", "", scenario.description);
        }
    }
    Ok(())
}

/// Show the stage catalog of one agent.
pub fn cmd_stages(config: &AppConfig, json_mode: bool, agent: &str) -> Result<(), AppError> {
    let scenarios = config.scenarios()?;
    let scenario = scenarios.get(&AgentId::new(agent))?;

    if json_mode {
        print_json(&stages_json(&scenario.catalog), true);
        return Ok(());
    }

    println!("{} ({})", scenario.title, scenario.id);
    for (i, stage) in scenario.catalog.stages().enumerate() {
        println!(
            "  {}. {:<36} -> {:>3}%  {:>6}ms",
            i + 1,
            stage.label,
            stage.target.percent(),
            stage.duration_ms
        );
    }
    Ok(())
}

/// Print the unfiltered dataset of one agent.
pub fn cmd_dataset(config: &AppConfig, json_mode: bool, agent: &str) -> Result<(), AppError> {
    let datasets = load_datasets(config)?;
    let records = datasets.records(&AgentId::new(agent))?;

    if json_mode {
        print_json(&records, true);
    } else {
        print_records(records);
    }
    Ok(())
}

// =============================================================================
// RUN COMMANDS
// =============================================================================

/// Run parameters collected from the command line.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub agent: String,
    pub entity: Option<String>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RunRequest {
    /// Validate the selector flags.
    pub fn selection(&self) -> Result<Selection, SimError> {
        let range = DateRange::new(self.from, self.to)?;
        Selection::new(self.entity.clone(), self.category.clone(), range)
    }
}

/// Play a run in real time, printing progress as it happens.
pub async fn cmd_run(
    config: &AppConfig,
    json_mode: bool,
    request: RunRequest,
) -> Result<(), AppError> {
    let engine = Engine::from_config(config)?;
    let selection = request.selection()?;
    let driver = engine.spawn_driver();

    let first = engine
        .start_run(&AgentId::new(&request.agent), selection)
        .await?;
    let last = engine
        .wait_for_end(first.generation, |snapshot| print_snapshot(snapshot, json_mode))
        .await;
    driver.abort();

    finish_run(&last, engine.result().await.as_ref(), json_mode)
}

/// Prints every snapshot the sequencer emits.
#[derive(Debug, Clone, Copy)]
struct ConsoleObserver {
    json_mode: bool,
}

impl RunObserver for ConsoleObserver {
    fn on_progress(&mut self, snapshot: &RunSnapshot) {
        print_snapshot(snapshot, self.json_mode);
    }

    fn on_completed(&mut self, snapshot: &RunSnapshot, _payload: &ResultPayload) {
        print_snapshot(snapshot, self.json_mode);
    }

    fn on_failed(&mut self, snapshot: &RunSnapshot, _error: &SimError) {
        print_snapshot(snapshot, self.json_mode);
    }
}

/// Play a run on virtual time, without waiting.
pub fn cmd_run_instant(
    config: &AppConfig,
    json_mode: bool,
    request: RunRequest,
) -> Result<(), AppError> {
    let scenarios = config.scenarios()?;
    let datasets = load_datasets(config)?;
    let scenario = scenarios.get(&AgentId::new(&request.agent))?;
    let selection = request.selection()?;

    let mut sequencer = Sequencer::new(config.sequencer, datasets, ConsoleObserver { json_mode })?;
    sequencer.start(
        RunPlan::new(scenario.id.clone(), scenario.catalog.clone(), selection),
        0,
    )?;
    let reached = sequencer.fast_forward();
    tracing::debug!(
        "Virtual run finished at {}ms after {} ticks",
        reached,
        sequencer.stats().ticks
    );

    finish_run(&sequencer.snapshot(), sequencer.payload(), json_mode)
}

fn finish_run(
    last: &RunSnapshot,
    payload: Option<&ResultPayload>,
    json_mode: bool,
) -> Result<(), AppError> {
    match (last.status, payload) {
        (RunStatus::Completed, Some(payload)) => {
            print_payload(payload, json_mode);
            Ok(())
        }
        (RunStatus::Failed, _) => Err(SimError::OperationFailed(
            last.error.clone().unwrap_or_else(|| "run failed".to_string()),
        )
        .into()),
        _ => Err(SimError::CancelledRun(last.generation).into()),
    }
}

// =============================================================================
// CHECK-CONFIG COMMAND
// =============================================================================

/// Validate configuration and fixtures without starting anything.
pub fn cmd_check_config(config: &AppConfig, json_mode: bool) -> Result<(), AppError> {
    let scenarios = config.scenarios()?;
    let datasets = load_datasets(config)?;

    let mut agents = Vec::new();
    for scenario in scenarios.iter() {
        let records = datasets.records(&scenario.id)?.len();
        agents.push((scenario.id.to_string(), scenario.catalog.stage_count(), records));
    }

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "tick_interval_ms": config.sequencer.tick_interval_ms,
            "stage_pause_ms": config.sequencer.stage_pause_ms,
            "agents": agents.iter().map(|(id, stages, records)| serde_json::json!({
                "id": id,
                "stages": stages,
                "records": records,
            })).collect::<Vec<_>>(),
        });
        print_json(&output, true);
        return Ok(());
    }

    println!("Configuration OK");
    println!(
        "  Sequencer: tick {}ms, pause {}ms",
        config.sequencer.tick_interval_ms, config.sequencer.stage_pause_ms
    );
    for (id, stages, records) in &agents {
        println!("  {:<16} {} stages, {} records", id, stages, records);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
