//! # API Handlers
//!
//! HTTP request handlers for the agentdeck API.

use super::AppState;
use super::types::{
    AgentSummary, AgentsResponse, CancelResponse, DatasetResponse, ErrorResponse, FailRunRequest,
    HealthResponse, ResultResponse, RunResponse, StartRunRequest, StatsResponse,
};
use crate::error::AppError;
use agentdeck_core::{AgentId, DatasetProvider, Generation, Selection, SimError};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Maximum length of a failure message.
const MAX_FAILURE_MESSAGE_LENGTH: usize = 1024;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for an application error.
#[must_use]
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Sim(SimError::InvalidSelection(_)) | AppError::BadRequest(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::Sim(SimError::UnknownAgent(_)) => StatusCode::NOT_FOUND,
        AppError::Sim(SimError::StaleGeneration { .. } | SimError::NoActiveRun) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::default()))
}

// =============================================================================
// AGENT HANDLERS
// =============================================================================

/// List configured agents with their stage catalogs.
pub async fn agents_handler(State(state): State<AppState>) -> impl IntoResponse {
    let agents = state
        .engine
        .scenarios()
        .iter()
        .map(AgentSummary::from_scenario)
        .collect();
    (StatusCode::OK, Json(AgentsResponse { agents }))
}

/// Unfiltered dataset of one agent.
pub async fn dataset_handler(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> Result<Json<DatasetResponse>, AppError> {
    let agent = AgentId::new(agent);
    let records = state.engine.datasets().records(&agent)?.to_vec();
    Ok(Json(DatasetResponse {
        agent: agent.to_string(),
        records,
    }))
}

// =============================================================================
// RUN HANDLERS
// =============================================================================

/// Start a run, superseding any run in progress.
pub async fn start_run_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRunRequest>,
) -> Result<(StatusCode, Json<RunResponse>), AppError> {
    let agent = AgentId::new(&request.agent);
    let selection = Selection::try_from(request.selection)?;
    let snapshot = state.engine.start_run(&agent, selection).await?;
    Ok((StatusCode::CREATED, Json(RunResponse::success(&snapshot))))
}

/// Latest snapshot of the current run.
pub async fn current_run_handler(State(state): State<AppState>) -> Json<RunResponse> {
    let snapshot = state.engine.snapshot().await;
    Json(RunResponse::success(&snapshot))
}

/// Cancel the current run.
pub async fn cancel_run_handler(State(state): State<AppState>) -> Json<CancelResponse> {
    let cancelled = state.engine.cancel().await;
    Json(CancelResponse {
        success: true,
        cancelled: cancelled.map(Generation::value),
    })
}

/// Explicitly fail the current run.
pub async fn fail_run_handler(
    State(state): State<AppState>,
    Json(request): Json<FailRunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let message = request.message.trim();
    if message.is_empty() || message.len() > MAX_FAILURE_MESSAGE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "failure message must be 1..={} bytes",
            MAX_FAILURE_MESSAGE_LENGTH
        )));
    }
    let snapshot = state
        .engine
        .fail(Generation(request.generation), message.to_string())
        .await?;
    Ok(Json(RunResponse::success(&snapshot)))
}

/// Result payload of the current run.
pub async fn result_handler(State(state): State<AppState>) -> Response {
    match state.engine.result().await {
        Some(payload) => (StatusCode::OK, Json(ResultResponse::from(payload))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No completed run")),
        )
            .into_response(),
    }
}

// =============================================================================
// STATS HANDLER
// =============================================================================

/// Sequencer counters since startup.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.engine.stats().await))
}
