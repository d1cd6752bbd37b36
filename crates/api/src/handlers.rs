//! API request handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use clmm_rebalancer_execution::lifecycle::{LifecycleEvent, LifecycleStats};
use clmm_rebalancer_execution::scheduler::BotStatus;
use serde::{Deserialize, Serialize};

/// Largest page of history served at once.
const MAX_HISTORY_LIMIT: usize = 500;

/// Health response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers.
    pub status: String,
    /// Seconds since the API state was created.
    pub uptime_secs: u64,
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum events returned, newest first.
    pub limit: Option<usize>,
}

/// History response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Events, newest first.
    pub events: Vec<LifecycleEvent>,
    /// Counters over the whole run.
    pub stats: LifecycleStats,
}

/// Liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Bot status with the latest cycle outcome.
pub async fn status(State(state): State<AppState>) -> Json<BotStatus> {
    Json(state.status.status().await)
}

/// Lifecycle history.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.unwrap_or(50);
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }

    Ok(Json(HistoryResponse {
        events: state.lifecycle.recent_events(limit).await,
        stats: state.lifecycle.stats().await,
    }))
}
