use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use recallguard_shadow::KindCounts;

use super::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server answers.
    pub status: String,
    /// Whether the event loop still accepts events.
    pub accepting_events: bool,
    /// Cached records per content kind.
    pub records: KindCounts,
    /// Total cached records.
    pub total_records: usize,
}

/// `GET /health` -- service status with per-kind record counts.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.guard.counts();
    Json(HealthResponse {
        status: "ok".into(),
        accepting_events: !state.sender.is_closed(),
        records,
        total_records: records.total(),
    })
}

/// `GET /metrics` -- a snapshot of the guard's counters.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.guard.metrics().snapshot())
}
