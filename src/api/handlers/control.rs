use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// POST /api/control/pause — Pause the monitor loop.
pub async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    state.monitor_paused.store(true, Ordering::Relaxed);
    tracing::warn!("Price monitor PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

/// POST /api/control/resume — Resume the monitor loop.
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.monitor_paused.store(false, Ordering::Relaxed);
    tracing::info!("Price monitor RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

/// GET /api/control/status — Current system status.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let paused = state.monitor_paused.load(Ordering::Relaxed);
    let backup_backend = state.backup.as_ref().map(|g| g.backend_name());

    Json(json!({
        "paused": paused,
        "monitor_interval_secs": state.config.monitor_interval_secs,
        "feed_configured": state.feed.is_some(),
        "backup_target": state.config.backup_target.to_string(),
        "backup_available": backup_backend.is_some(),
    }))
}
