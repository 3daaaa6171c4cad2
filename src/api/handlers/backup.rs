use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::api::ws_types::WsMessage;
use crate::backup::{BackupGateway, StorageError};
use crate::db::position_repo;
use crate::errors::AppError;
use crate::AppState;

fn gateway(state: &AppState) -> Result<&Arc<BackupGateway>, AppError> {
    state
        .backup
        .as_ref()
        .ok_or(AppError::Storage(StorageError::Unavailable("backup")))
}

#[derive(Serialize)]
pub struct BackupResult {
    pub backend: &'static str,
    pub file: String,
    pub positions: usize,
}

/// POST /api/backup — snapshot every position and upload it.
pub async fn run_backup(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BackupResult>>, AppError> {
    let gateway = gateway(&state)?;
    let positions = position_repo::get_all_positions(&state.db).await?;
    let file = gateway.backup(&positions).await?;

    counter!("backups_total").increment(1);

    Ok(Json(ApiResponse::ok(BackupResult {
        backend: gateway.backend_name(),
        file,
        positions: positions.len(),
    })))
}

/// GET /api/backup/list — stored snapshot names, oldest first.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let names = gateway(&state)?.list_backups().await?;
    Ok(Json(ApiResponse::ok(names)))
}

#[derive(Deserialize)]
pub struct RestoreRequest {
    pub file: String,
}

#[derive(Serialize)]
pub struct RestoreResult {
    pub positions: usize,
}

/// POST /api/restore — download a snapshot and replace the whole store
/// with it. The replacement runs in one transaction: a failed restore
/// leaves the current positions untouched.
pub async fn restore(
    State(state): State<AppState>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<ApiResponse<RestoreResult>>, AppError> {
    let restored = gateway(&state)?.restore(&req.file).await?;
    let count = position_repo::replace_all_positions(&state.db, &restored).await?;

    counter!("restores_total").increment(1);
    tracing::info!(file = %req.file, count, "Store restored from snapshot");
    let _ = state.ws_tx.send(WsMessage::StoreRestored { count });

    Ok(Json(ApiResponse::ok(RestoreResult { positions: count })))
}
