use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backup::{BackupError, StorageError};
use crate::feed::FeedError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Feed(FeedError::NotFound(code)) => {
                (StatusCode::NOT_FOUND, format!("instrument not found: {code}"))
            }
            AppError::Feed(e) => (StatusCode::BAD_GATEWAY, format!("price feed: {e}")),
            AppError::Storage(e @ StorageError::Unavailable(_))
            | AppError::Backup(BackupError::Storage(e @ StorageError::Unavailable(_))) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            AppError::Storage(e) | AppError::Backup(BackupError::Storage(e)) => {
                (StatusCode::BAD_GATEWAY, format!("remote storage: {e}"))
            }
            AppError::Backup(BackupError::Snapshot(e)) => {
                (StatusCode::BAD_GATEWAY, format!("snapshot: {e}"))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}
