pub mod api;
pub mod backup;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::backup::BackupGateway;
use crate::config::AppConfig;
use crate::feed::FeedClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub feed: Option<FeedClient>,
    pub backup: Option<Arc<BackupGateway>>,
    pub monitor_paused: Arc<AtomicBool>,
}
