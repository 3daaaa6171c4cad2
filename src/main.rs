use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::broadcast;

use tradewatch::api::router::create_router;
use tradewatch::api::ws_types::WsMessage;
use tradewatch::backup::{BackupGateway, StorageError};
use tradewatch::config::AppConfig;
use tradewatch::feed::FeedClient;
use tradewatch::services::monitor::run_price_monitor;
use tradewatch::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = metrics::init_metrics();

    // --- Price feed + monitor loop ---
    let feed = if let Some(token) = config.feed_token.clone() {
        Some(FeedClient::with_base_url(config.feed_base_url.clone(), token))
    } else {
        tracing::warn!("FEED_TOKEN not set — price monitoring and lookups disabled");
        None
    };

    let (ws_tx, _) = broadcast::channel::<WsMessage>(256);
    let monitor_paused = Arc::new(AtomicBool::new(false));

    if let Some(feed) = feed.clone() {
        let monitor_pool = pool.clone();
        let monitor_tx = ws_tx.clone();
        let pause_flag = monitor_paused.clone();
        let interval_secs = config.monitor_interval_secs;
        tokio::spawn(async move {
            run_price_monitor(monitor_pool, feed, monitor_tx, pause_flag, interval_secs).await;
        });
        tracing::info!(
            interval_secs = config.monitor_interval_secs,
            "Price monitor spawned"
        );
    }

    // --- Backup gateway ---
    let backup = match BackupGateway::from_config(&config) {
        Ok(gateway) => {
            tracing::info!(backend = gateway.backend_name(), "Backup gateway ready");
            Some(Arc::new(gateway))
        }
        Err(StorageError::Unavailable(backend)) => {
            tracing::warn!(backend, "Backup backend not configured — backup/restore disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState {
        db: pool,
        config,
        ws_tx,
        metrics_handle,
        feed,
        backup,
        monitor_paused,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
