use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes — require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Positions
        .route(
            "/api/positions",
            get(handlers::positions::list).post(handlers::positions::create),
        )
        .route("/api/positions/all", get(handlers::positions::list_all))
        .route("/api/positions/primary", get(handlers::positions::primaries))
        .route("/api/positions/:id", put(handlers::positions::update))
        .route("/api/positions/:id/close", post(handlers::positions::close))
        // Instruments (price feed pass-through)
        .route("/api/instruments/search", get(handlers::instruments::search))
        .route("/api/instruments/:code/quote", get(handlers::instruments::quote))
        // Backup / restore
        .route("/api/backup", post(handlers::backup::run_backup))
        .route("/api/backup/list", get(handlers::backup::list))
        .route("/api/restore", post(handlers::backup::restore))
        // Control
        .route("/api/control/pause", post(handlers::control::pause))
        .route("/api/control/resume", post(handlers::control::resume))
        .route("/api/control/status", get(handlers::control::status))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // CORS: the dashboard may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
