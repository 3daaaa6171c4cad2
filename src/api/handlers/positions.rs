use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiResponse;
use crate::api::ws_types::WsMessage;
use crate::db::position_repo::{self, NewPosition};
use crate::engine;
use crate::errors::AppError;
use crate::models::Position;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    /// Restrict to one instrument code (active and closed tranches).
    pub code: Option<String>,
}

/// GET /api/positions — active positions, or all tranches of one code.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let positions = match params.code {
        Some(code) => position_repo::get_positions_by_code(&state.db, &code).await?,
        None => position_repo::get_active_positions(&state.db).await?,
    };
    Ok(Json(ApiResponse::ok(positions)))
}

/// GET /api/positions/all — every position, closed ones included.
pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let positions = position_repo::get_all_positions(&state.db).await?;
    Ok(Json(ApiResponse::ok(positions)))
}

/// GET /api/positions/primary — one monitored position per instrument.
pub async fn primaries(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let positions = position_repo::get_active_positions(&state.db).await?;
    let mut primaries: Vec<Position> = engine::select_primaries(&positions)
        .into_values()
        .cloned()
        .collect();
    primaries.sort_by(|a, b| a.instrument_code.cmp(&b.instrument_code));
    Ok(Json(ApiResponse::ok(primaries)))
}

#[derive(Deserialize)]
pub struct CreatePositionRequest {
    pub instrument_code: String,
    pub buy_price: Decimal,
    /// Defaults to now; may be backdated or future-dated.
    pub buy_time: Option<DateTime<Utc>>,
    pub sell_condition: Decimal,
    pub buy_step: Decimal,
    pub price_precision: Option<i32>,
}

/// POST /api/positions — create a position. The instrument name is
/// resolved from the feed once, here; a failed lookup rejects the create
/// and leaves the store untouched.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePositionRequest>,
) -> Result<Json<ApiResponse<Position>>, AppError> {
    if req.buy_price <= Decimal::ZERO {
        return Err(AppError::BadRequest("buy_price must be positive".into()));
    }
    let price_precision = req.price_precision.unwrap_or(2);
    if price_precision < 0 {
        return Err(AppError::BadRequest("price_precision must be >= 0".into()));
    }

    let Some(feed) = &state.feed else {
        return Err(AppError::BadRequest("price feed is not configured".into()));
    };
    let instrument = feed.lookup_instrument(&req.instrument_code).await?;

    let now = Utc::now();
    let buy_time = req.buy_time.unwrap_or(now);
    let targets = engine::compute_targets(
        req.buy_price,
        buy_time,
        req.sell_condition,
        req.buy_step,
        price_precision as u32,
        now,
    );

    let pos = position_repo::insert_position(
        &state.db,
        &NewPosition {
            instrument_code: instrument.code,
            instrument_name: instrument.name,
            buy_price: req.buy_price,
            buy_time,
            sell_condition: req.sell_condition,
            buy_step: req.buy_step,
            price_precision,
            targets,
        },
    )
    .await?;

    tracing::info!(
        code = %pos.instrument_code,
        buy_price = %pos.buy_price,
        sell_target = %pos.sell_target,
        buy_target = %pos.buy_target,
        "Position created"
    );
    let _ = state.ws_tx.send(WsMessage::PositionUpdate(pos.clone()));

    Ok(Json(ApiResponse::ok(pos)))
}

/// Edit surface: only the rate/time inputs of the model are mutable.
/// buy_price and instrument_code are fixed at creation.
#[derive(Deserialize)]
pub struct UpdatePositionRequest {
    pub buy_time: Option<DateTime<Utc>>,
    pub sell_condition: Option<Decimal>,
    pub buy_step: Option<Decimal>,
    pub price_precision: Option<i32>,
}

/// PUT /api/positions/:id — edit and recompute targets atomically.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePositionRequest>,
) -> Result<Json<ApiResponse<Position>>, AppError> {
    let existing = position_repo::get_position(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("position {id}")))?;

    let buy_time = req.buy_time.unwrap_or(existing.buy_time);
    let sell_condition = req.sell_condition.unwrap_or(existing.sell_condition);
    let buy_step = req.buy_step.unwrap_or(existing.buy_step);
    let price_precision = req.price_precision.unwrap_or(existing.price_precision);
    if price_precision < 0 {
        return Err(AppError::BadRequest("price_precision must be >= 0".into()));
    }

    let targets = engine::compute_targets(
        existing.buy_price,
        buy_time,
        sell_condition,
        buy_step,
        price_precision as u32,
        Utc::now(),
    );

    let pos = position_repo::update_position(
        &state.db,
        id,
        buy_time,
        sell_condition,
        buy_step,
        price_precision,
        targets,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("position {id}")))?;

    let _ = state.ws_tx.send(WsMessage::PositionUpdate(pos.clone()));

    Ok(Json(ApiResponse::ok(pos)))
}

/// POST /api/positions/:id/close — soft delete.
pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Position>>, AppError> {
    let pos = position_repo::close_position(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("position {id}")))?;

    tracing::info!(code = %pos.instrument_code, id = %pos.id, "Position closed");
    let _ = state.ws_tx.send(WsMessage::PositionUpdate(pos.clone()));

    Ok(Json(ApiResponse::ok(pos)))
}
