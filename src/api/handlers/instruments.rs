use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::feed::FeedClient;
use crate::AppState;

fn feed(state: &AppState) -> Result<&FeedClient, AppError> {
    state
        .feed
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("price feed is not configured".into()))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct InstrumentSummary {
    pub code: String,
    pub name: String,
    pub industry: Option<String>,
}

/// GET /api/instruments/search?q= — feed search pass-through. Unlike the
/// silent monitor loop, manual lookups surface feed failures.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<InstrumentSummary>>>, AppError> {
    let results = feed(&state)?
        .search(&params.q)
        .await?
        .into_iter()
        .map(|i| InstrumentSummary {
            code: i.code,
            name: i.name,
            industry: i.industry,
        })
        .collect();

    Ok(Json(ApiResponse::ok(results)))
}

#[derive(Serialize)]
pub struct QuoteResponse {
    pub code: String,
    pub price: Decimal,
    pub precision: u32,
}

/// GET /api/instruments/:code/quote — current price for one code.
pub async fn quote(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<QuoteResponse>>, AppError> {
    let q = feed(&state)?.current_price(&code).await?;

    Ok(Json(ApiResponse::ok(QuoteResponse {
        code,
        price: q.price,
        precision: q.precision,
    })))
}
