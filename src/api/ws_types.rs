use serde::Serialize;

use crate::models::{Position, PriceSignal};

/// Messages broadcast to all connected WebSocket clients (the "UI").
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// A position was created, edited, or closed.
    #[serde(rename = "position_update")]
    PositionUpdate(Position),

    /// A primary position crossed its sell or buy target.
    #[serde(rename = "price_signal")]
    PriceSignal(PriceSignal),

    /// The store was bulk-replaced from a snapshot.
    #[serde(rename = "store_restored")]
    StoreRestored { count: usize },
}
