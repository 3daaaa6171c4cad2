use std::fmt;

use serde::{Deserialize, Serialize};

use super::Position;

/// Direction of a price alert raised by the monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
        }
    }
}

/// A threshold crossing for one primary position, delivered to the UI.
///
/// Signals are re-emitted on every tick the condition still holds; the
/// engine performs no cross-tick suppression.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSignal {
    pub position: Position,
    pub kind: SignalKind,
}
