pub mod position;
pub mod signal;

pub use position::{Position, PositionStatus};
pub use signal::{PriceSignal, SignalKind};
