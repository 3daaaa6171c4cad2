use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use tradewatch::models::{Position, PositionStatus};

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Build an active position with explicit targets, opened 30 days ago.
#[allow(dead_code)]
pub fn make_position(code: &str, buy_price: &str, sell_target: Decimal, buy_target: Decimal) -> Position {
    let now = Utc::now();
    Position {
        id: Uuid::new_v4(),
        instrument_code: code.into(),
        instrument_name: format!("{code} name"),
        buy_price: dec(buy_price),
        buy_time: now - Duration::days(30),
        sell_condition: dec("0.30"),
        buy_step: dec("0.10"),
        sell_target,
        buy_target,
        price_precision: 2,
        status: PositionStatus::Active,
        created_at: now,
        updated_at: now,
    }
}
