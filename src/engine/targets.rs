use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Minimum holding period assumed by the yield model. Positions younger
/// than this (including future-dated ones) are priced as if held 30 days.
pub const MIN_HOLDING_DAYS: i64 = 30;

/// Financial-year convention for the simple-interest model.
pub const DAYS_PER_YEAR: i64 = 360;

/// Derived price thresholds for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub sell_target: Decimal,
    pub buy_target: Decimal,
}

/// Compute sell/buy target prices from the annualized-yield model.
///
/// `sell_target = buy_price × (1 + sell_condition × days / 360)` where
/// `days` is the elapsed holding time floored at [`MIN_HOLDING_DAYS`], and
/// `buy_target = sell_target × (1 − buy_step)`. Both are rounded to
/// `price_precision` decimal places.
///
/// Pure and deterministic for a fixed `now`; the caller persists the
/// result. A zero `sell_condition` leaves the sell target at the buy
/// price, a zero `buy_step` makes both targets equal, and a negative
/// `buy_step` (a markup) passes through unvalidated.
pub fn compute_targets(
    buy_price: Decimal,
    buy_time: DateTime<Utc>,
    sell_condition: Decimal,
    buy_step: Decimal,
    price_precision: u32,
    now: DateTime<Utc>,
) -> Targets {
    let elapsed_days = (now - buy_time).num_days().max(MIN_HOLDING_DAYS);

    let yield_factor = Decimal::ONE
        + sell_condition * Decimal::from(elapsed_days) / Decimal::from(DAYS_PER_YEAR);
    let sell_target = round_price(buy_price * yield_factor, price_precision);
    let buy_target = round_price(sell_target * (Decimal::ONE - buy_step), price_precision);

    Targets {
        sell_target,
        buy_target,
    }
}

/// Round a price to `dp` decimal places, midpoints away from zero.
fn round_price(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
