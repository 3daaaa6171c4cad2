use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::{counter, gauge};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::ws_types::WsMessage;
use crate::db::position_repo;
use crate::engine::select_primaries;
use crate::feed::FeedClient;
use crate::models::{Position, PriceSignal, SignalKind};

/// Compare a current price against a position's thresholds. The sell
/// check runs first, so an inverted configuration (buy_target above
/// sell_target) resolves to SELL. Both boundaries are inclusive.
pub fn evaluate(position: &Position, current_price: Decimal) -> Option<SignalKind> {
    if current_price >= position.sell_target {
        Some(SignalKind::Sell)
    } else if current_price <= position.buy_target {
        Some(SignalKind::Buy)
    } else {
        None
    }
}

/// Run the price monitor loop. On each tick it reads the active set once,
/// reduces it to one primary position per instrument code, fetches the
/// current price for each primary, and broadcasts a BUY/SELL signal for
/// every threshold crossing.
///
/// The single `interval.tick()` loop guarantees at most one tick in
/// flight; a slow tick delays the next instead of overlapping it. A feed
/// failure skips that position for the tick and never aborts the rest.
pub async fn run_price_monitor(
    pool: PgPool,
    feed: FeedClient,
    ws_tx: broadcast::Sender<WsMessage>,
    pause_flag: Arc<AtomicBool>,
    interval_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if pause_flag.load(Ordering::Relaxed) {
            tracing::debug!("Price monitor paused");
            continue;
        }

        counter!("monitor_ticks_total").increment(1);

        // One query per tick: the tick works against a consistent set.
        let positions = match position_repo::get_active_positions(&pool).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Price monitor: failed to fetch active positions");
                continue;
            }
        };

        gauge!("active_positions").set(positions.len() as f64);

        if positions.is_empty() {
            tracing::debug!("Price monitor: no active positions");
            continue;
        }

        let primaries = select_primaries(&positions);
        gauge!("monitored_primaries").set(primaries.len() as f64);

        for pos in primaries.values() {
            let quote = match feed.current_price(&pos.instrument_code).await {
                Ok(q) => q,
                Err(e) => {
                    // Transient by design: skip until the next tick, no alert.
                    counter!("feed_errors_total").increment(1);
                    tracing::warn!(
                        error = %e,
                        code = %pos.instrument_code,
                        "Failed to fetch price for position"
                    );
                    continue;
                }
            };

            match evaluate(pos, quote.price) {
                Some(kind) => {
                    counter!("price_signals_total").increment(1);
                    tracing::info!(
                        code = %pos.instrument_code,
                        name = %pos.instrument_name,
                        price = %quote.price,
                        sell_target = %pos.sell_target,
                        buy_target = %pos.buy_target,
                        signal = %kind,
                        "Price target reached"
                    );

                    // No subscribers is fine (no dashboard connected).
                    let _ = ws_tx.send(WsMessage::PriceSignal(PriceSignal {
                        position: (*pos).clone(),
                        kind,
                    }));
                }
                None => {
                    tracing::debug!(
                        code = %pos.instrument_code,
                        price = %quote.price,
                        sell_target = %pos.sell_target,
                        buy_target = %pos.buy_target,
                        "Price within target bounds"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_position(sell_target: &str, buy_target: &str) -> Position {
        let now = Utc::now();
        Position {
            id: Uuid::new_v4(),
            instrument_code: "600000".into(),
            instrument_name: "SPDB".into(),
            buy_price: dec("100"),
            buy_time: now,
            sell_condition: dec("0.30"),
            buy_step: dec("0.10"),
            sell_target: sell_target.parse().unwrap(),
            buy_target: buy_target.parse().unwrap(),
            price_precision: 2,
            status: PositionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sell_boundary_is_inclusive() {
        let pos = make_position("102.50", "92.25");
        assert_eq!(evaluate(&pos, dec("102.50")), Some(SignalKind::Sell));
        assert_eq!(evaluate(&pos, dec("102.49")), None);
        assert_eq!(evaluate(&pos, dec("150")), Some(SignalKind::Sell));
    }

    #[test]
    fn test_buy_boundary_is_inclusive() {
        let pos = make_position("102.50", "92.25");
        assert_eq!(evaluate(&pos, dec("92.25")), Some(SignalKind::Buy));
        assert_eq!(evaluate(&pos, dec("92.26")), None);
        assert_eq!(evaluate(&pos, dec("1")), Some(SignalKind::Buy));
    }

    #[test]
    fn test_sell_takes_precedence_on_inverted_targets() {
        // buy_target above sell_target (negative buy_step): both
        // conditions can hold at once and SELL must win.
        let pos = make_position("102.50", "112.75");
        assert_eq!(evaluate(&pos, dec("105")), Some(SignalKind::Sell));
    }
}
