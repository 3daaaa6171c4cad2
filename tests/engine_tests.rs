mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use tradewatch::engine::{compute_targets, select_primaries};
use tradewatch::models::SignalKind;
use tradewatch::services::monitor::evaluate;

use common::{dec, make_position};

#[test]
fn test_create_to_signal_flow() {
    // A freshly opened position at 100 with a 30%/year condition and a
    // 10% step is priced on the 30-day floor.
    let now = Utc::now();
    let targets = compute_targets(dec("100"), now, dec("0.30"), dec("0.10"), 2, now);
    assert_eq!(targets.sell_target, dec("102.50"));
    assert_eq!(targets.buy_target, dec("92.25"));

    let pos = make_position("600000", "100", targets.sell_target, targets.buy_target);

    // Inclusive boundaries on both sides, SELL checked first.
    assert_eq!(evaluate(&pos, dec("102.50")), Some(SignalKind::Sell));
    assert_eq!(evaluate(&pos, dec("92.25")), Some(SignalKind::Buy));
    assert_eq!(evaluate(&pos, dec("100.00")), None);
}

#[test]
fn test_primary_selection_drives_monitoring() {
    // Two tranches of 600000: only the cheaper one is monitored.
    let expensive = make_position("600000", "12.00", dec("12.30"), dec("11.07"));
    let cheap = make_position("600000", "11.50", dec("11.79"), dec("10.61"));
    let other = make_position("000858", "150", dec("153.75"), dec("138.38"));
    let positions = vec![expensive.clone(), cheap.clone(), other.clone()];

    let primaries = select_primaries(&positions);

    assert_eq!(primaries.len(), 2);
    assert_eq!(primaries["600000"].id, cheap.id);
    assert_eq!(primaries["000858"].id, other.id);

    // 11.00 would cross the expensive tranche's buy target (11.07) but
    // sits between the primary's targets, so nothing is raised.
    assert_eq!(evaluate(primaries["600000"], dec("11.00")), None);
    assert_eq!(evaluate(primaries["600000"], dec("10.50")), Some(SignalKind::Buy));
}

#[test]
fn test_targets_grow_with_holding_period() {
    let now = Utc::now();
    let short = compute_targets(dec("100"), now - Duration::days(60), dec("0.30"), dec("0.10"), 2, now);
    let long = compute_targets(dec("100"), now - Duration::days(180), dec("0.30"), dec("0.10"), 2, now);

    assert!(long.sell_target > short.sell_target);
    // 60 days: 100 × (1 + 0.30 × 60/360) = 105.00
    assert_eq!(short.sell_target, dec("105.00"));
    // 180 days: 100 × (1 + 0.30 × 180/360) = 115.00
    assert_eq!(long.sell_target, dec("115.00"));
}

#[test]
fn test_buy_target_tracks_sell_target_exactly() {
    let now = Utc::now();
    for (price, step) in [("87.65", "0"), ("12.34", "0.25"), ("5", "0.999")] {
        let t = compute_targets(dec(price), now, dec("0.30"), dec(step), 2, now);
        let expected = (t.sell_target * (Decimal::ONE - dec(step))).round_dp_with_strategy(
            2,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        );
        assert_eq!(t.buy_target, expected);
    }
}
