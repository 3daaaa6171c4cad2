mod common;

use chrono::Utc;

use tradewatch::backup::snapshot;
use tradewatch::engine::compute_targets;
use tradewatch::models::PositionStatus;

use common::{dec, make_position};

#[test]
fn test_snapshot_round_trip_recomputes_targets() {
    let now = Utc::now();
    // Stored targets are stale on purpose: the document must not carry
    // them through a restore.
    let pos = make_position("600000", "100", dec("1"), dec("1"));

    let doc = snapshot::encode(std::slice::from_ref(&pos)).unwrap();
    let restored = snapshot::decode(&doc, now).unwrap();

    assert_eq!(restored.len(), 1);
    let r = &restored[0];
    assert_eq!(r.instrument_code, pos.instrument_code);
    assert_eq!(r.buy_price, pos.buy_price);
    assert_eq!(r.buy_time, pos.buy_time);
    assert_eq!(r.sell_condition, pos.sell_condition);
    assert_eq!(r.buy_step, pos.buy_step);
    assert_eq!(r.status, PositionStatus::Active);

    let expected = compute_targets(
        pos.buy_price,
        pos.buy_time,
        pos.sell_condition,
        pos.buy_step,
        2,
        now,
    );
    assert_eq!(r.targets, expected);
}

#[test]
fn test_snapshot_includes_closed_positions() {
    let mut closed = make_position("000001", "50", dec("51.25"), dec("46.13"));
    closed.status = PositionStatus::Closed;
    let active = make_position("600000", "100", dec("102.50"), dec("92.25"));

    let doc = snapshot::encode(&[active, closed]).unwrap();
    let restored = snapshot::decode(&doc, Utc::now()).unwrap();

    assert_eq!(restored.len(), 2);
    assert_eq!(restored[1].status, PositionStatus::Closed);
}

#[test]
fn test_document_from_legacy_producer() {
    // Float prices, no price_precision: both predate the current schema.
    let doc = br#"[
        {
            "instrument_code": "600000",
            "instrument_name": "SPDB",
            "buy_price": 11.5,
            "buy_time": "2023-06-01T01:30:00+00:00",
            "sell_condition": 0.3,
            "buy_step": 0.1,
            "is_active": true
        },
        {
            "instrument_code": "000858",
            "instrument_name": "Wuliangye",
            "buy_price": 150.0,
            "buy_time": "2023-07-15T05:00:00+00:00",
            "sell_condition": 0.25,
            "buy_step": 0.05,
            "is_active": false
        }
    ]"#;

    let restored = snapshot::decode(doc, Utc::now()).unwrap();

    assert_eq!(restored.len(), 2);
    assert_eq!(restored[0].price_precision, 2);
    assert_eq!(restored[0].buy_price, dec("11.5"));
    assert_eq!(restored[1].status, PositionStatus::Closed);
    // Targets exist and are consistent with the recorded inputs.
    assert!(restored[0].targets.sell_target > restored[0].buy_price);
}
