use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::position_repo::RestoredPosition;
use crate::engine;
use crate::models::{Position, PositionStatus};

/// Default rounding precision substituted for documents produced before
/// the precision field existed.
pub const DEFAULT_PRICE_PRECISION: i32 = 2;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One record of the portable snapshot document. The field set is the
/// stable interchange format: targets are deliberately absent (they are
/// recomputed on restore) and `price_precision` is optional because older
/// producers predate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub instrument_code: String,
    pub instrument_name: String,
    pub buy_price: Decimal,
    pub buy_time: DateTime<Utc>,
    pub sell_condition: Decimal,
    pub buy_step: Decimal,
    #[serde(default = "default_precision")]
    pub price_precision: i32,
    pub is_active: bool,
}

fn default_precision() -> i32 {
    DEFAULT_PRICE_PRECISION
}

impl From<&Position> for SnapshotRecord {
    fn from(pos: &Position) -> Self {
        SnapshotRecord {
            instrument_code: pos.instrument_code.clone(),
            instrument_name: pos.instrument_name.clone(),
            buy_price: pos.buy_price,
            buy_time: pos.buy_time,
            sell_condition: pos.sell_condition,
            buy_step: pos.buy_step,
            price_precision: pos.price_precision,
            is_active: pos.is_active(),
        }
    }
}

/// Serialize every position (closed ones included) into the portable
/// JSON document.
pub fn encode(positions: &[Position]) -> Result<Vec<u8>, SnapshotError> {
    let records: Vec<SnapshotRecord> = positions.iter().map(SnapshotRecord::from).collect();
    Ok(serde_json::to_vec_pretty(&records)?)
}

/// Parse a snapshot document back into storable positions. Targets are
/// recomputed against `now` rather than trusted from the document.
pub fn decode(bytes: &[u8], now: DateTime<Utc>) -> Result<Vec<RestoredPosition>, SnapshotError> {
    let records: Vec<SnapshotRecord> = serde_json::from_slice(bytes)?;

    let restored = records
        .into_iter()
        .map(|rec| {
            let precision = rec.price_precision.max(0);
            let targets = engine::compute_targets(
                rec.buy_price,
                rec.buy_time,
                rec.sell_condition,
                rec.buy_step,
                precision as u32,
                now,
            );
            RestoredPosition {
                instrument_code: rec.instrument_code,
                instrument_name: rec.instrument_name,
                buy_price: rec.buy_price,
                buy_time: rec.buy_time,
                sell_condition: rec.sell_condition,
                buy_step: rec.buy_step,
                price_precision: precision,
                status: if rec.is_active {
                    PositionStatus::Active
                } else {
                    PositionStatus::Closed
                },
                targets,
            }
        })
        .collect();

    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_position(code: &str, buy_price: &str, status: PositionStatus) -> Position {
        let now = Utc::now();
        Position {
            id: Uuid::new_v4(),
            instrument_code: code.into(),
            instrument_name: format!("{code} name"),
            buy_price: buy_price.parse().unwrap(),
            buy_time: now - Duration::days(30),
            sell_condition: dec("0.30"),
            buy_step: dec("0.10"),
            sell_target: dec("999"), // stale on purpose, must not survive restore
            buy_target: dec("999"),
            price_precision: 2,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_round_trip_preserves_fields_and_recomputes_targets() {
        let now = Utc::now();
        let positions = vec![
            make_position("600000", "100", PositionStatus::Active),
            make_position("000001", "50", PositionStatus::Closed),
        ];

        let doc = encode(&positions).unwrap();
        let restored = decode(&doc, now).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].instrument_code, "600000");
        assert_eq!(restored[0].buy_price, dec("100"));
        assert_eq!(restored[0].status, PositionStatus::Active);
        assert_eq!(restored[1].status, PositionStatus::Closed);

        // Targets come from the calculator, not the stale stored values.
        assert_eq!(restored[0].targets.sell_target, dec("102.50"));
        assert_eq!(restored[0].targets.buy_target, dec("92.25"));
    }

    #[test]
    fn test_missing_price_precision_defaults_to_two() {
        // An old producer that never wrote price_precision.
        let doc = br#"[{
            "instrument_code": "600000",
            "instrument_name": "SPDB",
            "buy_price": 100,
            "buy_time": "2024-01-15T09:30:00Z",
            "sell_condition": 0.30,
            "buy_step": 0.10,
            "is_active": true
        }]"#;

        let restored = decode(doc, Utc::now()).unwrap();
        assert_eq!(restored[0].price_precision, 2);
    }

    #[test]
    fn test_buy_time_round_trips_through_text_form() {
        let pos = make_position("600000", "12.34", PositionStatus::Active);
        let doc = encode(std::slice::from_ref(&pos)).unwrap();
        let restored = decode(&doc, Utc::now()).unwrap();
        assert_eq!(restored[0].buy_time, pos.buy_time);
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        assert!(decode(b"not json", Utc::now()).is_err());
        assert!(decode(b"{\"unexpected\": 1}", Utc::now()).is_err());
    }
}
