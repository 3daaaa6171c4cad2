use std::collections::HashMap;

use crate::models::Position;

/// Reduce a set of active positions to one primary position per
/// instrument code: the one with the lowest buy price, i.e. the most
/// conservative cost basis. Ties keep the first position encountered, so
/// callers wanting reproducible results supply a deterministic input
/// order (the repo queries order by created_at, id).
///
/// Closed positions are ignored even if present in the input.
pub fn select_primaries(positions: &[Position]) -> HashMap<String, &Position> {
    let mut primaries: HashMap<String, &Position> = HashMap::new();

    for pos in positions {
        if !pos.is_active() {
            continue;
        }
        match primaries.get(pos.instrument_code.as_str()) {
            Some(current) if current.buy_price <= pos.buy_price => {}
            _ => {
                primaries.insert(pos.instrument_code.clone(), pos);
            }
        }
    }

    primaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn make_position(code: &str, buy_price: &str, status: PositionStatus) -> Position {
        let now = Utc::now();
        Position {
            id: Uuid::new_v4(),
            instrument_code: code.into(),
            instrument_name: format!("{code} name"),
            buy_price: buy_price.parse().unwrap(),
            buy_time: now,
            sell_condition: "0.30".parse().unwrap(),
            buy_step: "0.10".parse().unwrap(),
            sell_target: Decimal::ZERO,
            buy_target: Decimal::ZERO,
            price_precision: 2,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lowest_cost_basis_wins_per_code() {
        let a = make_position("X", "10", PositionStatus::Active);
        let b = make_position("X", "8", PositionStatus::Active);
        let c = make_position("Y", "5", PositionStatus::Active);
        let positions = vec![a, b.clone(), c.clone()];

        let primaries = select_primaries(&positions);

        assert_eq!(primaries.len(), 2);
        assert_eq!(primaries["X"].id, b.id);
        assert_eq!(primaries["Y"].id, c.id);
    }

    #[test]
    fn test_two_tranches_same_instrument() {
        let high = make_position("600000", "12.00", PositionStatus::Active);
        let low = make_position("600000", "11.50", PositionStatus::Active);
        let positions = vec![high, low.clone()];

        let primaries = select_primaries(&positions);

        assert_eq!(primaries["600000"].id, low.id);
    }

    #[test]
    fn test_tie_keeps_first_in_input_order() {
        let first = make_position("X", "10", PositionStatus::Active);
        let second = make_position("X", "10", PositionStatus::Active);
        let positions = vec![first.clone(), second];

        let primaries = select_primaries(&positions);

        assert_eq!(primaries["X"].id, first.id);
    }

    #[test]
    fn test_closed_positions_are_excluded() {
        let closed = make_position("X", "1", PositionStatus::Closed);
        let active = make_position("X", "10", PositionStatus::Active);
        let positions = vec![closed, active.clone()];

        let primaries = select_primaries(&positions);

        assert_eq!(primaries["X"].id, active.id);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_primaries(&[]).is_empty());
    }
}
