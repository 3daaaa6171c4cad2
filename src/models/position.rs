use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a position. `Closed` is a soft delete: the row is
/// kept for history and export but excluded from monitoring and from
/// primary-position selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Active => "active",
            PositionStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "closed" => PositionStatus::Closed,
            _ => PositionStatus::Active,
        }
    }
}

// Stored as TEXT; delegate the sqlx plumbing to str.
impl sqlx::Type<sqlx::Postgres> for PositionStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for PositionStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PositionStatus {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(PositionStatus::from_str(s))
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for the positions table.
///
/// `sell_target` and `buy_target` are derived: they are recomputed through
/// `engine::targets` whenever buy_price, buy_time, sell_condition, buy_step
/// or price_precision changes, and are never set directly by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: Uuid,
    pub instrument_code: String,
    pub instrument_name: String,
    pub buy_price: Decimal,
    pub buy_time: DateTime<Utc>,
    /// Fractional annualized target yield, e.g. 0.30 = 30%/year.
    pub sell_condition: Decimal,
    /// Fractional discount below the sell target used for the re-entry price.
    pub buy_step: Decimal,
    pub sell_target: Decimal,
    pub buy_target: Decimal,
    pub price_precision: i32,
    pub status: PositionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Rounding precision clamped to a valid decimal-place count.
    pub fn precision(&self) -> u32 {
        self.price_precision.max(0) as u32
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) buy={} sell_target={} buy_target={} [{}]",
            self.instrument_name,
            self.instrument_code,
            self.buy_price,
            self.sell_target,
            self.buy_target,
            self.status,
        )
    }
}
