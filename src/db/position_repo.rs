use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::Targets;
use crate::models::{Position, PositionStatus};

/// Field set for inserting a new position. Targets are computed by the
/// caller through `engine::targets` before the insert.
#[derive(Debug, Clone)]
pub struct NewPosition {
    pub instrument_code: String,
    pub instrument_name: String,
    pub buy_price: Decimal,
    pub buy_time: DateTime<Utc>,
    pub sell_condition: Decimal,
    pub buy_step: Decimal,
    pub price_precision: i32,
    pub targets: Targets,
}

pub async fn insert_position(pool: &PgPool, new: &NewPosition) -> anyhow::Result<Position> {
    let pos = sqlx::query_as::<_, Position>(
        r#"
        INSERT INTO positions
            (instrument_code, instrument_name, buy_price, buy_time,
             sell_condition, buy_step, sell_target, buy_target,
             price_precision, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active')
        RETURNING *
        "#,
    )
    .bind(&new.instrument_code)
    .bind(&new.instrument_name)
    .bind(new.buy_price)
    .bind(new.buy_time)
    .bind(new.sell_condition)
    .bind(new.buy_step)
    .bind(new.targets.sell_target)
    .bind(new.targets.buy_target)
    .bind(new.price_precision)
    .fetch_one(pool)
    .await?;

    Ok(pos)
}

/// Get all active positions in a deterministic order, so primary-position
/// selection ties resolve reproducibly.
pub async fn get_active_positions(pool: &PgPool) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE status = 'active' ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Get every position including closed ones (history, export, backup).
pub async fn get_all_positions(pool: &PgPool) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

pub async fn get_positions_by_code(pool: &PgPool, code: &str) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE instrument_code = $1 ORDER BY created_at, id",
    )
    .bind(code)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

pub async fn get_position(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Position>> {
    let pos = sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(pos)
}

/// Apply an edit to the mutable fields of a position. buy_price and
/// instrument_code are immutable after creation; targets must have been
/// recomputed by the caller against the new field values.
pub async fn update_position(
    pool: &PgPool,
    id: Uuid,
    buy_time: DateTime<Utc>,
    sell_condition: Decimal,
    buy_step: Decimal,
    price_precision: i32,
    targets: Targets,
) -> anyhow::Result<Option<Position>> {
    let pos = sqlx::query_as::<_, Position>(
        r#"
        UPDATE positions
        SET buy_time = $2, sell_condition = $3, buy_step = $4,
            price_precision = $5, sell_target = $6, buy_target = $7,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(buy_time)
    .bind(sell_condition)
    .bind(buy_step)
    .bind(price_precision)
    .bind(targets.sell_target)
    .bind(targets.buy_target)
    .fetch_optional(pool)
    .await?;

    Ok(pos)
}

/// Soft delete: mark the position closed. The row survives for history.
pub async fn close_position(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Position>> {
    let pos = sqlx::query_as::<_, Position>(
        r#"
        UPDATE positions
        SET status = 'closed', updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(pos)
}

/// Replace the entire position set from a restored snapshot, inside one
/// transaction so a failed restore leaves the store untouched.
pub async fn replace_all_positions(
    pool: &PgPool,
    restored: &[RestoredPosition],
) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM positions").execute(&mut *tx).await?;

    for rec in restored {
        sqlx::query(
            r#"
            INSERT INTO positions
                (instrument_code, instrument_name, buy_price, buy_time,
                 sell_condition, buy_step, sell_target, buy_target,
                 price_precision, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&rec.instrument_code)
        .bind(&rec.instrument_name)
        .bind(rec.buy_price)
        .bind(rec.buy_time)
        .bind(rec.sell_condition)
        .bind(rec.buy_step)
        .bind(rec.targets.sell_target)
        .bind(rec.targets.buy_target)
        .bind(rec.price_precision)
        .bind(rec.status)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(restored.len())
}

/// A position parsed out of a snapshot document, targets already
/// recomputed (stored targets in the document are never trusted).
#[derive(Debug, Clone)]
pub struct RestoredPosition {
    pub instrument_code: String,
    pub instrument_name: String,
    pub buy_price: Decimal,
    pub buy_time: DateTime<Utc>,
    pub sell_condition: Decimal,
    pub buy_step: Decimal,
    pub price_precision: i32,
    pub status: PositionStatus,
    pub targets: Targets,
}
