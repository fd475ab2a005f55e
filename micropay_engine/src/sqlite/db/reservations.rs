//! Liquidity reservations.
//!
//! Timestamps are bound from Rust (never `CURRENT_TIMESTAMP`) so that every `expires_at` value has the same RFC 3339
//! layout and text comparison in SQL orders them correctly.
use chrono::{DateTime, Utc};
use log::{debug, trace};
use micropay_common::Amount;
use sqlx::SqliteConnection;

use crate::db_types::{RechargeId, Reservation};

pub async fn insert_reservation(
    recharge_id: &RechargeId,
    amount: Amount,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Reservation, sqlx::Error> {
    let reservation: Reservation = sqlx::query_as(
        r#"
            INSERT INTO reservations (recharge_id, amount, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(recharge_id)
    .bind(amount)
    .bind(expires_at)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Reserved {amount} USDC for recharge [{recharge_id}] until {expires_at}");
    Ok(reservation)
}

/// Sums the reservations that expire after `now`. Amounts are added up in Rust, since SQLite's `SUM` would coerce the
/// decimal text to floating point.
pub async fn total_reserved(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Amount, sqlx::Error> {
    let amounts: Vec<(Amount,)> =
        sqlx::query_as("SELECT amount FROM reservations WHERE expires_at > $1").bind(now).fetch_all(conn).await?;
    let total = amounts.into_iter().map(|(a,)| a).sum::<Amount>();
    trace!("🗃️ {total} USDC is currently reserved");
    Ok(total)
}

pub async fn fetch_for_recharge(
    recharge_id: &RechargeId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let reservations = sqlx::query_as("SELECT * FROM reservations WHERE recharge_id = $1 ORDER BY id")
        .bind(recharge_id)
        .fetch_all(conn)
        .await?;
    Ok(reservations)
}

pub async fn delete_for_recharge(recharge_id: &RechargeId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reservations WHERE recharge_id = $1").bind(recharge_id).execute(conn).await?;
    let count = result.rows_affected();
    trace!("🗃️ Released {count} reservations for recharge [{recharge_id}]");
    Ok(count)
}

pub async fn delete_expired(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reservations WHERE expires_at <= $1").bind(now).execute(conn).await?;
    Ok(result.rows_affected())
}
