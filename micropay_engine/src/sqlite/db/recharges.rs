use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewRecharge, Recharge, RechargeId, RechargeStatusType};

/// Inserts a new `PENDING` recharge carrying the full quote breakdown. This is not atomic on its own; embed it in a
/// transaction alongside the reservation.
pub async fn insert_recharge(recharge: &NewRecharge, conn: &mut SqliteConnection) -> Result<Recharge, sqlx::Error> {
    let q = &recharge.quote;
    let result: Recharge = sqlx::query_as(
        r#"
            INSERT INTO recharges (
                id,
                account_id,
                status,
                units,
                amount_usdc_value,
                amount_base,
                service_fee,
                tax,
                gateway_fee,
                total_paid,
                currency,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *;
        "#,
    )
    .bind(&recharge.id)
    .bind(&recharge.account_id)
    .bind(RechargeStatusType::Pending)
    .bind(q.units)
    .bind(q.usdc_value)
    .bind(q.base)
    .bind(q.service_fee)
    .bind(q.tax)
    .bind(q.gateway_fee)
    .bind(q.grand_total)
    .bind(&recharge.currency)
    .bind(recharge.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Recharge [{}] inserted for account {} ({} units)", result.id, result.account_id, result.units);
    Ok(result)
}

pub async fn fetch_recharge(id: &RechargeId, conn: &mut SqliteConnection) -> Result<Option<Recharge>, sqlx::Error> {
    let recharge = sqlx::query_as("SELECT * FROM recharges WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(recharge)
}

pub async fn set_payment_intent(
    id: &RechargeId,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Recharge>, sqlx::Error> {
    let recharge = sqlx::query_as(
        "UPDATE recharges SET payment_intent_id = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(intent_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Payment intent {intent_id} recorded for recharge [{id}]");
    Ok(recharge)
}

/// Moves a recharge out of `PENDING` into `status`. The update is conditional on the recharge still being `PENDING`,
/// so concurrent or repeated callers cannot both win. Returns `None` if no row was updated.
///
/// `transfer_reference` is only written when it is provided.
pub async fn transition_from_pending(
    id: &RechargeId,
    status: RechargeStatusType,
    transfer_reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Recharge>, sqlx::Error> {
    let recharge: Option<Recharge> = sqlx::query_as(
        r#"
            UPDATE recharges
            SET status = $1, transfer_reference = COALESCE($2, transfer_reference), updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(transfer_reference)
    .bind(Utc::now())
    .bind(id)
    .bind(RechargeStatusType::Pending)
    .fetch_optional(conn)
    .await?;
    match &recharge {
        Some(_) => debug!("🗃️ Recharge [{id}] moved from PENDING to {status}"),
        None => trace!("🗃️ Recharge [{id}] is not PENDING (or does not exist). Status left unchanged"),
    }
    Ok(recharge)
}

