use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{AccountId, NewWallet, Wallet};

pub async fn insert_wallet(
    account_id: &AccountId,
    wallet: NewWallet,
    conn: &mut SqliteConnection,
) -> Result<Wallet, sqlx::Error> {
    let wallet: Wallet = sqlx::query_as(
        r#"
            INSERT INTO wallets (account_id, external_id, address, blockchain, account_type, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(account_id)
    .bind(wallet.external_id)
    .bind(wallet.address)
    .bind(wallet.blockchain)
    .bind(wallet.account_type)
    .bind(wallet.state)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Wallet {} ({}) linked to account [{account_id}]", wallet.external_id, wallet.address);
    Ok(wallet)
}

pub async fn fetch_wallet_for_account(
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Option<Wallet>, sqlx::Error> {
    let wallet =
        sqlx::query_as("SELECT * FROM wallets WHERE account_id = $1").bind(account_id).fetch_optional(conn).await?;
    Ok(wallet)
}
