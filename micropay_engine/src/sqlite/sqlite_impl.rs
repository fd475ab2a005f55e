//! `SqliteDatabase` is a concrete implementation of a recharge engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use micropay_common::Amount;
use sqlx::SqlitePool;

use super::db::{accounts, db_url, new_pool, recharges, reservations, wallets};
use crate::{
    db_types::{Account, AccountId, NewAccount, NewRecharge, NewWallet, Recharge, RechargeId, Reservation, Wallet},
    traits::{
        AccountManagement,
        PendingAccount,
        RechargeDatabase,
        RechargeManagement,
        ReservationLedger,
        StorageError,
    },
};

/// How long a new reservation holds liquidity, unless overridden with [`SqliteDatabase::with_reservation_window`].
pub const DEFAULT_RESERVATION_WINDOW_MINS: i64 = 10;

/// A `PROVISIONING` account older than this is treated as an abandoned signup.
pub const ABANDONED_SIGNUP_MINS: i64 = 10;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    reservation_window: Duration,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl RechargeDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl RechargeManagement for SqliteDatabase {
    async fn insert_recharge_with_reservation(
        &self,
        recharge: NewRecharge,
    ) -> Result<(Recharge, Reservation), StorageError> {
        let expires_at = recharge.created_at + self.reservation_window;
        let mut tx = self.pool.begin().await?;
        let saved = recharges::insert_recharge(&recharge, &mut tx).await?;
        let reservation =
            reservations::insert_reservation(&saved.id, recharge.quote.usdc_value, expires_at, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Recharge [{}] and its reservation #{} committed", saved.id, reservation.id);
        Ok((saved, reservation))
    }

    async fn fetch_recharge(&self, id: &RechargeId) -> Result<Option<Recharge>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let recharge = recharges::fetch_recharge(id, &mut conn).await?;
        Ok(recharge)
    }

    async fn set_payment_intent(&self, id: &RechargeId, intent_id: &str) -> Result<Recharge, StorageError> {
        let mut conn = self.pool.acquire().await?;
        recharges::set_payment_intent(id, intent_id, &mut conn)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Recharge {id}")))
    }

    async fn complete_recharge(
        &self,
        id: &RechargeId,
        transfer_reference: &str,
    ) -> Result<Option<Recharge>, StorageError> {
        use crate::db_types::RechargeStatusType::Completed;
        let mut conn = self.pool.acquire().await?;
        let recharge = recharges::transition_from_pending(id, Completed, Some(transfer_reference), &mut conn).await?;
        Ok(recharge)
    }

    async fn fail_recharge(&self, id: &RechargeId) -> Result<Option<Recharge>, StorageError> {
        use crate::db_types::RechargeStatusType::Failed;
        let mut tx = self.pool.begin().await?;
        let recharge = recharges::transition_from_pending(id, Failed, None, &mut tx).await?;
        let released = reservations::delete_for_recharge(id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Recharge [{id}] failure processed. Status changed: {}. {released} reservations released",
            recharge.is_some()
        );
        Ok(recharge)
    }
}

impl ReservationLedger for SqliteDatabase {
    async fn reserve(&self, amount: Amount, recharge_id: &RechargeId) -> Result<Reservation, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let expires_at = Utc::now() + self.reservation_window;
        let reservation = reservations::insert_reservation(recharge_id, amount, expires_at, &mut conn).await?;
        Ok(reservation)
    }

    async fn total_reserved(&self) -> Result<Amount, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let total = reservations::total_reserved(Utc::now(), &mut conn).await?;
        Ok(total)
    }

    async fn fetch_reservations(&self, recharge_id: &RechargeId) -> Result<Vec<Reservation>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let result = reservations::fetch_for_recharge(recharge_id, &mut conn).await?;
        Ok(result)
    }

    async fn release(&self, recharge_id: &RechargeId) -> Result<u64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let count = reservations::delete_for_recharge(recharge_id, &mut conn).await?;
        Ok(count)
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let count = reservations::delete_expired(Utc::now(), &mut conn).await?;
        Ok(count)
    }
}

impl AccountManagement for SqliteDatabase {
    type Pending = SqlitePendingAccount;

    async fn fetch_account(&self, account_id: &AccountId) -> Result<Option<Account>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account(account_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account_by_email(email, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_wallet_for_account(&self, account_id: &AccountId) -> Result<Option<Wallet>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let wallet = wallets::fetch_wallet_for_account(account_id, &mut conn).await?;
        Ok(wallet)
    }

    async fn begin_account(&self, account: NewAccount) -> Result<Self::Pending, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let cutoff = Utc::now() - Duration::minutes(ABANDONED_SIGNUP_MINS);
        if accounts::delete_abandoned_account(&account.email, cutoff, &mut conn).await? > 0 {
            warn!("🗃️ Removed an abandoned signup for {}", account.email);
        }
        let account = accounts::insert_account(account, &mut conn).await?;
        trace!("🗃️ Account [{}] written as PROVISIONING, awaiting wallet", account.id);
        Ok(SqlitePendingAccount { pool: self.pool.clone(), account })
    }
}

/// A committed account row in the `PROVISIONING` state. No lock is held while the wallet is being created.
///
/// If the value is dropped without being finalised or discarded, the row stays invisible to lookups and is deleted
/// the next time someone signs up with the same email, once it is older than [`ABANDONED_SIGNUP_MINS`].
pub struct SqlitePendingAccount {
    pool: SqlitePool,
    account: Account,
}

impl PendingAccount for SqlitePendingAccount {
    fn account(&self) -> &Account {
        &self.account
    }

    async fn commit_with_wallet(self, wallet: NewWallet) -> Result<(Account, Wallet), StorageError> {
        let Self { pool, account } = self;
        let id = account.id;
        let mut tx = pool.begin().await?;
        let wallet = wallets::insert_wallet(&id, wallet, &mut tx).await?;
        let account = accounts::activate_account(&id, &mut tx)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Provisioning account {id}")))?;
        tx.commit().await?;
        debug!("🗃️ Account [{}] activated with wallet {}", account.id, wallet.address);
        Ok((account, wallet))
    }

    async fn discard(self) -> Result<(), StorageError> {
        let Self { pool, account } = self;
        let id = account.id;
        let mut conn = pool.acquire().await?;
        let deleted = accounts::delete_provisioning_account(&id, &mut conn).await?;
        debug!("🗃️ Provisioning account [{id}] discarded. {deleted} rows deleted");
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, reservation_window: Duration::minutes(DEFAULT_RESERVATION_WINDOW_MINS) })
    }

    /// Sets how long new reservations hold liquidity before they lapse.
    pub fn with_reservation_window(mut self, window: Duration) -> Self {
        self.reservation_window = window;
        self
    }

    pub fn reservation_window(&self) -> Duration {
        self.reservation_window
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
