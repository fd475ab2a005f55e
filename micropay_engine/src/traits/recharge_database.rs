use thiserror::Error;

use crate::{
    db_types::{NewRecharge, Recharge, RechargeId, Reservation},
    traits::{AccountManagement, ReservationLedger},
};

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The record already exists. {0}")]
    AlreadyExists(String),
    #[error("The record does not exist. {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => Self::AlreadyExists(err.to_string()),
            sqlx::Error::RowNotFound => Self::NotFound(e.to_string()),
            _ => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Persistence of recharge records.
///
/// A recharge is written exactly once by the orchestrator, together with its liquidity reservation. After that, the
/// only permitted changes are recording the payment intent reference, and the monotonic status transitions
/// `PENDING -> COMPLETED` and `PENDING -> FAILED`.
#[allow(async_fn_in_trait)]
pub trait RechargeManagement {
    /// In a single atomic transaction, stores the recharge with status `PENDING` and reserves `quote.usdc_value` of
    /// treasury liquidity against it. Either both rows exist afterwards or neither does.
    async fn insert_recharge_with_reservation(
        &self,
        recharge: NewRecharge,
    ) -> Result<(Recharge, Reservation), StorageError>;

    async fn fetch_recharge(&self, id: &RechargeId) -> Result<Option<Recharge>, StorageError>;

    /// Records the payment processor's intent reference on the recharge.
    async fn set_payment_intent(&self, id: &RechargeId, intent_id: &str) -> Result<Recharge, StorageError>;

    /// Marks the recharge `COMPLETED` and stores the treasury transfer reference, but only if the recharge is still
    /// `PENDING`. Returns `None` if the recharge does not exist or has already left the `PENDING` state.
    ///
    /// This does *not* release the reservation.
    async fn complete_recharge(
        &self,
        id: &RechargeId,
        transfer_reference: &str,
    ) -> Result<Option<Recharge>, StorageError>;

    /// In a single atomic transaction, marks the recharge `FAILED` if it is still `PENDING`, and deletes every
    /// reservation held for it, whatever its status.
    ///
    /// Returns the updated recharge if a status transition happened, `None` otherwise.
    async fn fail_recharge(&self, id: &RechargeId) -> Result<Option<Recharge>, StorageError>;
}

/// The complete set of behaviour a storage backend must provide to back the recharge engine.
pub trait RechargeDatabase: Clone + RechargeManagement + ReservationLedger + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;
}
