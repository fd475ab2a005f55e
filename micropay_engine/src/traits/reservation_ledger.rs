use micropay_common::Amount;

use crate::{
    db_types::{RechargeId, Reservation},
    traits::StorageError,
};

/// Tracks provisional holds against treasury liquidity.
///
/// Each hold carries an expiry. Expired holds no longer count against headroom even before they are physically
/// removed by [`ReservationLedger::purge_expired`].
#[allow(async_fn_in_trait)]
pub trait ReservationLedger {
    /// Holds `amount` of liquidity for the given recharge until the backend's reservation window elapses.
    async fn reserve(&self, amount: Amount, recharge_id: &RechargeId) -> Result<Reservation, StorageError>;

    /// The sum of all reservations that have not yet expired. Zero if there are none.
    async fn total_reserved(&self) -> Result<Amount, StorageError>;

    /// Fetches the reservations held for the given recharge, expired or not.
    async fn fetch_reservations(&self, recharge_id: &RechargeId) -> Result<Vec<Reservation>, StorageError>;

    /// Deletes every reservation for the recharge and returns the number removed. Releasing a recharge that holds
    /// nothing is not an error.
    async fn release(&self, recharge_id: &RechargeId) -> Result<u64, StorageError>;

    /// Deletes all expired reservations and returns the number removed.
    async fn purge_expired(&self) -> Result<u64, StorageError>;
}
