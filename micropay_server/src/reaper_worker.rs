use log::*;
use micropay_engine::{traits::ReservationLedger, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the reservation reaper, which deletes lapsed liquidity reservations every `interval_secs` seconds.
/// Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Expired reservations are already ignored by the headroom calculation, so the reaper only keeps the table small.
pub fn start_reaper_worker(db: SqliteDatabase, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        info!("🕰️ Reservation reaper started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running reservation reaper");
            match db.purge_expired().await {
                Ok(0) => trace!("🕰️ No expired reservations"),
                Ok(n) => info!("🕰️ {n} expired reservations removed"),
                Err(e) => error!("🕰️ Error running the reservation reaper: {e}"),
            }
        }
    })
}
