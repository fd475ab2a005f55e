use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Recharge, RechargeId, RechargeStatusType},
    events::{AlertKind, EventProducers, RechargeCompletedEvent, SettlementAlertEvent},
    mpe_api::errors::SettlementError,
    traits::{NotificationKind, PaymentNotification, RechargeDatabase, SettlementOutcome, TreasuryGateway},
};

/// `SettlementApi` reacts to payment processor notifications and drives recharges to their final state.
///
/// Notifications may arrive more than once and in any order. Only a `PENDING` recharge is ever acted on, so repeated
/// or late deliveries are harmless no-ops. Funds are transferred before the recharge is marked `COMPLETED`, and the
/// reservation is released only after that.
pub struct SettlementApi<B, T> {
    db: B,
    treasury: T,
    producers: EventProducers,
}

impl<B, T> Debug for SettlementApi<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, T> SettlementApi<B, T> {
    pub fn new(db: B, treasury: T, producers: EventProducers) -> Self {
        Self { db, treasury, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, T> SettlementApi<B, T>
where
    B: RechargeDatabase,
    T: TreasuryGateway,
{
    pub async fn process_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<SettlementOutcome, SettlementError> {
        let PaymentNotification { kind, intent_id, recharge_id, .. } = notification;
        match (kind, recharge_id) {
            (NotificationKind::PaymentSucceeded, Some(id)) => self.payment_succeeded(&id).await,
            (NotificationKind::PaymentFailed, Some(id)) => self.payment_failed(&id).await,
            (NotificationKind::Other(event_type), _) => {
                debug!("🔄️🧾️ Ignoring {event_type} notification for intent {intent_id}");
                Ok(SettlementOutcome::Ignored)
            },
            (kind, None) => {
                warn!("🔄️🧾️ {kind:?} notification for intent {intent_id} carries no recharge id. Ignoring it.");
                Ok(SettlementOutcome::Ignored)
            },
        }
    }

    /// Delivers the purchased liquidity for a paid recharge.
    pub async fn payment_succeeded(&self, id: &RechargeId) -> Result<SettlementOutcome, SettlementError> {
        let recharge = match self.db.fetch_recharge(id).await? {
            Some(r) if r.status == RechargeStatusType::Pending => r,
            Some(r) => {
                info!("🔄️🧾️ Recharge [{id}] is already {}. Duplicate payment notification ignored.", r.status);
                return Ok(SettlementOutcome::Duplicate(id.clone()));
            },
            None => {
                warn!("🔄️🧾️ Payment succeeded for unknown recharge [{id}]. Ignoring it.");
                return Ok(SettlementOutcome::Duplicate(id.clone()));
            },
        };
        let wallet = match self.db.fetch_wallet_for_account(&recharge.account_id).await? {
            Some(w) => w,
            None => {
                let err =
                    SettlementError::MissingWallet { recharge_id: id.clone(), account_id: recharge.account_id.clone() };
                self.raise_alert(AlertKind::MissingWallet, &recharge, err.to_string()).await;
                return Err(err);
            },
        };
        let amount = recharge.amount_usdc_value;
        trace!("🔄️🧾️ Sending {amount} USDC to {} for recharge [{id}]", wallet.address);
        let transfer_reference = match self.treasury.transfer(&wallet.address, amount, id.as_str()).await {
            Ok(r) => r,
            Err(source) => {
                let err = SettlementError::TransferFailed { recharge_id: id.clone(), source };
                self.raise_alert(AlertKind::TransferFailed, &recharge, err.to_string()).await;
                return Err(err);
            },
        };
        info!("🔄️🧾️ Transfer {transfer_reference} of {amount} USDC sent for recharge [{id}]");
        let completed = match self.db.complete_recharge(id, &transfer_reference).await {
            Ok(Some(r)) => r,
            Ok(None) => return self.transferred_but_not_pending(&recharge, transfer_reference).await,
            Err(e) => {
                let message =
                    format!("Transfer {transfer_reference} was sent, but the recharge could not be updated. {e}");
                self.raise_alert(AlertKind::StorageFailure, &recharge, message).await;
                return Err(e.into());
            },
        };
        match self.db.release(id).await {
            Ok(n) => debug!("🔄️🧾️ Released {n} reservations for completed recharge [{id}]"),
            Err(e) => warn!("🔄️🧾️ Could not release the reservation for recharge [{id}]. It will lapse on its own. {e}"),
        }
        self.call_recharge_completed_hook(&completed).await;
        Ok(SettlementOutcome::Completed(completed))
    }

    /// Marks a recharge `FAILED` if it is still `PENDING`, and releases its reservation in any case.
    pub async fn payment_failed(&self, id: &RechargeId) -> Result<SettlementOutcome, SettlementError> {
        match self.db.fail_recharge(id).await? {
            Some(recharge) => {
                info!("🔄️🧾️ Payment failed. Recharge [{id}] is now FAILED and its liquidity released");
                Ok(SettlementOutcome::Failed(recharge))
            },
            None => {
                debug!("🔄️🧾️ Payment failure for recharge [{id}], which is not PENDING. Nothing to do.");
                Ok(SettlementOutcome::Duplicate(id.clone()))
            },
        }
    }

    /// The recharge left `PENDING` while its funds were in flight. That is fine if a concurrent notification completed
    /// it. Anything else means the funds went out for a recharge that is closed, and an operator has to reconcile it.
    async fn transferred_but_not_pending(
        &self,
        recharge: &Recharge,
        transfer_reference: String,
    ) -> Result<SettlementOutcome, SettlementError> {
        let id = &recharge.id;
        let status = match self.db.fetch_recharge(id).await {
            Ok(Some(r)) if r.status == RechargeStatusType::Completed => {
                info!("🔄️🧾️ Recharge [{id}] was settled by a concurrent notification.");
                return Ok(SettlementOutcome::Duplicate(id.clone()));
            },
            Ok(Some(r)) => r.status.to_string(),
            Ok(None) => "missing".to_string(),
            Err(e) => format!("unreadable ({e})"),
        };
        let err = SettlementError::PaidButNotCompleted { recharge_id: id.clone(), transfer_reference, status };
        self.raise_alert(AlertKind::PaidButNotCompleted, recharge, err.to_string()).await;
        Err(err)
    }

    async fn raise_alert(&self, kind: AlertKind, recharge: &Recharge, message: String) {
        error!("🚨️ Settlement of recharge [{}] needs operator attention. {message}", recharge.id);
        for emitter in &self.producers.settlement_alert_producer {
            let event =
                SettlementAlertEvent::new(kind, recharge.id.clone(), Some(recharge.account_id.clone()), message.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_recharge_completed_hook(&self, recharge: &Recharge) {
        for emitter in &self.producers.recharge_completed_producer {
            debug!("🔄️🧾️ Notifying recharge completed hook subscribers");
            emitter.publish_event(RechargeCompletedEvent::new(recharge.clone())).await;
        }
    }
}
