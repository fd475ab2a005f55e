use micropay_common::Amount;
use serde::{Deserialize, Serialize};

use crate::db_types::{AccountId, Recharge, RechargeId};

/// A request to the card payment processor to collect `amount` from the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: Amount,
    pub currency: String,
    pub recharge_id: RechargeId,
    pub account_id: AccountId,
    /// Repeated requests with the same key must not create a second intent.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// The client-facing result of a successful `init_payment` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHandle {
    pub client_secret: String,
    pub recharge: Recharge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    PaymentSucceeded,
    PaymentFailed,
    /// Any event type the settlement handler has no interest in. It is acknowledged and dropped.
    Other(String),
}

/// A verified notification from the payment processor, reduced to the fields that settlement needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub kind: NotificationKind,
    pub intent_id: String,
    pub recharge_id: Option<RechargeId>,
    pub account_id: Option<AccountId>,
}

impl PaymentNotification {
    pub fn succeeded(intent_id: &str, recharge_id: &RechargeId) -> Self {
        Self {
            kind: NotificationKind::PaymentSucceeded,
            intent_id: intent_id.to_string(),
            recharge_id: Some(recharge_id.clone()),
            account_id: None,
        }
    }

    pub fn failed(intent_id: &str, recharge_id: &RechargeId) -> Self {
        Self {
            kind: NotificationKind::PaymentFailed,
            intent_id: intent_id.to_string(),
            recharge_id: Some(recharge_id.clone()),
            account_id: None,
        }
    }
}

/// What the settlement handler did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Funds were transferred and the recharge is now `COMPLETED`.
    Completed(Recharge),
    /// The recharge was moved to `FAILED` and its reservation released.
    Failed(Recharge),
    /// The recharge had already reached a terminal state, or is unknown. Nothing was changed.
    Duplicate(RechargeId),
    /// The notification carried no recharge id, or is of a kind that settlement ignores.
    Ignored,
}
