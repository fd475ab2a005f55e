use serde::{Deserialize, Serialize};

use crate::db_types::{Account, AccountId, Recharge, RechargeId, Wallet};

/// Published after an account and its custodial wallet have been committed. Subscribers perform the secondary,
/// best-effort onboarding steps (e.g. sending a verification code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreatedEvent {
    pub account: Account,
    pub wallet: Wallet,
}

impl AccountCreatedEvent {
    pub fn new(account: Account, wallet: Wallet) -> Self {
        Self { account, wallet }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeCompletedEvent {
    pub recharge: Recharge,
}

impl RechargeCompletedEvent {
    pub fn new(recharge: Recharge) -> Self {
        Self { recharge }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// A payment succeeded for an account that has no wallet to deliver to.
    MissingWallet,
    /// The treasury transfer for a paid recharge failed.
    TransferFailed,
    /// The settlement state could not be read or written.
    StorageFailure,
    /// Funds were transferred, but the recharge had meanwhile been failed or removed.
    PaidButNotCompleted,
}

/// Raised whenever a paid recharge could not be settled and needs operator attention. Unless the funds have already
/// gone out, the recharge stays `PENDING` and keeps its reservation until it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAlertEvent {
    pub kind: AlertKind,
    pub recharge_id: RechargeId,
    pub account_id: Option<AccountId>,
    pub message: String,
}

impl SettlementAlertEvent {
    pub fn new(kind: AlertKind, recharge_id: RechargeId, account_id: Option<AccountId>, message: String) -> Self {
        Self { kind, recharge_id, account_id, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    AccountCreated(AccountCreatedEvent),
    RechargeCompleted(RechargeCompletedEvent),
    SettlementAlert(SettlementAlertEvent),
}
