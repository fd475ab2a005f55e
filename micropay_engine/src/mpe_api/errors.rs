use micropay_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{AccountId, RechargeId},
    pricing::PricingError,
    traits::{ExternalServiceError, StorageError},
};

#[derive(Debug, Clone, Error)]
pub enum RechargeFlowError {
    #[error("Invalid recharge request. {0}")]
    Validation(#[from] PricingError),
    #[error("Account {0} does not exist")]
    AccountNotFound(AccountId),
    #[error("Recharges are temporarily unavailable. {available} USDC available, {required} USDC required")]
    InsufficientLiquidity { available: Amount, required: Amount },
    #[error("External service failure. {0}")]
    ExternalService(#[from] ExternalServiceError),
    #[error("Database error. {0}")]
    Storage(#[from] StorageError),
}

/// Reasons a `payment_succeeded` notification could not be settled. Apart from `PaidButNotCompleted`, where the funds
/// are already gone, the recharge stays `PENDING` with its reservation intact.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Recharge {recharge_id} was paid, but account {account_id} has no wallet to receive the funds")]
    MissingWallet { recharge_id: RechargeId, account_id: AccountId },
    #[error("Treasury transfer for recharge {recharge_id} failed. {source}")]
    TransferFailed { recharge_id: RechargeId, source: ExternalServiceError },
    #[error("Transfer {transfer_reference} was sent for recharge {recharge_id}, which is now {status}")]
    PaidButNotCompleted { recharge_id: RechargeId, transfer_reference: String, status: String },
    #[error("Database error. {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Error)]
pub enum ProvisioningError {
    #[error("Invalid account details. {0}")]
    Validation(String),
    #[error("An account for {0} already exists")]
    Conflict(String),
    #[error("Could not create the custodial wallet. {0}")]
    WalletProvider(#[from] ExternalServiceError),
    #[error("Database error. {0}")]
    Storage(#[from] StorageError),
}
