//! Capabilities of the external services that the engine drives.
//!
//! The engine never talks to a payment processor or custodian directly. It is handed implementations of these traits
//! when the APIs are constructed, which keeps the orchestration logic independent of any particular provider and lets
//! tests substitute fakes.
use micropay_common::Amount;
use thiserror::Error;

use crate::{
    db_types::NewWallet,
    traits::data_objects::{PaymentIntent, PaymentIntentRequest},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalServiceError {
    #[error("Could not reach {service}. {message}")]
    Unavailable { service: String, message: String },
    #[error("{service} rejected the request. {message}")]
    Rejected { service: String, message: String },
    #[error("{service} returned an unexpected response. {message}")]
    InvalidResponse { service: String, message: String },
}

impl ExternalServiceError {
    pub fn unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Unavailable { service: service.into(), message: message.into() }
    }

    pub fn rejected<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Rejected { service: service.into(), message: message.into() }
    }

    pub fn invalid_response<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::InvalidResponse { service: service.into(), message: message.into() }
    }
}

/// The custodial treasury that holds the liquidity asset.
#[allow(async_fn_in_trait)]
pub trait TreasuryGateway {
    /// The physical balance of the treasury wallet.
    async fn balance(&self) -> Result<Amount, ExternalServiceError>;

    /// Sends `amount` to `destination`. This is irreversible. Repeating the call with the same `idempotency_key` must
    /// not send the funds twice. Returns the custodian's transfer reference.
    async fn transfer(
        &self,
        destination: &str,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<String, ExternalServiceError>;
}

/// The card payment processor.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, ExternalServiceError>;

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), ExternalServiceError>;
}

/// Creates custodial on-chain wallets for new accounts.
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    /// Repeating the call with the same `idempotency_key` must return the same wallet rather than a new one.
    async fn create_wallet(&self, idempotency_key: &str, label: &str) -> Result<NewWallet, ExternalServiceError>;
}
