use micropay_engine::db_types::{Account, Recharge, Wallet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPaymentRequest {
    pub units: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPaymentResponse {
    pub client_secret: String,
    pub recharge: Recharge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteParams {
    pub units: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountResponse {
    pub account: Account,
    pub wallet: Wallet,
}

/// The body of every webhook acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn success() -> Self {
        Self { status: "success".to_string() }
    }
}
