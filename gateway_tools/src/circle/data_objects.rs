use serde::{Deserialize, Serialize};

/// Every Circle response wraps its payload in a `data` field.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyData {
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalances {
    #[serde(default)]
    pub token_balances: Vec<CircleTokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleTokenBalance {
    pub token: CircleToken,
    /// Decimal string, in whole token units
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleToken {
    pub id: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub idempotency_key: String,
    pub entity_secret_ciphertext: String,
    pub amounts: Vec<String>,
    pub fee_level: String,
    pub token_id: String,
    pub wallet_id: String,
    pub destination_address: String,
    pub ref_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferCreated {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletsRequest {
    pub idempotency_key: String,
    pub blockchains: Vec<String>,
    pub entity_secret_ciphertext: String,
    pub wallet_set_id: String,
    pub account_type: String,
    pub count: u32,
    pub metadata: Vec<WalletMetadata>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMetadata {
    pub name: String,
    pub ref_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletsCreated {
    #[serde(default)]
    pub wallets: Vec<CircleWallet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleWallet {
    pub id: String,
    pub address: String,
    pub blockchain: String,
    pub account_type: String,
    pub state: String,
}
