use log::*;
use micropay_common::{
    helpers::{env_or_default, required_env},
    Secret,
};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_CIRCLE_BASE_URL: &str = "https://api.circle.com/v1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Maximum age, in seconds, of a webhook signature timestamp
    pub webhook_tolerance_secs: i64,
    pub timeout_secs: u64,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env_or_default("MICROPAY_STRIPE_API_URL", DEFAULT_STRIPE_API_URL.to_string());
        let secret_key = Secret::new(required_env("MICROPAY_STRIPE_SECRET_KEY"));
        let webhook_secret = Secret::new(required_env("MICROPAY_STRIPE_WEBHOOK_SECRET"));
        let webhook_tolerance_secs =
            env_or_default("MICROPAY_STRIPE_WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS);
        let timeout_secs = env_or_default("MICROPAY_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS);
        if !secret_key.reveal().starts_with("sk_") {
            warn!("🪛️ MICROPAY_STRIPE_SECRET_KEY does not look like a Stripe secret key");
        }
        Self { api_url, secret_key, webhook_secret, webhook_tolerance_secs, timeout_secs }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CircleConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    /// 32-byte hex-encoded entity secret. It is encrypted afresh for every state-changing request.
    pub entity_secret: Secret<String>,
    /// The treasury wallet that funds recharges
    pub master_wallet_id: String,
    pub usdc_token_id: String,
    /// New custodial wallets are created in this wallet set
    pub wallet_set_id: String,
    pub blockchain: String,
    pub account_type: String,
    pub timeout_secs: u64,
}

impl CircleConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = env_or_default("MICROPAY_CIRCLE_BASE_URL", DEFAULT_CIRCLE_BASE_URL.to_string());
        let api_key = Secret::new(required_env("MICROPAY_CIRCLE_API_KEY"));
        let entity_secret = Secret::new(required_env("MICROPAY_CIRCLE_ENTITY_SECRET"));
        let master_wallet_id = required_env("MICROPAY_CIRCLE_MASTER_WALLET_ID");
        let usdc_token_id = required_env("MICROPAY_CIRCLE_USDC_TOKEN_ID");
        let wallet_set_id = required_env("MICROPAY_CIRCLE_WALLET_SET_ID");
        let blockchain = env_or_default("MICROPAY_CIRCLE_BLOCKCHAIN", "ARC-TESTNET".to_string());
        let account_type = env_or_default("MICROPAY_CIRCLE_ACCOUNT_TYPE", "SCA".to_string());
        let timeout_secs = env_or_default("MICROPAY_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS);
        Self {
            base_url,
            api_key,
            entity_secret,
            master_wallet_id,
            usdc_token_id,
            wallet_set_id,
            blockchain,
            account_type,
            timeout_secs,
        }
    }
}
