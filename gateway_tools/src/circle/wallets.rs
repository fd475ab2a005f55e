use log::*;
use reqwest::Method;

use super::{
    data_objects::{CreateWalletsRequest, DataEnvelope, WalletMetadata, WalletsCreated},
    CircleApi,
    CircleWallet,
};
use crate::GatewayApiError;

impl CircleApi {
    /// Creates a single custodial wallet in the configured wallet set. Repeating the call with the same
    /// `idempotency_key` (a UUID) returns the original wallet.
    pub async fn create_wallet(
        &self,
        idempotency_key: &str,
        label: &str,
        ref_id: &str,
    ) -> Result<CircleWallet, GatewayApiError> {
        let config = self.config();
        let request = CreateWalletsRequest {
            idempotency_key: idempotency_key.to_string(),
            blockchains: vec![config.blockchain.clone()],
            entity_secret_ciphertext: self.entity_secret_ciphertext().await?,
            wallet_set_id: config.wallet_set_id.clone(),
            account_type: config.account_type.clone(),
            count: 1,
            metadata: vec![WalletMetadata { name: label.to_string(), ref_id: ref_id.to_string() }],
        };
        debug!("🏦️ Creating {} wallet '{label}'", config.blockchain);
        let result = self
            .rest_query::<DataEnvelope<WalletsCreated>, _>(Method::POST, "/w3s/developer/wallets", &[], Some(request))
            .await?;
        let wallet = result
            .data
            .wallets
            .into_iter()
            .next()
            .ok_or_else(|| GatewayApiError::EmptyResponse("Circle created no wallets".into()))?;
        info!("🏦️ Created wallet {} at {}", wallet.id, wallet.address);
        Ok(wallet)
    }
}
