use log::*;
use micropay_common::Amount;
use reqwest::Method;

use super::{
    data_objects::{DataEnvelope, TokenBalances, TransferCreated, TransferRequest},
    CircleApi,
};
use crate::GatewayApiError;

const TRANSFER_FEE_LEVEL: &str = "MEDIUM";

impl CircleApi {
    pub async fn wallet_balances(&self, wallet_id: &str) -> Result<TokenBalances, GatewayApiError> {
        let path = format!("/w3s/wallets/{wallet_id}/balances");
        let result = self.rest_query::<DataEnvelope<TokenBalances>, ()>(Method::GET, &path, &[], None).await?;
        Ok(result.data)
    }

    /// The treasury wallet's USDC balance. A wallet that holds no USDC at all reports a zero balance.
    pub async fn treasury_balance(&self) -> Result<Amount, GatewayApiError> {
        let config = self.config();
        let balances = self.wallet_balances(&config.master_wallet_id).await?;
        let entry = balances.token_balances.iter().find(|b| b.token.id == config.usdc_token_id);
        let balance = match entry {
            Some(b) => b.amount.parse::<Amount>().map_err(|e| GatewayApiError::InvalidAmount(e.to_string()))?,
            None => {
                warn!("🏦️ Treasury wallet {} holds no token {}", config.master_wallet_id, config.usdc_token_id);
                Amount::zero()
            },
        };
        trace!("🏦️ Treasury balance is {balance} USDC");
        Ok(balance)
    }

    /// Sends `amount` USDC from the treasury wallet to `destination`. Circle deduplicates on `idempotency_key`, which
    /// must be a UUID. Returns Circle's transaction id.
    pub async fn transfer_from_treasury(
        &self,
        destination: &str,
        amount: Amount,
        idempotency_key: &str,
        ref_id: &str,
    ) -> Result<String, GatewayApiError> {
        if amount.is_zero() || amount.is_negative() {
            return Err(GatewayApiError::InvalidAmount(format!("Cannot transfer {amount} USDC")));
        }
        let config = self.config();
        let request = TransferRequest {
            idempotency_key: idempotency_key.to_string(),
            entity_secret_ciphertext: self.entity_secret_ciphertext().await?,
            amounts: vec![amount.to_string()],
            fee_level: TRANSFER_FEE_LEVEL.to_string(),
            token_id: config.usdc_token_id.clone(),
            wallet_id: config.master_wallet_id.clone(),
            destination_address: destination.to_string(),
            ref_id: ref_id.to_string(),
        };
        debug!("🏦️ Transferring {amount} USDC to {destination}");
        let result = self
            .rest_query::<DataEnvelope<TransferCreated>, _>(
                Method::POST,
                "/w3s/developer/transactions/transfer",
                &[],
                Some(request),
            )
            .await?;
        let transfer = result.data;
        info!("🏦️ Transfer {} of {amount} USDC to {destination} is {:?}", transfer.id, transfer.state);
        Ok(transfer.id)
    }
}
