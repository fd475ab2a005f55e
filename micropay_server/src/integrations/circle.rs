use gateway_tools::CircleApi;
use log::*;
use micropay_common::Amount;
use micropay_engine::{
    db_types::NewWallet,
    traits::{ExternalServiceError, TreasuryGateway, WalletProvider},
};

use super::service_error;

const SERVICE: &str = "Circle";

/// [`TreasuryGateway`] backed by the Circle treasury wallet.
#[derive(Clone)]
pub struct CircleTreasury {
    api: CircleApi,
}

impl CircleTreasury {
    pub fn new(api: CircleApi) -> Self {
        Self { api }
    }
}

impl TreasuryGateway for CircleTreasury {
    async fn balance(&self) -> Result<Amount, ExternalServiceError> {
        self.api.treasury_balance().await.map_err(|e| service_error(SERVICE, e))
    }

    async fn transfer(
        &self,
        destination: &str,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<String, ExternalServiceError> {
        let ref_id = format!("recharge_{idempotency_key}");
        self.api
            .transfer_from_treasury(destination, amount, idempotency_key, &ref_id)
            .await
            .map_err(|e| service_error(SERVICE, e))
    }
}

/// [`WalletProvider`] that creates Circle developer-controlled wallets.
#[derive(Clone)]
pub struct CircleWalletProvider {
    api: CircleApi,
}

impl CircleWalletProvider {
    pub fn new(api: CircleApi) -> Self {
        Self { api }
    }
}

impl WalletProvider for CircleWalletProvider {
    async fn create_wallet(&self, idempotency_key: &str, label: &str) -> Result<NewWallet, ExternalServiceError> {
        let ref_id = wallet_ref_id(idempotency_key);
        trace!("🏦️ Requesting wallet {ref_id}");
        let wallet =
            self.api.create_wallet(idempotency_key, label, &ref_id).await.map_err(|e| service_error(SERVICE, e))?;
        Ok(NewWallet {
            external_id: wallet.id,
            address: wallet.address,
            blockchain: wallet.blockchain,
            account_type: wallet.account_type,
            state: wallet.state,
        })
    }
}

fn wallet_ref_id(account_key: &str) -> String {
    let short = account_key.get(..8).unwrap_or(account_key);
    format!("user_{short}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wallet_ref_ids() {
        assert_eq!(wallet_ref_id("6b2e0d14-8a4f-4f0e-a1f2-0c9b8e7d6a51"), "user_6b2e0d14");
        assert_eq!(wallet_ref_id("abc"), "user_abc");
    }
}
