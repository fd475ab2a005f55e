use micropay_common::Amount;
use micropay_engine::{
    db_types::NewWallet,
    traits::{
        ExternalServiceError,
        PaymentGateway,
        PaymentIntent,
        PaymentIntentRequest,
        TreasuryGateway,
        WalletProvider,
    },
};
use mockall::mock;

mock! {
    pub PaymentGateway {}
    impl PaymentGateway for PaymentGateway {
        async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, ExternalServiceError>;
        async fn cancel_intent(&self, intent_id: &str) -> Result<(), ExternalServiceError>;
    }
}

mock! {
    pub TreasuryGateway {}
    impl TreasuryGateway for TreasuryGateway {
        async fn balance(&self) -> Result<Amount, ExternalServiceError>;
        async fn transfer(
            &self,
            destination: &str,
            amount: Amount,
            idempotency_key: &str,
        ) -> Result<String, ExternalServiceError>;
    }
}

mock! {
    pub WalletProvider {}
    impl WalletProvider for WalletProvider {
        async fn create_wallet(&self, idempotency_key: &str, label: &str) -> Result<NewWallet, ExternalServiceError>;
    }
}
