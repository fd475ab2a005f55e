//! In-memory stand-ins for the treasury, the payment processor and the wallet provider.
//!
//! Each fake is cheaply cloneable and shares its state between clones, so a test can hand one clone to an API and keep
//! another to inspect what happened or to inject failures.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use micropay_common::Amount;

use crate::{
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub reference: String,
    pub destination: String,
    pub amount: Amount,
}

#[derive(Debug, Default)]
struct TreasuryState {
    balance: Amount,
    transfers: HashMap<String, TransferRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTreasury {
    state: Arc<Mutex<TreasuryState>>,
    fail_transfers: Arc<AtomicBool>,
    fail_balance: Arc<AtomicBool>,
}

impl FakeTreasury {
    pub fn with_balance(balance: Amount) -> Self {
        let result = Self::default();
        result.set_balance(balance);
        result
    }

    pub fn set_balance(&self, balance: Amount) {
        self.state.lock().expect("treasury lock poisoned").balance = balance;
    }

    pub fn current_balance(&self) -> Amount {
        self.state.lock().expect("treasury lock poisoned").balance
    }

    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }

    pub fn fail_balance(&self, fail: bool) {
        self.fail_balance.store(fail, Ordering::SeqCst);
    }

    /// The number of distinct transfers actually executed.
    pub fn transfer_count(&self) -> usize {
        self.state.lock().expect("treasury lock poisoned").transfers.len()
    }

    pub fn transfer(&self, idempotency_key: &str) -> Option<TransferRecord> {
        self.state.lock().expect("treasury lock poisoned").transfers.get(idempotency_key).cloned()
    }
}

impl TreasuryGateway for FakeTreasury {
    async fn balance(&self) -> Result<Amount, ExternalServiceError> {
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(ExternalServiceError::unavailable("FakeTreasury", "balance lookup disabled"));
        }
        Ok(self.current_balance())
    }

    async fn transfer(
        &self,
        destination: &str,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<String, ExternalServiceError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(ExternalServiceError::unavailable("FakeTreasury", "transfers disabled"));
        }
        let mut state = self.state.lock().expect("treasury lock poisoned");
        if let Some(existing) = state.transfers.get(idempotency_key) {
            return Ok(existing.reference.clone());
        }
        let reference = format!("tx-{}", state.transfers.len() + 1);
        state.balance -= amount;
        let record = TransferRecord { reference: reference.clone(), destination: destination.to_string(), amount };
        state.transfers.insert(idempotency_key.to_string(), record);
        Ok(reference)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePaymentGateway {
    intents: Arc<Mutex<Vec<PaymentIntentRequest>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
    fail_create: Arc<AtomicBool>,
    counter: Arc<AtomicU64>,
}

impl FakePaymentGateway {
    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn intents(&self) -> Vec<PaymentIntentRequest> {
        self.intents.lock().expect("gateway lock poisoned").clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().expect("gateway lock poisoned").clone()
    }
}

impl PaymentGateway for FakePaymentGateway {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, ExternalServiceError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ExternalServiceError::unavailable("FakePaymentGateway", "intent creation disabled"));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.intents.lock().expect("gateway lock poisoned").push(request);
        Ok(PaymentIntent { intent_id: format!("pi_{n}"), client_secret: format!("pi_{n}_secret") })
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), ExternalServiceError> {
        self.cancelled.lock().expect("gateway lock poisoned").push(intent_id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeWalletProvider {
    wallets: Arc<Mutex<HashMap<String, NewWallet>>>,
    fail: Arc<AtomicBool>,
}

impl FakeWalletProvider {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.lock().expect("wallet lock poisoned").len()
    }
}

impl WalletProvider for FakeWalletProvider {
    async fn create_wallet(&self, idempotency_key: &str, _label: &str) -> Result<NewWallet, ExternalServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExternalServiceError::unavailable("FakeWalletProvider", "wallet creation disabled"));
        }
        let mut wallets = self.wallets.lock().expect("wallet lock poisoned");
        let n = wallets.len() + 1;
        let wallet = wallets
            .entry(idempotency_key.to_string())
            .or_insert_with(|| NewWallet {
                external_id: format!("wallet-{n}"),
                address: format!("0x{n:040x}"),
                blockchain: "ARC-TESTNET".to_string(),
                account_type: "SCA".to_string(),
                state: "LIVE".to_string(),
            })
            .clone();
        Ok(wallet)
    }
}
