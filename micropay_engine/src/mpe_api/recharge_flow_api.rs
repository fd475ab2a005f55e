use std::fmt::Debug;

use log::*;
use micropay_common::{Amount, DEFAULT_CURRENCY};
use rust_decimal::Decimal;

use crate::{
    db_types::{AccountId, NewRecharge, RechargeId},
    mpe_api::errors::RechargeFlowError,
    pricing::{PricingEngine, Quote},
    traits::{PaymentGateway, PaymentHandle, PaymentIntentRequest, RechargeDatabase, TreasuryGateway},
};

/// Admission parameters for new recharges.
#[derive(Debug, Clone)]
pub struct RechargePolicy {
    /// Liquidity that must remain unreserved on top of every new reservation
    pub safety_margin: Amount,
    /// ISO currency code the payer is charged in
    pub currency: String,
}

impl Default for RechargePolicy {
    fn default() -> Self {
        Self { safety_margin: Amount::new(Decimal::new(1, 1)), currency: DEFAULT_CURRENCY.to_string() }
    }
}

/// Forward steps of a recharge that have side effects, in the order they happen. Each one is undone by
/// [`RechargeFlowApi::compensate`] if a later step fails.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RechargeStep {
    /// The `PENDING` recharge and its reservation are in the database.
    Persisted(RechargeId),
    /// The payment processor holds an open intent for the recharge.
    IntentCreated(String),
}

/// `RechargeFlowApi` turns a request for credit units into a priced, liquidity-backed, payable recharge.
///
/// The flow runs through these stages:
/// 1. Quote the request.
/// 2. Check that the treasury has enough unreserved liquidity, plus a safety margin. Nothing is written if it doesn't.
/// 3. Store the `PENDING` recharge and its reservation in one transaction.
/// 4. Open a payment intent for the quoted total.
/// 5. Record the intent on the recharge.
///
/// If any stage from 3 onwards fails, the completed stages are undone in reverse order (the intent is cancelled, the
/// reservation is released and the recharge is marked `FAILED`) and the original error is returned.
pub struct RechargeFlowApi<B, P, T> {
    db: B,
    payments: P,
    treasury: T,
    pricing: PricingEngine,
    policy: RechargePolicy,
}

impl<B, P, T> Debug for RechargeFlowApi<B, P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RechargeFlowApi ({:?})", self.policy)
    }
}

impl<B, P, T> RechargeFlowApi<B, P, T> {
    pub fn new(db: B, payments: P, treasury: T, pricing: PricingEngine, policy: RechargePolicy) -> Self {
        Self { db, payments, treasury, pricing, policy }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn policy(&self) -> &RechargePolicy {
        &self.policy
    }
}

impl<B, P, T> RechargeFlowApi<B, P, T>
where
    B: RechargeDatabase,
    P: PaymentGateway,
    T: TreasuryGateway,
{
    /// Prices `units` without reserving anything.
    pub fn quote(&self, units: i64) -> Result<Quote, RechargeFlowError> {
        let quote = self.pricing.calculate(units)?;
        Ok(quote)
    }

    /// Treasury balance minus all unexpired reservations.
    ///
    /// The two figures are not read under a common lock, so concurrent callers may both see the same headroom. The
    /// safety margin and the short reservation window bound the resulting over-commitment.
    pub async fn headroom(&self) -> Result<Amount, RechargeFlowError> {
        let balance = self.treasury.balance().await?;
        let reserved = self.db.total_reserved().await?;
        trace!("🔄️💧️ Treasury balance: {balance} USDC. Reserved: {reserved} USDC");
        Ok(balance - reserved)
    }

    pub async fn init_payment(&self, account_id: &AccountId, units: i64) -> Result<PaymentHandle, RechargeFlowError> {
        let quote = self.pricing.calculate(units).map_err(|e| {
            warn!("🔄️💳️ Rejected recharge request from {account_id}. {e}");
            e
        })?;
        if self.db.fetch_account(account_id).await?.is_none() {
            return Err(RechargeFlowError::AccountNotFound(account_id.clone()));
        }
        let available = self.headroom().await?;
        let required = quote.usdc_value + self.policy.safety_margin;
        if available < required {
            warn!("🔄️💧️ Not enough liquidity for {units} units. {available} USDC available, {required} required");
            return Err(RechargeFlowError::InsufficientLiquidity { available, required });
        }
        let recharge = NewRecharge::new(account_id.clone(), quote, &self.policy.currency);
        let mut completed = Vec::with_capacity(2);
        match self.run_recharge_steps(recharge, &mut completed).await {
            Ok(handle) => {
                info!(
                    "🔄️💳️ Recharge [{}] created for {account_id}: {} units for {} {}",
                    handle.recharge.id, handle.recharge.units, handle.recharge.total_paid, handle.recharge.currency
                );
                Ok(handle)
            },
            Err(e) => {
                error!("🔄️💳️ Recharge for {account_id} failed after {} steps. {e}. Compensating.", completed.len());
                self.compensate(completed).await;
                Err(e)
            },
        }
    }

    async fn run_recharge_steps(
        &self,
        recharge: NewRecharge,
        completed: &mut Vec<RechargeStep>,
    ) -> Result<PaymentHandle, RechargeFlowError> {
        let (saved, reservation) = self.db.insert_recharge_with_reservation(recharge).await?;
        completed.push(RechargeStep::Persisted(saved.id.clone()));
        trace!("🔄️💳️ Recharge [{}] persisted with {} USDC reserved", saved.id, reservation.amount);

        let request = PaymentIntentRequest {
            amount: saved.total_paid,
            currency: saved.currency.clone(),
            recharge_id: saved.id.clone(),
            account_id: saved.account_id.clone(),
            idempotency_key: saved.id.to_string(),
        };
        let intent = self.payments.create_intent(request).await?;
        completed.push(RechargeStep::IntentCreated(intent.intent_id.clone()));
        trace!("🔄️💳️ Payment intent {} created for recharge [{}]", intent.intent_id, saved.id);

        let recharge = self.db.set_payment_intent(&saved.id, &intent.intent_id).await?;
        Ok(PaymentHandle { client_secret: intent.client_secret, recharge })
    }

    /// Undoes completed steps, most recent first. Failures here are logged and otherwise ignored, since the caller is
    /// already handling the original error. Anything left behind is a `PENDING` recharge whose reservation lapses on
    /// its own.
    async fn compensate(&self, completed: Vec<RechargeStep>) {
        for step in completed.into_iter().rev() {
            match step {
                RechargeStep::IntentCreated(intent_id) => match self.payments.cancel_intent(&intent_id).await {
                    Ok(()) => debug!("🔄️↩️ Payment intent {intent_id} cancelled"),
                    Err(e) => warn!("🔄️↩️ Could not cancel payment intent {intent_id}. {e}"),
                },
                RechargeStep::Persisted(id) => match self.db.fail_recharge(&id).await {
                    Ok(_) => info!("🔄️↩️ Recharge [{id}] marked as FAILED and its reservation released"),
                    Err(e) => error!("🔄️↩️ Could not roll back recharge [{id}]. It will stay PENDING. {e}"),
                },
            }
        }
    }
}
