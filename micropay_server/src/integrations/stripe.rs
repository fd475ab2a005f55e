use std::str::FromStr;

use gateway_tools::{
    stripe::{
        webhook::{StripeEvent, PAYMENT_FAILED, PAYMENT_SUCCEEDED},
        ACCOUNT_ID_METADATA_KEY,
        RECHARGE_ID_METADATA_KEY,
    },
    NewPaymentIntent,
    StripeApi,
    WebhookError,
};
use log::*;
use micropay_engine::{
    db_types::{AccountId, RechargeId},
    traits::{
        ExternalServiceError,
        NotificationKind,
        PaymentGateway,
        PaymentIntent,
        PaymentIntentRequest,
        PaymentNotification,
    },
};

use super::service_error;

const SERVICE: &str = "Stripe";

/// [`PaymentGateway`] backed by Stripe payment intents.
#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(api: StripeApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, ExternalServiceError> {
        let intent = NewPaymentIntent {
            amount: request.amount,
            currency: request.currency,
            metadata: vec![
                (RECHARGE_ID_METADATA_KEY.to_string(), request.recharge_id.to_string()),
                (ACCOUNT_ID_METADATA_KEY.to_string(), request.account_id.to_string()),
            ],
            idempotency_key: request.idempotency_key,
        };
        let result = self.api.create_payment_intent(&intent).await.map_err(|e| service_error(SERVICE, e))?;
        let client_secret = result
            .client_secret
            .ok_or_else(|| ExternalServiceError::invalid_response(SERVICE, "No client secret in payment intent"))?;
        Ok(PaymentIntent { intent_id: result.id, client_secret })
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), ExternalServiceError> {
        self.api.cancel_payment_intent(intent_id).await.map_err(|e| service_error(SERVICE, e))?;
        Ok(())
    }
}

/// Reduces a verified Stripe event to the fields settlement needs.
pub fn notification_from_event(event: &StripeEvent) -> Result<PaymentNotification, WebhookError> {
    let kind = match event.event_type.as_str() {
        PAYMENT_SUCCEEDED => NotificationKind::PaymentSucceeded,
        PAYMENT_FAILED => NotificationKind::PaymentFailed,
        other => {
            let intent_id = event.data.object.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            return Ok(PaymentNotification {
                kind: NotificationKind::Other(other.to_string()),
                intent_id,
                recharge_id: None,
                account_id: None,
            });
        },
    };
    let intent = event.payment_intent()?;
    let recharge_id = intent.metadata_value(RECHARGE_ID_METADATA_KEY).and_then(|s| {
        RechargeId::from_str(s)
            .map_err(|e| warn!("💳️ Payment intent {} carries an invalid recharge id. {e}", intent.id))
            .ok()
    });
    let account_id = intent.metadata_value(ACCOUNT_ID_METADATA_KEY).and_then(|s| AccountId::from_str(s).ok());
    Ok(PaymentNotification { kind, intent_id: intent.id, recharge_id, account_id })
}
