//! Stripe REST client.
//!
//! Stripe's API takes `application/x-www-form-urlencoded` request bodies and answers in JSON. Nested parameters are
//! flattened with bracket notation, e.g. `metadata[recharge_id]`.
use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use micropay_common::Amount;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::StripeConfig, GatewayApiError};

pub mod webhook;

pub const RECHARGE_ID_METADATA_KEY: &str = "recharge_id";
pub const ACCOUNT_ID_METADATA_KEY: &str = "account_id";

/// The parameters of a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentIntent {
    pub amount: Amount,
    pub currency: String,
    pub metadata: Vec<(String, String)>,
    pub idempotency_key: String,
}

impl NewPaymentIntent {
    fn form_params(&self) -> Result<Vec<(String, String)>, GatewayApiError> {
        let cents = self.amount.to_minor_units().map_err(|e| GatewayApiError::InvalidAmount(e.to_string()))?;
        if cents <= 0 {
            return Err(GatewayApiError::InvalidAmount(format!("{} is not a chargeable amount", self.amount)));
        }
        let mut params = vec![
            ("amount".to_string(), cents.to_string()),
            ("currency".to_string(), self.currency.to_ascii_lowercase()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        params.extend(self.metadata.iter().map(|(k, v)| (format!("metadata[{k}]"), v.clone())));
        Ok(params)
    }
}

/// The subset of Stripe's PaymentIntent object that the gateway uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub status: String,
    /// In minor currency units
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripePaymentIntent {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn form_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending Stripe request: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.form(params);
        }
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Stripe request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<StripePaymentIntent, GatewayApiError> {
        let params = intent.form_params()?;
        debug!("💳️ Creating payment intent for {} {}", intent.amount, intent.currency);
        let result = self
            .form_query::<StripePaymentIntent>(Method::POST, "/payment_intents", &params, Some(&intent.idempotency_key))
            .await?;
        if result.client_secret.is_none() {
            return Err(GatewayApiError::EmptyResponse(format!("Payment intent {} has no client secret", result.id)));
        }
        info!("💳️ Created payment intent {}", result.id);
        Ok(result)
    }

    pub async fn cancel_payment_intent(&self, intent_id: &str) -> Result<StripePaymentIntent, GatewayApiError> {
        let path = format!("/payment_intents/{intent_id}/cancel");
        debug!("💳️ Cancelling payment intent {intent_id}");
        let result = self.form_query::<StripePaymentIntent>(Method::POST, &path, &[], None).await?;
        info!("💳️ Cancelled payment intent {intent_id}");
        Ok(result)
    }
}
