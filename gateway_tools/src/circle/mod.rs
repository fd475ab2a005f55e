//! Circle developer-controlled wallets client.
//!
//! Every state-changing request must carry an `entitySecretCiphertext`: the 32-byte entity secret, encrypted with
//! RSA-OAEP (SHA-256) under Circle's entity public key and base64-encoded. A fresh ciphertext is produced for each
//! request. The public key is fetched once and then cached for the lifetime of the client.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use rsa::{pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey, Oaep, RsaPublicKey};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use tokio::sync::OnceCell;

use crate::{config::CircleConfig, GatewayApiError};

mod data_objects;
mod treasury;
mod wallets;

use data_objects::{DataEnvelope, PublicKeyData};
pub use data_objects::{CircleToken, CircleTokenBalance, CircleWallet, TokenBalances};

const ENTITY_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct CircleApi {
    config: CircleConfig,
    client: Arc<Client>,
    public_key: Arc<OnceCell<RsaPublicKey>>,
}

impl CircleApi {
    pub fn new(config: CircleConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), public_key: Arc::new(OnceCell::new()) })
    }

    pub fn config(&self) -> &CircleConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("🏦️ Sending Circle request: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🏦️ Circle request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    async fn entity_public_key(&self) -> Result<&RsaPublicKey, GatewayApiError> {
        self.public_key
            .get_or_try_init(|| async {
                debug!("🏦️ Fetching the entity public key");
                let result = self
                    .rest_query::<DataEnvelope<PublicKeyData>, ()>(Method::GET, "/w3s/config/entity/publicKey", &[], None)
                    .await?;
                parse_public_key(&result.data.public_key)
            })
            .await
    }

    /// Encrypts the entity secret for a single request.
    pub async fn entity_secret_ciphertext(&self) -> Result<String, GatewayApiError> {
        let key = self.entity_public_key().await?;
        encrypt_entity_secret(key, self.config.entity_secret.reveal())
    }
}

pub(crate) fn parse_public_key(pem: &str) -> Result<RsaPublicKey, GatewayApiError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| GatewayApiError::Encryption(format!("Invalid entity public key. {e}")))
}

pub(crate) fn encrypt_entity_secret(key: &RsaPublicKey, entity_secret: &str) -> Result<String, GatewayApiError> {
    let secret = hex::decode(entity_secret.trim())
        .map_err(|e| GatewayApiError::Encryption(format!("The entity secret is not valid hex. {e}")))?;
    if secret.len() != ENTITY_SECRET_LEN {
        return Err(GatewayApiError::Encryption(format!(
            "The entity secret must be {ENTITY_SECRET_LEN} bytes, not {}",
            secret.len()
        )));
    }
    let mut rng = rand::thread_rng();
    let ciphertext = key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), &secret)
        .map_err(|e| GatewayApiError::Encryption(e.to_string()))?;
    Ok(base64::encode(ciphertext))
}
