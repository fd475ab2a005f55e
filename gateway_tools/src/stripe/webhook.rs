//! Authentication and parsing of Stripe webhook notifications.
//!
//! Stripe signs every webhook with the endpoint's signing secret. The `Stripe-Signature` header looks like
//! `t=1492774577,v1=5257a8...,v1=...`, where each `v1` value is the hex-encoded HMAC-SHA256 of `"{t}.{raw body}"`.
//! A request is accepted if any `v1` signature matches and `t` lies within the tolerance window.
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::{stripe::StripePaymentIntent, WebhookError};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    let t = value.parse::<i64>().map_err(|e| WebhookError::MalformedHeader(format!("t={value}. {e}")))?;
                    timestamp = Some(t);
                },
                "v1" => match hex::decode(value) {
                    Ok(sig) => signatures.push(sig),
                    Err(e) => debug!("🔐️ Skipping undecodable v1 signature. {e}"),
                },
                _ => {},
            }
        }
        let timestamp = timestamp.ok_or_else(|| WebhookError::MalformedHeader("no timestamp".into()))?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader("no v1 signatures".into()));
        }
        Ok(Self { timestamp, signatures })
    }
}

/// Computes the hex-encoded `v1` signature of `payload` at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    let mac = signing_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Checks the `Stripe-Signature` header against the raw request body. `now` is the current unix time in seconds.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), WebhookError> {
    let header = SignatureHeader::parse(header)?;
    if now.abs_diff(header.timestamp) > tolerance_secs.max(0).unsigned_abs() {
        return Err(WebhookError::TimestampOutOfRange);
    }
    let mac = signing_mac(secret, header.timestamp, payload)?;
    if header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok()) {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

impl StripeEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::MalformedEvent(e.to_string()))
    }

    /// The payment intent this event is about, for `payment_intent.*` events.
    pub fn payment_intent(&self) -> Result<StripePaymentIntent, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| WebhookError::MalformedEvent(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","metadata":{"recharge_id":"r1","account_id":"a1"}}}}"#;

    #[test]
    fn valid_signature_is_accepted() {
        let sig = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1={sig}");
        assert_eq!(verify_signature(BODY, &header, SECRET, 300, 1_700_000_100), Ok(()));
    }

    #[test]
    fn any_matching_signature_is_enough() {
        let sig = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000, v1={}, v0=abcd, v1={sig}", "00".repeat(32));
        assert_eq!(verify_signature(BODY, &header, SECRET, 300, 1_700_000_000), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let sig = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1={sig}");
        let tampered = String::from_utf8_lossy(BODY).replace("pi_1", "pi_2");
        assert_eq!(
            verify_signature(tampered.as_bytes(), &header, SECRET, 300, 1_700_000_000),
            Err(WebhookError::SignatureMismatch)
        );
        assert_eq!(verify_signature(BODY, &header, "whsec_other", 300, 1_700_000_000), Err(WebhookError::SignatureMismatch));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let sig = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1={sig}");
        assert_eq!(verify_signature(BODY, &header, SECRET, 300, 1_700_000_301), Err(WebhookError::TimestampOutOfRange));
        assert_eq!(verify_signature(BODY, &header, SECRET, 300, 1_700_000_300), Ok(()));
    }

    #[test]
    fn extreme_timestamps_are_out_of_range() {
        let now = 1_700_000_000;
        for t in [i64::MIN, i64::MAX, -1] {
            let header = format!("t={t},v1=00");
            assert_eq!(verify_signature(BODY, &header, SECRET, 300, now), Err(WebhookError::TimestampOutOfRange));
        }
        let header = "t=-9223372036854775808,v1=00";
        assert_eq!(verify_signature(BODY, header, SECRET, 300, i64::MAX), Err(WebhookError::TimestampOutOfRange));
    }

    #[test]
    fn malformed_headers() {
        assert!(matches!(SignatureHeader::parse("v1=abcd"), Err(WebhookError::MalformedHeader(_))));
        assert!(matches!(SignatureHeader::parse("t=123"), Err(WebhookError::MalformedHeader(_))));
        assert!(matches!(SignatureHeader::parse("t=abc,v1=abcd"), Err(WebhookError::MalformedHeader(_))));
        assert!(matches!(SignatureHeader::parse(""), Err(WebhookError::MalformedHeader(_))));
    }

    #[test]
    fn event_parsing() {
        let event = StripeEvent::parse(BODY).unwrap();
        assert_eq!(event.event_type, PAYMENT_SUCCEEDED);
        let intent = event.payment_intent().unwrap();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.metadata_value("recharge_id"), Some("r1"));
        assert!(StripeEvent::parse(b"not json").is_err());
    }
}
