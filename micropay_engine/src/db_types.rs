use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use micropay_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

use crate::pricing::Quote;

//--------------------------------------     AccountId       ---------------------------------------------------------
/// A lightweight wrapper around the UUID string that identifies a local account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for AccountId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

//--------------------------------------     RechargeId      ---------------------------------------------------------
/// The identifier of a recharge. It doubles as the idempotency key for every external call made on the recharge's
/// behalf (payment intent creation, treasury transfer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RechargeId(pub String);

impl RechargeId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RechargeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RechargeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for RechargeId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

fn parse_uuid(s: &str) -> Result<String, IdParseError> {
    Uuid::parse_str(s.trim()).map(|u| u.to_string()).map_err(|e| IdParseError(format!("{s}. {e}")))
}

//--------------------------------------  RechargeStatusType  --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RechargeStatusType {
    /// The recharge has been created, liquidity is reserved and the payment has not been settled yet.
    Pending,
    /// The payment succeeded and the treasury transfer has been confirmed.
    Completed,
    /// The payment failed, or the recharge could not be set up.
    Failed,
    /// The recharge was withdrawn before payment.
    Cancelled,
}

impl RechargeStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for RechargeStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid recharge status: {0}")]
pub struct RechargeStatusParseError(String);

impl FromStr for RechargeStatusType {
    type Err = RechargeStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(RechargeStatusParseError(s.to_string())),
        }
    }
}

//--------------------------------------      Recharge       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Recharge {
    pub id: RechargeId,
    pub account_id: AccountId,
    pub status: RechargeStatusType,
    pub units: i64,
    pub amount_usdc_value: Amount,
    pub amount_base: Amount,
    pub service_fee: Amount,
    pub tax: Amount,
    pub gateway_fee: Amount,
    pub total_paid: Amount,
    pub currency: String,
    pub payment_intent_id: Option<String>,
    pub transfer_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recharge that has been priced but not yet written to the database.
#[derive(Debug, Clone)]
pub struct NewRecharge {
    pub id: RechargeId,
    pub account_id: AccountId,
    pub quote: Quote,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl NewRecharge {
    pub fn new(account_id: AccountId, quote: Quote, currency: &str) -> Self {
        Self {
            id: RechargeId::new_random(),
            account_id,
            quote,
            currency: currency.to_ascii_lowercase(),
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------     Reservation     ---------------------------------------------------------
/// A time-limited hold on treasury liquidity. Reservations are never modified, only created and deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub recharge_id: RechargeId,
    pub amount: Amount,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

//--------------------------------------       Account       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewAccount {
    pub fn new<S: Into<String>>(email: S, first_name: S, last_name: S) -> Self {
        Self { email: email.into(), first_name: first_name.into(), last_name: last_name.into() }
    }

    /// The human-readable label attached to the account's custodial wallet.
    pub fn wallet_label(&self) -> String {
        format!("{} {} Wallet", self.first_name.trim(), self.last_name.trim())
    }
}

//--------------------------------------       Wallet        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub account_id: AccountId,
    pub external_id: String,
    pub address: String,
    pub blockchain: String,
    pub account_type: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// A custodial wallet as reported by the wallet provider, before it is linked to a local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWallet {
    pub external_id: String,
    pub address: String,
    pub blockchain: String,
    pub account_type: String,
    pub state: String,
}
