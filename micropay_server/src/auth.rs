//! Caller identification.
//!
//! Sessions are issued and checked by the authentication layer in front of this server, which forwards the
//! authenticated account id in the `X-Account-Id` header. Handlers that act on behalf of an account take a
//! [`CallerAccount`] argument, and requests without a well-formed header are rejected with 401.
use std::{
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::debug;
use micropay_engine::db_types::AccountId;

use crate::errors::{AuthError, ServerError};

pub const ACCOUNT_ID_HEADER: &str = "X-Account-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerAccount(pub AccountId);

impl CallerAccount {
    pub fn account_id(&self) -> &AccountId {
        &self.0
    }
}

impl FromRequest for CallerAccount {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(caller_from_request(req))
    }
}

fn caller_from_request(req: &HttpRequest) -> Result<CallerAccount, ServerError> {
    let header = req.headers().get(ACCOUNT_ID_HEADER).ok_or(AuthError::MissingAccountHeader)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidAccountHeader)?;
    let id = AccountId::from_str(value.trim()).map_err(|e| {
        debug!("💻️ Rejecting account header '{value}'. {e}");
        AuthError::InvalidAccountHeader
    })?;
    Ok(CallerAccount(id))
}
