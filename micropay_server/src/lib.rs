//! # MicroPay server
//! This crate hosts the HTTP server for the recharge engine. It is responsible for:
//! * Quoting and opening card payments for credit unit recharges.
//! * Receiving payment outcome webhooks from Stripe and handing them to the settlement handler.
//! * Creating accounts, each with its own custodial wallet.
//! * Periodically deleting lapsed liquidity reservations.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `GET /recharges/quote?units=N`: Prices a recharge without reserving anything.
//! * `POST /recharges/init-payment`: Starts a recharge for the account named in the `X-Account-Id` header.
//! * `POST /accounts`: Creates an account and its wallet.
//! * `POST /webhooks/payment`: Stripe payment webhooks. Requests must carry a valid `Stripe-Signature` header.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod reaper_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
