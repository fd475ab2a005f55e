//! Thin REST clients for the two external services the recharge gateway depends on.
//!
//! * [`StripeApi`] creates and cancels card payment intents, and [`stripe::webhook`] authenticates and parses the
//!   notifications Stripe sends back.
//! * [`CircleApi`] queries and moves USDC held in Circle developer-controlled wallets, and creates new wallets.
//!
//! Neither client knows anything about recharges. The server wires them into the engine.
pub mod circle;
mod config;
mod error;
pub mod stripe;

pub use circle::{CircleApi, CircleTokenBalance, CircleWallet};
pub use config::{CircleConfig, StripeConfig};
pub use error::{GatewayApiError, WebhookError};
pub use stripe::{NewPaymentIntent, StripeApi, StripePaymentIntent};
