mod amount;
pub mod helpers;

pub mod op;
mod secret;

pub use amount::{Amount, AmountError, DEFAULT_CURRENCY, USDC_CURRENCY_CODE};
pub use rust_decimal::Decimal;
pub use secret::Secret;
