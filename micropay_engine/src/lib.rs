//! MicroPay Recharge Engine
//!
//! The recharge engine sells prepaid credit units for fiat and settles each purchase by moving the equivalent amount
//! of USDC from a custodial treasury wallet into the buyer's own wallet. This library contains the core logic. It is
//! provider-agnostic: the payment processor, the treasury custodian and the wallet provider are all injected through
//! the traits in [`mod@traits`].
//!
//! The library is divided into these main sections:
//! 1. Pricing ([`mod@pricing`]). Turns a unit count into an itemised quote.
//! 2. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`mod@sqlite`]). You should
//!    rarely need to access the database directly. The exception is the data types stored in it, which are defined in
//!    [`mod@db_types`] and are public.
//! 3. The public API ([`mod@mpe_api`]): the recharge orchestrator, the settlement handler and account provisioning.
//!
//! The engine also emits events when an account is created, a recharge completes, or a paid recharge cannot be
//! settled. A simple actor framework ([`mod@events`]) lets you hook into these.
pub mod db_types;
pub mod events;
pub mod mpe_api;
pub mod pricing;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use mpe_api::{
    errors::{ProvisioningError, RechargeFlowError, SettlementError},
    provisioning_api::ProvisioningApi,
    recharge_flow_api::{RechargeFlowApi, RechargePolicy},
    settlement_api::SettlementApi,
};
pub use pricing::{PricingConfig, PricingEngine, PricingError, Quote};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
