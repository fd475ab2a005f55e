//! The public-facing functionality of the recharge engine.
//!
//! * [`recharge_flow_api::RechargeFlowApi`] quotes, admits and opens payment for new recharges.
//! * [`settlement_api::SettlementApi`] settles recharges when the payment processor reports an outcome.
//! * [`provisioning_api::ProvisioningApi`] creates accounts together with their custodial wallets.
pub mod errors;
pub mod provisioning_api;
pub mod recharge_flow_api;
pub mod settlement_api;
