//! #  Storage and service contracts.
//!
//! This module defines the interfaces that the recharge engine depends on. There are two groups.
//!
//! ## Storage backends
//! * [`RechargeDatabase`] is the umbrella trait a backend must implement. It combines the three below.
//! * [`RechargeManagement`] stores recharge records and enforces their monotonic status transitions.
//! * [`ReservationLedger`] tracks time-limited holds on treasury liquidity.
//! * [`AccountManagement`] stores accounts and their custodial wallets, with a two-phase create.
//!
//! ## External services
//! * [`TreasuryGateway`] queries the treasury balance and executes outbound transfers.
//! * [`PaymentGateway`] creates and cancels card payment intents.
//! * [`WalletProvider`] creates custodial wallets.
mod account_management;
mod data_objects;
mod gateways;
mod recharge_database;
mod reservation_ledger;

pub use account_management::{AccountManagement, PendingAccount};
pub use data_objects::{
    NotificationKind,
    PaymentHandle,
    PaymentIntent,
    PaymentIntentRequest,
    PaymentNotification,
    SettlementOutcome,
};
pub use gateways::{ExternalServiceError, PaymentGateway, TreasuryGateway, WalletProvider};
pub use recharge_database::{RechargeDatabase, RechargeManagement, StorageError};
pub use reservation_ledger::ReservationLedger;
