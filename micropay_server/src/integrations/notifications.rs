//! Event hooks for the secondary effects of settlement and provisioning.
//!
//! None of these may affect the outcome of the operation that raised the event. They log, and are the place to
//! attach e-mail delivery or paging.
use futures::future::BoxFuture;
use log::*;
use micropay_engine::events::{
    AccountCreatedEvent,
    EventHandlers,
    EventHooks,
    RechargeCompletedEvent,
    SettlementAlertEvent,
};

pub const NOTIFICATION_BUFFER_SIZE: usize = 25;

pub fn create_notification_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_account_created(|ev: AccountCreatedEvent| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            info!(
                "📧️ Account [{}] is ready. A verification code should be sent to {}. Wallet: {}",
                ev.account.id, ev.account.email, ev.wallet.address
            );
        })
    });
    hooks.on_recharge_completed(|ev: RechargeCompletedEvent| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let r = ev.recharge;
            info!(
                "📧️ Recharge [{}] delivered {} units ({} USDC) to account [{}]",
                r.id, r.units, r.amount_usdc_value, r.account_id
            );
        })
    });
    hooks.on_settlement_alert(|ev: SettlementAlertEvent| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let account = ev.account_id.map(|a| a.to_string()).unwrap_or_else(|| "unknown".into());
            error!("🚨️ {:?} alert for recharge [{}], account [{account}]. {}", ev.kind, ev.recharge_id, ev.message);
        })
    });
    EventHandlers::new(NOTIFICATION_BUFFER_SIZE, hooks)
}
