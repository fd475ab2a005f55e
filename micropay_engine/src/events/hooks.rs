use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    AccountCreatedEvent,
    EventHandler,
    EventProducer,
    Handler,
    RechargeCompletedEvent,
    SettlementAlertEvent,
};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub account_created_producer: Vec<EventProducer<AccountCreatedEvent>>,
    pub recharge_completed_producer: Vec<EventProducer<RechargeCompletedEvent>>,
    pub settlement_alert_producer: Vec<EventProducer<SettlementAlertEvent>>,
}

pub struct EventHandlers {
    pub on_account_created: Option<EventHandler<AccountCreatedEvent>>,
    pub on_recharge_completed: Option<EventHandler<RechargeCompletedEvent>>,
    pub on_settlement_alert: Option<EventHandler<SettlementAlertEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_account_created = hooks.on_account_created.map(|f| EventHandler::new(buffer_size, f));
        let on_recharge_completed = hooks.on_recharge_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_settlement_alert = hooks.on_settlement_alert.map(|f| EventHandler::new(buffer_size, f));
        Self { on_account_created, on_recharge_completed, on_settlement_alert }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_account_created {
            result.account_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_recharge_completed {
            result.recharge_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_settlement_alert {
            result.settlement_alert_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_account_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_recharge_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_settlement_alert {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_account_created: Option<Handler<AccountCreatedEvent>>,
    pub on_recharge_completed: Option<Handler<RechargeCompletedEvent>>,
    pub on_settlement_alert: Option<Handler<SettlementAlertEvent>>,
}

impl EventHooks {
    pub fn on_account_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AccountCreatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_account_created = Some(Arc::new(f));
        self
    }

    pub fn on_recharge_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RechargeCompletedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_recharge_completed = Some(Arc::new(f));
        self
    }

    pub fn on_settlement_alert<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SettlementAlertEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_settlement_alert = Some(Arc::new(f));
        self
    }
}
