use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gateway_tools::{CircleApi, StripeApi};
use log::*;
use micropay_engine::{
    events::EventProducers,
    PricingEngine,
    ProvisioningApi,
    RechargeFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{
        circle::{CircleTreasury, CircleWalletProvider},
        notifications::create_notification_handlers,
        stripe::StripeGateway,
    },
    middleware::StripeSignatureMiddlewareFactory,
    reaper_worker::start_reaper_worker,
    routes::{health, CreateAccountRoute, InitPaymentRoute, PaymentWebhookRoute, QuoteRoute},
};

const DB_POOL_SIZE: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let window_mins = config.reservation_window_mins;
    let window = chrono::Duration::try_minutes(window_mins).ok_or_else(|| {
        ServerError::InitializeError(format!("{window_mins} minutes is not a valid reservation window"))
    })?;
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_POOL_SIZE)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?
        .with_reservation_window(window);
    if config.run_migrations {
        info!("🗃️ Running database migrations");
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let stripe = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let circle = CircleApi::new(config.circle.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _reaper = start_reaper_worker(db.clone(), config.reaper_interval_secs);
    let srv = create_server_instance(config, db, stripe, circle, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    stripe: StripeApi,
    circle: CircleApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let pricing =
        PricingEngine::new(config.pricing.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let webhook_secret = config.stripe.webhook_secret.clone();
    let webhook_tolerance = config.stripe.webhook_tolerance_secs;
    let policy = config.policy.clone();
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let recharge_api = RechargeFlowApi::new(
            db.clone(),
            StripeGateway::new(stripe.clone()),
            CircleTreasury::new(circle.clone()),
            pricing.clone(),
            policy.clone(),
        );
        let settlement_api = SettlementApi::new(db.clone(), CircleTreasury::new(circle.clone()), producers.clone());
        let provisioning_api =
            ProvisioningApi::new(db.clone(), CircleWalletProvider::new(circle.clone()), producers.clone());
        let webhook_scope = web::scope("/webhooks")
            .wrap(StripeSignatureMiddlewareFactory::new(webhook_secret.clone(), webhook_tolerance))
            .service(PaymentWebhookRoute::<SqliteDatabase, CircleTreasury>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("micropay::access_log"))
            .app_data(web::Data::new(recharge_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(provisioning_api))
            .service(health)
            .service(QuoteRoute::<SqliteDatabase, StripeGateway, CircleTreasury>::new())
            .service(InitPaymentRoute::<SqliteDatabase, StripeGateway, CircleTreasury>::new())
            .service(CreateAccountRoute::<SqliteDatabase, CircleWalletProvider>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
