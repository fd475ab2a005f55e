use std::str::FromStr;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use micropay_common::Amount;
use micropay_engine::{
    db_types::{AccountId, RechargeStatusType},
    test_utils::{fixtures::seed_account, prepare_env::fresh_database},
    traits::{ExternalServiceError, PaymentIntent, ReservationLedger},
    PricingEngine,
    Quote,
    RechargeFlowApi,
    RechargePolicy,
    SqliteDatabase,
};

use super::{
    helpers::{get_request, json_post, send_request},
    mocks::{MockPaymentGateway, MockTreasuryGateway},
};
use crate::{
    data_objects::InitPaymentResponse,
    errors::EXTERNAL_SERVICE_MESSAGE,
    routes::{health, InitPaymentRoute, QuoteRoute},
};

fn usdc(s: &str) -> Amount {
    Amount::from_str(s).unwrap()
}

fn configure(
    db: SqliteDatabase,
    payments: MockPaymentGateway,
    treasury: MockTreasuryGateway,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = RechargeFlowApi::new(db, payments, treasury, PricingEngine::default(), RechargePolicy::default());
        cfg.service(health)
            .service(QuoteRoute::<SqliteDatabase, MockPaymentGateway, MockTreasuryGateway>::new())
            .service(InitPaymentRoute::<SqliteDatabase, MockPaymentGateway, MockTreasuryGateway>::new())
            .app_data(web::Data::new(api));
    }
}

fn treasury_with_balance(balance: &'static str) -> MockTreasuryGateway {
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_balance().returning(move || Ok(usdc(balance)));
    treasury.expect_transfer().never();
    treasury
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let (status, body) =
        get_request("/health", configure(db, MockPaymentGateway::new(), MockTreasuryGateway::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn quote_needs_no_account_and_reserves_nothing() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_balance().never();
    let (status, body) =
        get_request("/recharges/quote?units=50", configure(db.clone(), MockPaymentGateway::new(), treasury))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    let quote: Quote = serde_json::from_str(&body).unwrap();
    assert_eq!(quote.units, 50);
    assert_eq!(quote.usdc_value, usdc("5"));
    assert_eq!(quote.service_fee, usdc("0.15"));
    assert_eq!(quote.tax, usdc("0.03"));
    assert_eq!(quote.gateway_fee, usdc("0.33"));
    assert_eq!(quote.grand_total, usdc("5.51"));
    assert_eq!(db.total_reserved().await.unwrap(), Amount::default());
}

#[actix_web::test]
async fn quote_rejects_non_positive_units() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let (status, body) =
        get_request("/recharges/quote?units=0", configure(db, MockPaymentGateway::new(), MockTreasuryGateway::new()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"), "{body}");
}

#[actix_web::test]
async fn init_payment_without_account_header() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let req = json_post("/recharges/init-payment", None, serde_json::json!({"units": 50}));
    let (status, body) =
        send_request(req, configure(db, MockPaymentGateway::new(), MockTreasuryGateway::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. The X-Account-Id header is missing."}"#);
}

#[actix_web::test]
async fn init_payment_with_malformed_account_header() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let req = json_post("/recharges/init-payment", Some("alice"), serde_json::json!({"units": 50}));
    let (status, _) =
        send_request(req, configure(db, MockPaymentGateway::new(), MockTreasuryGateway::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn init_payment_for_unknown_account() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut payments = MockPaymentGateway::new();
    payments.expect_create_intent().never();
    let id = AccountId::new_random();
    let req = json_post("/recharges/init-payment", Some(id.as_str()), serde_json::json!({"units": 50}));
    let (status, _) = send_request(req, configure(db, payments, treasury_with_balance("100"))).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn init_payment_success() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let account = seed_account(&db, "ada@example.com", 1).await;
    let mut payments = MockPaymentGateway::new();
    let expected_account = account.id.clone();
    payments
        .expect_create_intent()
        .withf(move |r| r.amount == usdc("5.51") && r.currency == "eur" && r.account_id == expected_account)
        .times(1)
        .returning(|_| Ok(PaymentIntent { intent_id: "pi_test".into(), client_secret: "pi_test_secret".into() }));
    payments.expect_cancel_intent().never();
    let req = json_post("/recharges/init-payment", Some(account.id.as_str()), serde_json::json!({"units": 50}));
    let app = configure(db.clone(), payments, treasury_with_balance("100"));
    let (status, body) = send_request(req, app).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: InitPaymentResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.client_secret, "pi_test_secret");
    let recharge = response.recharge;
    assert_eq!(recharge.status, RechargeStatusType::Pending);
    assert_eq!(recharge.account_id, account.id);
    assert_eq!(recharge.payment_intent_id.as_deref(), Some("pi_test"));
    assert_eq!(recharge.total_paid, usdc("5.51"));
    assert_eq!(db.total_reserved().await.unwrap(), usdc("5"));
}

#[actix_web::test]
async fn init_payment_insufficient_liquidity() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let account = seed_account(&db, "ada@example.com", 1).await;
    let mut payments = MockPaymentGateway::new();
    payments.expect_create_intent().never();
    let req = json_post("/recharges/init-payment", Some(account.id.as_str()), serde_json::json!({"units": 50}));
    let app = configure(db.clone(), payments, treasury_with_balance("5.05"));
    let (status, body) = send_request(req, app).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("temporarily unavailable"), "{body}");
    assert_eq!(db.total_reserved().await.unwrap(), Amount::default());
}

#[actix_web::test]
async fn init_payment_processor_failure_is_compensated() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let account = seed_account(&db, "ada@example.com", 1).await;
    let mut payments = MockPaymentGateway::new();
    payments
        .expect_create_intent()
        .times(1)
        .returning(|_| Err(ExternalServiceError::unavailable("Stripe", "connection reset")));
    payments.expect_cancel_intent().never();
    let req = json_post("/recharges/init-payment", Some(account.id.as_str()), serde_json::json!({"units": 50}));
    let app = configure(db.clone(), payments, treasury_with_balance("100"));
    let (status, body) = send_request(req, app).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, serde_json::json!({ "error": EXTERNAL_SERVICE_MESSAGE }).to_string());
    assert_eq!(db.total_reserved().await.unwrap(), Amount::default());
}

#[actix_web::test]
async fn init_payment_with_treasury_outage() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let account = seed_account(&db, "ada@example.com", 1).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_balance().returning(|| Err(ExternalServiceError::unavailable("Circle", "503")));
    let mut payments = MockPaymentGateway::new();
    payments.expect_create_intent().never();
    let req = json_post("/recharges/init-payment", Some(account.id.as_str()), serde_json::json!({"units": 50}));
    let (status, _) = send_request(req, configure(db.clone(), payments, treasury)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(db.total_reserved().await.unwrap(), Amount::default());
}

#[actix_web::test]
async fn init_payment_rejects_bad_units() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let account = seed_account(&db, "ada@example.com", 1).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_balance().never();
    let req = json_post("/recharges/init-payment", Some(account.id.as_str()), serde_json::json!({"units": -5}));
    let (status, _) = send_request(req, configure(db, MockPaymentGateway::new(), treasury)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
