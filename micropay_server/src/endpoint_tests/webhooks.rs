use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use gateway_tools::stripe::webhook::{compute_signature, PAYMENT_FAILED, PAYMENT_SUCCEEDED, STRIPE_SIGNATURE_HEADER};
use micropay_common::{Amount, Secret};
use micropay_engine::{
    db_types::{NewRecharge, Recharge, RechargeStatusType},
    test_utils::{fixtures::seed_account, prepare_env::fresh_database},
    traits::{ExternalServiceError, RechargeManagement, ReservationLedger},
    PricingEngine,
    SettlementApi,
    SqliteDatabase,
};

use super::{helpers::send_request, mocks::MockTreasuryGateway};
use crate::{data_objects::WebhookAck, middleware::StripeSignatureMiddlewareFactory, routes::PaymentWebhookRoute};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";

fn configure(db: SqliteDatabase, treasury: MockTreasuryGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = SettlementApi::new(db, treasury, Default::default());
        let scope = web::scope("/webhooks")
            .wrap(StripeSignatureMiddlewareFactory::new(Secret::new(WEBHOOK_SECRET.to_string()), 300))
            .service(PaymentWebhookRoute::<SqliteDatabase, MockTreasuryGateway>::new());
        cfg.service(scope).app_data(web::Data::new(api));
    }
}

async fn pending_recharge(db: &SqliteDatabase) -> Recharge {
    let account = seed_account(db, "ada@example.com", 1).await;
    let quote = PricingEngine::default().calculate(50).unwrap();
    let (recharge, _) = db.insert_recharge_with_reservation(NewRecharge::new(account.id, quote, "eur")).await.unwrap();
    recharge
}

fn event_body(event_type: &str, recharge: &Recharge) -> String {
    serde_json::json!({
        "id": "evt_test",
        "type": event_type,
        "data": { "object": {
            "id": "pi_test",
            "object": "payment_intent",
            "metadata": { "recharge_id": recharge.id, "account_id": recharge.account_id }
        }}
    })
    .to_string()
}

fn signed_request(body: String, secret: &str) -> TestRequest {
    let ts = Utc::now().timestamp();
    let sig = compute_signature(secret, ts, body.as_bytes()).unwrap();
    TestRequest::post()
        .uri("/webhooks/payment")
        .insert_header((STRIPE_SIGNATURE_HEADER, format!("t={ts},v1={sig}")))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}

fn assert_acknowledged(status: StatusCode, body: &str) {
    assert_eq!(status, StatusCode::OK);
    let ack: WebhookAck = serde_json::from_str(body).unwrap();
    assert_eq!(ack, WebhookAck::success());
}

#[actix_web::test]
async fn unsigned_webhook_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let recharge = pending_recharge(&db).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_transfer().never();
    let req = TestRequest::post().uri("/webhooks/payment").set_payload(event_body(PAYMENT_SUCCEEDED, &recharge));
    let err = send_request(req, configure(db.clone(), treasury)).await.expect_err("Expected error");
    assert!(err.contains("Invalid webhook signature"), "{err}");
    let stored = db.fetch_recharge(&recharge.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RechargeStatusType::Pending);
}

#[actix_web::test]
async fn webhook_signed_with_wrong_secret_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let recharge = pending_recharge(&db).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_transfer().never();
    let req = signed_request(event_body(PAYMENT_SUCCEEDED, &recharge), "whsec_someone_else");
    let err = send_request(req, configure(db, treasury)).await.expect_err("Expected error");
    assert!(err.contains("Invalid webhook signature"), "{err}");
}

#[actix_web::test]
async fn payment_succeeded_settles_the_recharge() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let recharge = pending_recharge(&db).await;
    let key = recharge.id.to_string();
    let mut treasury = MockTreasuryGateway::new();
    treasury
        .expect_transfer()
        .withf(move |_dest, amount, k| *amount == Amount::from(5i64) && k.to_string() == key)
        .times(1)
        .returning(|_, _, _| Ok("tx-1".to_string()));
    let req = signed_request(event_body(PAYMENT_SUCCEEDED, &recharge), WEBHOOK_SECRET);
    let (status, body) = send_request(req, configure(db.clone(), treasury)).await.unwrap();
    assert_acknowledged(status, &body);
    let stored = db.fetch_recharge(&recharge.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RechargeStatusType::Completed);
    assert_eq!(stored.transfer_reference.as_deref(), Some("tx-1"));
    assert!(db.fetch_reservations(&recharge.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn failed_transfer_is_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let recharge = pending_recharge(&db).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury
        .expect_transfer()
        .times(1)
        .returning(|_, _, _| Err(ExternalServiceError::unavailable("Circle", "gateway timeout")));
    let req = signed_request(event_body(PAYMENT_SUCCEEDED, &recharge), WEBHOOK_SECRET);
    let (status, body) = send_request(req, configure(db.clone(), treasury)).await.unwrap();
    assert_acknowledged(status, &body);
    let stored = db.fetch_recharge(&recharge.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RechargeStatusType::Pending);
    assert_eq!(db.fetch_reservations(&recharge.id).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn payment_failed_releases_liquidity() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let recharge = pending_recharge(&db).await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_transfer().never();
    let req = signed_request(event_body(PAYMENT_FAILED, &recharge), WEBHOOK_SECRET);
    let (status, body) = send_request(req, configure(db.clone(), treasury)).await.unwrap();
    assert_acknowledged(status, &body);
    let stored = db.fetch_recharge(&recharge.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RechargeStatusType::Failed);
    assert_eq!(db.total_reserved().await.unwrap(), Amount::default());
}

#[actix_web::test]
async fn signed_but_unreadable_event_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut treasury = MockTreasuryGateway::new();
    treasury.expect_transfer().never();
    let req = signed_request("{\"not\": \"an event\"}".to_string(), WEBHOOK_SECRET);
    let (status, body) = send_request(req, configure(db, treasury)).await.unwrap();
    assert_acknowledged(status, &body);
}
