use actix_web::{http::StatusCode, web, web::ServiceConfig};
use micropay_engine::{
    db_types::NewWallet,
    test_utils::{
        fixtures::{seed_account, test_wallet},
        prepare_env::fresh_database,
    },
    traits::{AccountManagement, ExternalServiceError},
    ProvisioningApi,
    SqliteDatabase,
};

use super::{
    helpers::{json_post, send_request},
    mocks::MockWalletProvider,
};
use crate::{data_objects::NewAccountResponse, routes::CreateAccountRoute};

fn configure(db: SqliteDatabase, wallets: MockWalletProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = ProvisioningApi::new(db, wallets, Default::default());
        cfg.service(CreateAccountRoute::<SqliteDatabase, MockWalletProvider>::new()).app_data(web::Data::new(api));
    }
}

fn new_account_body(email: &str) -> serde_json::Value {
    serde_json::json!({ "email": email, "first_name": "Ada", "last_name": "Lovelace" })
}

#[actix_web::test]
async fn create_account() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut wallets = MockWalletProvider::new();
    wallets
        .expect_create_wallet()
        .withf(|_key, label| label.to_string() == "Ada Lovelace Wallet")
        .times(1)
        .returning(|key, _| Ok(NewWallet { external_id: format!("w-{key}"), ..test_wallet(7) }));
    let req = json_post("/accounts", None, new_account_body("Ada@Example.com"));
    let (status, body) = send_request(req, configure(db.clone(), wallets)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let response: NewAccountResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.account.email, "ada@example.com");
    assert_eq!(response.wallet.account_id, response.account.id);
    assert_eq!(response.wallet.external_id, format!("w-{}", response.account.id));
    assert_eq!(response.wallet.address, test_wallet(7).address);
    let stored = db.fetch_wallet_for_account(&response.account.id).await.unwrap().unwrap();
    assert_eq!(stored, response.wallet);
}

#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    seed_account(&db, "ada@example.com", 1).await;
    let mut wallets = MockWalletProvider::new();
    wallets.expect_create_wallet().never();
    let req = json_post("/accounts", None, new_account_body("ada@example.com"));
    let (status, body) = send_request(req, configure(db, wallets)).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"An account for ada@example.com already exists"}"#);
}

#[actix_web::test]
async fn wallet_failure_leaves_no_account() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut wallets = MockWalletProvider::new();
    wallets
        .expect_create_wallet()
        .times(1)
        .returning(|_, _| Err(ExternalServiceError::rejected("Circle", "wallet set not found")));
    let req = json_post("/accounts", None, new_account_body("ada@example.com"));
    let (status, _) = send_request(req, configure(db.clone(), wallets)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(db.fetch_account_by_email("ada@example.com").await.unwrap().is_none());
}

#[actix_web::test]
async fn invalid_email_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let mut wallets = MockWalletProvider::new();
    wallets.expect_create_wallet().never();
    let req = json_post("/accounts", None, new_account_body("not-an-email"));
    let (status, body) = send_request(req, configure(db, wallets)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not a valid email address"), "{body}");
}

#[actix_web::test]
async fn missing_fields_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = fresh_database().await;
    let req = json_post("/accounts", None, serde_json::json!({ "email": "ada@example.com" }));
    let (status, _) = send_request(req, configure(db, MockWalletProvider::new())).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
