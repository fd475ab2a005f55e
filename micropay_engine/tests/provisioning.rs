use std::time::{Duration, Instant};

use micropay_common::Amount;
use micropay_engine::{
    db_types::{NewAccount, NewWallet},
    events::{EventProducer, EventProducers},
    test_utils::{
        fakes::{FakePaymentGateway, FakeTreasury, FakeWalletProvider},
        fixtures::seed_account,
        prepare_env::fresh_database,
    },
    traits::{AccountManagement, ExternalServiceError, WalletProvider},
    PricingEngine,
    ProvisioningApi,
    ProvisioningError,
    RechargeFlowApi,
    RechargePolicy,
    SqliteDatabase,
};
use tokio::sync::mpsc;

/// A wallet provider that takes its time, like a real one on a bad day.
#[derive(Clone, Default)]
struct SlowWalletProvider {
    inner: FakeWalletProvider,
    delay: Duration,
}

impl WalletProvider for SlowWalletProvider {
    async fn create_wallet(&self, idempotency_key: &str, label: &str) -> Result<NewWallet, ExternalServiceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_wallet(idempotency_key, label).await
    }
}

async fn setup() -> (ProvisioningApi<SqliteDatabase, FakeWalletProvider>, FakeWalletProvider) {
    let db = fresh_database().await;
    let wallets = FakeWalletProvider::default();
    let api = ProvisioningApi::new(db, wallets.clone(), EventProducers::default());
    (api, wallets)
}

#[tokio::test]
async fn account_is_created_with_wallet() {
    let db = fresh_database().await;
    let wallets = FakeWalletProvider::default();
    let (tx, mut rx) = mpsc::channel(4);
    let mut producers = EventProducers::default();
    producers.account_created_producer.push(EventProducer::new(tx));
    let api = ProvisioningApi::new(db, wallets.clone(), producers);

    let (account, wallet) =
        api.create_account(NewAccount::new(" Ada@Example.com ", "Ada", "Lovelace")).await.expect("account created");
    assert_eq!(account.email, "ada@example.com");
    assert_eq!(account.first_name, "Ada");
    assert_eq!(wallet.account_id, account.id);
    assert_eq!(wallet.blockchain, "ARC-TESTNET");

    let stored = api.db().fetch_wallet_for_account(&account.id).await.unwrap().expect("wallet is stored");
    assert_eq!(stored, wallet);
    let found = api.db().fetch_account_by_email("ADA@example.com").await.unwrap().expect("account is stored");
    assert_eq!(found, account);

    let event = rx.recv().await.expect("account created event");
    assert_eq!(event.account.id, account.id);
    assert_eq!(event.wallet.address, wallet.address);
    assert_eq!(wallets.wallet_count(), 1);
}

#[tokio::test]
async fn wallet_failure_rolls_back_account() {
    let (api, wallets) = setup().await;
    wallets.fail(true);
    let err = api.create_account(NewAccount::new("bob@example.com", "Bob", "Builder")).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::WalletProvider(_)));
    assert!(api.db().fetch_account_by_email("bob@example.com").await.unwrap().is_none());

    // The same email can be used again once the provider has recovered
    wallets.fail(false);
    let (account, _) = api.create_account(NewAccount::new("bob@example.com", "Bob", "Builder")).await.unwrap();
    assert_eq!(account.email, "bob@example.com");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (api, wallets) = setup().await;
    api.create_account(NewAccount::new("carol@example.com", "Carol", "Singer")).await.unwrap();
    let err = api.create_account(NewAccount::new("CAROL@example.com", "Carol", "Other")).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Conflict(_)));
    assert_eq!(wallets.wallet_count(), 1);
}

#[tokio::test]
async fn invalid_details_are_rejected_without_calling_the_provider() {
    let (api, wallets) = setup().await;
    let err = api.create_account(NewAccount::new("not-an-email", "Dave", "Smith")).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Validation(_)));
    let err = api.create_account(NewAccount::new("dave@example.com", "", "Smith")).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Validation(_)));
    assert_eq!(wallets.wallet_count(), 0);
}

#[tokio::test]
async fn signup_in_progress_does_not_block_other_writers() {
    let db = fresh_database().await;
    let existing = seed_account(&db, "erin@example.com", 1).await;
    let wallets = SlowWalletProvider { delay: Duration::from_secs(2), ..Default::default() };
    let provisioning = ProvisioningApi::new(db.clone(), wallets, EventProducers::default());
    let flow = RechargeFlowApi::new(
        db.clone(),
        FakePaymentGateway::default(),
        FakeTreasury::with_balance(Amount::from(100)),
        PricingEngine::default(),
        RechargePolicy::default(),
    );

    let signup = provisioning.create_account(NewAccount::new("frank@example.com", "Frank", "Lloyd"));
    let meanwhile = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        // Half-provisioned accounts are invisible, but still hold the email address
        assert!(db.fetch_account_by_email("frank@example.com").await.unwrap().is_none());
        let duplicate = NewAccount::new("frank@example.com", "Other", "Frank");
        let err = provisioning.create_account(duplicate).await.unwrap_err();
        assert!(matches!(err, ProvisioningError::Conflict(_)), "unexpected error {err:?}");

        let started = Instant::now();
        let handle = flow.init_payment(&existing.id, 50).await.expect("recharge during a signup");
        (handle, started.elapsed())
    };
    let (signup, (handle, elapsed)) = tokio::join!(signup, meanwhile);

    let (account, wallet) = signup.expect("signup completes");
    assert!(elapsed < Duration::from_secs(1), "recharge waited {elapsed:?} for the signup");
    assert_eq!(handle.recharge.account_id, existing.id);
    let found = db.fetch_account_by_email("frank@example.com").await.unwrap().expect("account is active");
    assert_eq!(found, account);
    assert_eq!(db.fetch_wallet_for_account(&account.id).await.unwrap(), Some(wallet));
}

#[tokio::test]
async fn abandoned_signup_frees_the_email_address() {
    let (api, _) = setup().await;
    let pending = api.db().begin_account(NewAccount::new("gina@example.com", "Gina", "Lost")).await.unwrap();
    // The process died before finishing the signup
    drop(pending);

    let err = api.create_account(NewAccount::new("gina@example.com", "Gina", "Found")).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Conflict(_)));

    let an_hour_ago = chrono::Utc::now() - chrono::Duration::hours(1);
    sqlx::query("UPDATE accounts SET created_at = $1 WHERE email = 'gina@example.com'")
        .bind(an_hour_ago)
        .execute(api.db().pool())
        .await
        .unwrap();
    let (account, _) = api.create_account(NewAccount::new("gina@example.com", "Gina", "Found")).await.unwrap();
    assert_eq!(account.last_name, "Found");
}
