use futures_util::future::join_all;
use log::*;
use micropay_common::Amount;
use micropay_engine::{
    db_types::RechargeStatusType,
    events::EventProducers,
    test_utils::{
        fakes::{FakePaymentGateway, FakeTreasury},
        fixtures::seed_account,
        prepare_env::fresh_database,
    },
    traits::{PaymentNotification, ReservationLedger, SettlementOutcome},
    PricingEngine,
    RechargeFlowApi,
    RechargePolicy,
    SettlementApi,
};

const NUM_RECHARGES: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_recharges() {
    info!("🚀️ Starting recharge burst test");
    let db = fresh_database().await;
    let treasury = FakeTreasury::with_balance(Amount::from(1_000));
    let payments = FakePaymentGateway::default();
    let flow = RechargeFlowApi::new(
        db.clone(),
        payments.clone(),
        treasury.clone(),
        PricingEngine::default(),
        RechargePolicy::default(),
    );
    let settlement = SettlementApi::new(db.clone(), treasury.clone(), EventProducers::default());
    let mut accounts = Vec::with_capacity(5);
    for i in 0..5u32 {
        accounts.push(seed_account(&db, &format!("burst{i}@example.com"), i + 1).await);
    }

    let requests = (0..NUM_RECHARGES).map(|i| {
        let account_id = accounts[i % accounts.len()].id.clone();
        let flow = &flow;
        async move { flow.init_payment(&account_id, 10 * (i as i64 + 1)).await }
    });
    let handles = join_all(requests).await.into_iter().collect::<Result<Vec<_>, _>>().expect("all recharges admitted");
    let expected_reserved = handles.iter().map(|h| h.recharge.amount_usdc_value).sum::<Amount>();
    assert_eq!(db.total_reserved().await.unwrap(), expected_reserved);
    assert_eq!(payments.intents().len(), NUM_RECHARGES);

    // Every webhook is delivered twice, concurrently
    let notifications = handles.iter().flat_map(|h| {
        let intent_id = h.recharge.payment_intent_id.as_deref().unwrap_or_default();
        let n = PaymentNotification::succeeded(intent_id, &h.recharge.id);
        [n.clone(), n]
    });
    let outcomes = join_all(notifications.map(|n| settlement.process_notification(n))).await;
    let completed = outcomes
        .into_iter()
        .map(|o| o.expect("settlement succeeds"))
        .filter(|o| matches!(o, SettlementOutcome::Completed(r) if r.status == RechargeStatusType::Completed))
        .count();
    assert_eq!(completed, NUM_RECHARGES);
    assert_eq!(treasury.transfer_count(), NUM_RECHARGES);
    assert_eq!(treasury.current_balance(), Amount::from(1_000) - expected_reserved);
    assert_eq!(db.total_reserved().await.unwrap(), Amount::zero());
    info!("🚀️ test complete");
}
