use asset_api::endpoints::{
    accounts::{Account, AccountPatch},
    recurring::RecurringTransaction,
    transactions::{Transaction, TransactionPatch},
    AccountId, Decimal, RecurringId, TransactionId,
};
use asset_manager::preferences::{FileStore, MemoryStore, Theme, ThemePreference, THEME_KEY};
use asset_manager::stores::{RemoteEntityStore, SummaryState, SummaryStore};
use asset_manager::testing::{fixtures, MockBackend, MockOp, MockSummaryBackend};
use asset_manager::{AppContext, Settings};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

type TestContext = AppContext<
    MockBackend<Account>,
    MockBackend<Transaction>,
    MockBackend<RecurringTransaction>,
    MockSummaryBackend,
>;

struct Harness {
    context: TestContext,
    accounts: MockBackend<Account>,
    transactions: MockBackend<Transaction>,
    recurring: MockBackend<RecurringTransaction>,
    summary: MockSummaryBackend,
}

fn harness() -> Harness {
    let accounts = MockBackend::default();
    let transactions = MockBackend::default();
    let recurring = MockBackend::default();
    let summary = MockSummaryBackend::default();
    let context = AppContext::with_backends(
        Settings::default(),
        accounts.clone(),
        transactions.clone(),
        recurring.clone(),
        summary.clone(),
        ThemePreference::new(MemoryStore::new(), || None::<bool>),
    );
    Harness {
        context,
        accounts,
        transactions,
        recurring,
        summary,
    }
}

fn account_ids(store: &RemoteEntityStore<MockBackend<Account>>) -> Vec<i64> {
    store.items().iter().map(|a| a.id.inner()).collect()
}

fn assert_unique_ids(ids: &[i64]) {
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate identities in {:?}", ids);
}

async fn wait_for_summary(
    store: &SummaryStore<MockSummaryBackend>,
    predicate: impl FnMut(&SummaryState) -> bool,
) {
    let mut rx = store.subscribe();
    let result = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate)).await;
    assert!(matches!(result, Ok(Ok(_))), "summary never reached expected state");
}

#[tokio::test]
async fn test_mutations_keep_identities_unique() {
    let store = RemoteEntityStore::new(MockBackend::<Account>::default());

    let main = store.create(fixtures::new_account("Main", 100)).await.unwrap();
    let savings = store.create(fixtures::new_account("Savings", 50)).await.unwrap();
    assert_eq!(account_ids(&store), vec![main.id.inner(), savings.id.inner()]);

    let updated = store
        .update(main.id, AccountPatch::new().name("Everyday"))
        .await
        .unwrap();
    assert_eq!(store.find_by_id(main.id), Some(updated));
    assert_eq!(store.items()[0].name, "Everyday");

    store.delete(savings.id).await.unwrap();
    assert!(store.find_by_id(savings.id).is_none());

    let again = store.create(fixtures::new_account("Savings", 75)).await.unwrap();
    assert_ne!(again.id, savings.id);
    assert_unique_ids(&account_ids(&store));
}

#[tokio::test]
async fn test_create_succeeds_when_cascade_fails() {
    let mut h = harness();
    h.summary.fail_summary(true);
    let cascade = h.context.start_cascade().unwrap();

    let created = h
        .context
        .accounts
        .create(fixtures::new_account("Brokerage", 10_000))
        .await
        .unwrap();

    assert!(h.context.accounts.find_by_id(created.id).is_some());
    wait_for_summary(&h.context.summary, |state| state.error.is_some()).await;

    // The failed refresh surfaces on the summary store only
    assert!(h.context.accounts.error().is_none());
    assert!(h.context.accounts.find_by_id(created.id).is_some());
    assert_eq!(h.summary.summary_calls(), 1);

    cascade.abort();
}

#[tokio::test]
async fn test_loading_spans_exactly_the_request() {
    let backend = MockBackend::with_records(vec![fixtures::account(1, "Main", 100)]);
    let store = Arc::new(RemoteEntityStore::new(backend.clone()));
    assert!(!store.is_loading());

    let mut gate = backend.hold_next_list();
    let request = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(()).await }
    });
    gate.entered().await;
    assert!(store.is_loading());
    gate.release();
    request.await.unwrap().unwrap();
    assert!(!store.is_loading());

    backend.fail(MockOp::List);
    let mut gate = backend.hold_next_list();
    let request = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(()).await }
    });
    gate.entered().await;
    assert!(store.is_loading());
    assert!(store.error().is_none());
    gate.release();
    assert!(request.await.unwrap().is_err());
    assert!(!store.is_loading());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn test_failed_fetch_reraises_and_keeps_items() {
    let backend = MockBackend::with_records(vec![fixtures::account(1, "Main", 100)]);
    let store = RemoteEntityStore::new(backend.clone());
    store.fetch_all(()).await.unwrap();

    backend.fail(MockOp::List);
    let err = store.fetch_all(()).await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to load accounts"));
    assert_eq!(account_ids(&store), vec![1]);

    backend.recover(MockOp::List);
    store.fetch_all(()).await.unwrap();
    assert!(store.error().is_none());
}

#[tokio::test]
async fn test_overlapping_fetches_keep_last_response() {
    let backend = MockBackend::with_records(vec![fixtures::account(1, "Before", 100)]);
    let store = Arc::new(RemoteEntityStore::new(backend.clone()));

    let mut gate = backend.hold_next_list();
    let slow = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(()).await }
    });
    gate.entered().await;

    backend.seed(vec![fixtures::account(2, "After", 200)]);
    store.fetch_all(()).await.unwrap();
    assert_eq!(account_ids(&store), vec![2]);

    gate.release();
    slow.await.unwrap().unwrap();
    // The older request answered last, so its snapshot is what remains
    assert_eq!(account_ids(&store), vec![1]);
}

#[tokio::test]
async fn test_failed_mutations_leave_items_untouched() {
    let backend = MockBackend::with_records(vec![fixtures::account(1, "Main", 100)]);
    let store = RemoteEntityStore::new(backend.clone());
    store.fetch_all(()).await.unwrap();

    backend.fail(MockOp::Create);
    backend.fail(MockOp::Delete);
    assert!(store.create(fixtures::new_account("New", 1)).await.is_err());
    assert!(store.delete(AccountId::new(1)).await.is_err());
    assert_eq!(account_ids(&store), vec![1]);
    assert!(store.error().is_some());

    backend.recover(MockOp::Delete);
    store.delete(AccountId::new(1)).await.unwrap();
    assert!(store.is_empty());
    assert!(store.error().is_none());
}

#[tokio::test]
async fn test_update_of_uncached_record_is_not_inserted() {
    let backend = MockBackend::with_records(vec![fixtures::account(7, "Remote only", 100)]);
    let store = RemoteEntityStore::new(backend.clone());

    let updated = store
        .update(AccountId::new(7), AccountPatch::new().balance(250))
        .await
        .unwrap();

    assert_eq!(updated.balance, Decimal::from(250));
    assert!(store.is_empty());

    store.delete(AccountId::new(7)).await.unwrap();
    assert!(store.is_empty());
    assert!(backend.records().is_empty());
}

#[tokio::test]
async fn test_transactions_are_prepended_and_patched() {
    let backend = MockBackend::with_records(vec![
        fixtures::transaction(2, 1, 30),
        fixtures::transaction(1, 1, 20),
    ]);
    let store = RemoteEntityStore::new(backend);
    store.fetch_all(Default::default()).await.unwrap();

    let created = store
        .create(fixtures::new_transaction(1, 45))
        .await
        .unwrap();
    let ids: Vec<_> = store.items().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![created.id, TransactionId::new(2), TransactionId::new(1)]);

    store
        .update(TransactionId::new(2), TransactionPatch::new().category("Dining"))
        .await
        .unwrap();
    assert_eq!(store.items()[1].category, "Dining");
}

#[tokio::test]
async fn test_deactivate_flips_flag_and_cascades() {
    let mut h = harness();
    h.recurring.seed(vec![fixtures::recurring(4, 1, 900)]);
    h.summary
        .set_summary(fixtures::summary(1_200, vec![fixtures::account(1, "Main", 1_200)]));
    let cascade = h.context.start_cascade().unwrap();

    h.context.recurring.fetch_all(Default::default()).await.unwrap();
    h.context.recurring.deactivate(RecurringId::new(4)).await.unwrap();

    let cached = h.context.recurring.find_by_id(RecurringId::new(4)).unwrap();
    assert!(!cached.is_active);
    assert!(!h.recurring.records()[0].is_active);

    wait_for_summary(&h.context.summary, |state| state.summary.is_some()).await;
    assert_eq!(h.context.summary.total_assets(), Decimal::from(1_200));

    cascade.abort();
}

#[tokio::test]
async fn test_account_update_refreshes_summary_and_balances() {
    let mut h = harness();
    h.accounts.seed(vec![fixtures::account(1, "Main", 100)]);
    h.summary
        .set_summary(fixtures::summary(500, vec![fixtures::account(1, "Main", 500)]));
    let cascade = h.context.start_cascade().unwrap();

    h.context.accounts.fetch_all(()).await.unwrap();
    h.context
        .accounts
        .update(AccountId::new(1), AccountPatch::new().balance(300))
        .await
        .unwrap();
    assert_eq!(h.context.accounts.items()[0].balance, Decimal::from(300));

    let mut accounts_rx = h.context.accounts.subscribe();
    let hydrated = tokio::time::timeout(
        Duration::from_secs(5),
        accounts_rx.wait_for(|state| state.items.iter().all(|a| a.balance == Decimal::from(500))),
    )
    .await;
    assert!(matches!(hydrated, Ok(Ok(_))));
    assert_eq!(h.context.summary.total_assets(), Decimal::from(500));

    cascade.abort();
}

#[tokio::test]
async fn test_second_cascade_start_is_refused() {
    let mut h = harness();
    let first = h.context.start_cascade();
    assert!(first.is_some());
    assert!(h.context.start_cascade().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_load_failures_become_error_toasts() {
    let h = harness();
    h.transactions.fail(MockOp::List);
    h.summary.fail_summary(true);

    let failures = h.context.load_all().await;
    assert_eq!(failures.len(), 2);

    let toasts = h.context.notifications.active();
    assert_eq!(toasts.len(), 2);
    assert!(toasts.iter().any(|t| t.message.starts_with("Failed to load transactions")));

    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert!(h.context.notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toast_expires_and_late_remove_is_noop() {
    let h = harness();
    let id = h.context.notifications.info("x", Some(Duration::from_millis(100)));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.context.notifications.len(), 0);

    h.context.notifications.remove(id);
    assert_eq!(h.context.notifications.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_counter_animates_to_fetched_total() {
    let h = harness();
    let (counter, task) = h.context.summary_counter(SummaryState::total_assets);
    assert_eq!(counter.displayed(), 0);

    h.summary.set_summary(fixtures::summary(100, Vec::new()));
    h.context.summary.fetch().await.unwrap();

    tokio::time::sleep(Duration::from_millis(520)).await;
    let midway = counter.displayed();
    assert!(midway > 0 && midway < 100, "displayed {}", midway);

    h.summary.set_summary(fixtures::summary(50, Vec::new()));
    h.context.summary.fetch().await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let after_retarget = counter.displayed();
    assert!(after_retarget <= midway.max(50) && after_retarget >= 50);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(counter.displayed(), 50);
    assert!(!counter.is_animating());

    task.abort();
}

#[test]
fn test_theme_survives_restart_without_ambient_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let first = ThemePreference::new(FileStore::new(&path), || Some(false));
    assert_eq!(first.init(), Theme::Light);
    first.set_theme(Theme::Dark).unwrap();

    let restarted = ThemePreference::new(FileStore::new(&path), || -> Option<bool> {
        panic!("ambient preference consulted despite stored theme")
    });
    assert_eq!(restarted.init(), Theme::Dark);

    let stored = std::fs::read_to_string(&path).unwrap();
    assert!(stored.contains(THEME_KEY));
}
