use crate::events::StoreKind;
use crate::stores::{
    DeactivateBackend, EntityBackend, EntityId, Identified, InsertPosition, SummaryBackend,
};
use asset_api::endpoints::{
    accounts::{Account, AccountPatch, NewAccount},
    recurring::{NewRecurring, RecurringFilters, RecurringPatch, RecurringTransaction},
    summary::{NetWorthTrend, Summary},
    transactions::{NewTransaction, Transaction, TransactionFilters, TransactionPatch},
    AccountId, Decimal, RecurringId, TransactionId,
};
use asset_api::{AssetApiError, ErrorDetail, StatusCode};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Record types the in-memory backend knows how to create and patch
pub trait MockEntity: Identified {
    type Filters: Clone + Default + Debug + Send + Sync + 'static;
    type NewPayload: Debug + Send + 'static;
    type Patch: Debug + Send + 'static;

    const KIND: StoreKind;
    const INSERT: InsertPosition = InsertPosition::Back;

    fn from_payload(id: i64, payload: Self::NewPayload) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch);

    /// Server-side filtering of a list request
    fn select(records: &[Self], _filters: &Self::Filters) -> Vec<Self> {
        records.to_vec()
    }
}

impl MockEntity for Account {
    type Filters = ();
    type NewPayload = NewAccount;
    type Patch = AccountPatch;

    const KIND: StoreKind = StoreKind::Accounts;

    fn from_payload(id: i64, payload: NewAccount) -> Self {
        Account {
            id: AccountId::new(id),
            user_id: 1,
            name: payload.name,
            account_type: payload.account_type,
            balance: payload.balance,
            institution: payload.institution,
            account_number: payload.account_number,
            created_at: fixtures::timestamp(),
            updated_at: fixtures::timestamp(),
        }
    }

    fn apply_patch(&mut self, patch: AccountPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(institution) = patch.institution {
            self.institution = Some(institution);
        }
        if let Some(account_number) = patch.account_number {
            self.account_number = Some(account_number);
        }
    }
}

impl MockEntity for Transaction {
    type Filters = TransactionFilters;
    type NewPayload = NewTransaction;
    type Patch = TransactionPatch;

    const KIND: StoreKind = StoreKind::Transactions;
    const INSERT: InsertPosition = InsertPosition::Front;

    fn from_payload(id: i64, payload: NewTransaction) -> Self {
        Transaction {
            id: TransactionId::new(id),
            account_id: payload.account_id,
            transaction_type: payload.transaction_type,
            category: payload.category,
            amount: payload.amount,
            description: payload.description,
            transaction_date: payload.transaction_date,
            is_recurring: payload.is_recurring,
            created_at: fixtures::timestamp(),
        }
    }

    fn apply_patch(&mut self, patch: TransactionPatch) {
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(date) = patch.transaction_date {
            self.transaction_date = date;
        }
    }

    fn select(records: &[Self], filters: &TransactionFilters) -> Vec<Self> {
        records
            .iter()
            .filter(|t| filters.account_id.is_none_or(|id| t.account_id == id))
            .filter(|t| filters.start_date.is_none_or(|d| t.transaction_date >= d))
            .filter(|t| filters.end_date.is_none_or(|d| t.transaction_date <= d))
            .take(filters.limit as usize)
            .cloned()
            .collect()
    }
}

impl MockEntity for RecurringTransaction {
    type Filters = RecurringFilters;
    type NewPayload = NewRecurring;
    type Patch = RecurringPatch;

    const KIND: StoreKind = StoreKind::Recurring;

    fn from_payload(id: i64, payload: NewRecurring) -> Self {
        RecurringTransaction {
            id: RecurringId::new(id),
            account_id: payload.account_id,
            transaction_type: payload.transaction_type,
            category: payload.category,
            amount: payload.amount,
            description: payload.description,
            frequency: payload.frequency,
            day_of_month: payload.day_of_month,
            is_active: payload.is_active,
            start_date: payload.start_date,
            end_date: payload.end_date,
            created_at: fixtures::timestamp(),
            updated_at: fixtures::timestamp(),
        }
    }

    fn apply_patch(&mut self, patch: RecurringPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date);
        }
    }

    fn select(records: &[Self], filters: &RecurringFilters) -> Vec<Self> {
        records
            .iter()
            .filter(|r| filters.account_id.is_none_or(|id| r.account_id == id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    List,
    Create,
    Update,
    Delete,
    Deactivate,
}

/// Releases a list response held by [`MockBackend::hold_next_list`]
pub struct ListGate {
    release: oneshot::Sender<()>,
    entered: Option<oneshot::Receiver<()>>,
}

impl ListGate {
    /// Wait until the held request has taken its snapshot of the records
    pub async fn entered(&mut self) {
        if let Some(entered) = self.entered.take() {
            let _ = entered.await;
        }
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

struct HeldList {
    release: oneshot::Receiver<()>,
    entered: oneshot::Sender<()>,
}

struct MockState<E> {
    records: Vec<E>,
    next_id: i64,
    failing: HashSet<MockOp>,
    held: Option<HeldList>,
    calls: HashMap<MockOp, usize>,
}

/// In-memory backend collection with failure injection.
///
/// Clones share the same server state, so a test can keep a handle while
/// the store owns another.
pub struct MockBackend<E: MockEntity> {
    state: Arc<Mutex<MockState<E>>>,
}

impl<E: MockEntity> Clone for MockBackend<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<E: MockEntity> Default for MockBackend<E> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                records: Vec::new(),
                next_id: 1,
                failing: HashSet::new(),
                held: None,
                calls: HashMap::new(),
            })),
        }
    }
}

impl<E: MockEntity> MockBackend<E> {
    pub fn with_records(records: Vec<E>) -> Self {
        let backend = Self::default();
        backend.seed(records);
        backend
    }

    /// Replace the server-side records
    pub fn seed(&self, records: Vec<E>) {
        let mut state = self.state.lock();
        let max_id = records.iter().map(|r| Into::<i64>::into(r.id())).max().unwrap_or(0);
        state.next_id = state.next_id.max(max_id + 1);
        state.records = records;
    }

    pub fn records(&self) -> Vec<E> {
        self.state.lock().records.clone()
    }

    /// Make every subsequent `op` fail with a 500 until [`recover`](Self::recover)
    pub fn fail(&self, op: MockOp) {
        self.state.lock().failing.insert(op);
    }

    pub fn recover(&self, op: MockOp) {
        self.state.lock().failing.remove(&op);
    }

    /// Hold the response of the next list request until the gate is released
    pub fn hold_next_list(&self) -> ListGate {
        let (release_tx, release_rx) = oneshot::channel();
        let (entered_tx, entered_rx) = oneshot::channel();
        self.state.lock().held = Some(HeldList {
            release: release_rx,
            entered: entered_tx,
        });
        ListGate {
            release: release_tx,
            entered: Some(entered_rx),
        }
    }

    pub fn calls(&self, op: MockOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn begin(&self, op: MockOp) -> Result<(), AssetApiError> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(&op) {
            return Err(AssetApiError::Api(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("simulated failure"),
            ));
        }
        Ok(())
    }
}

fn not_found(id: impl std::fmt::Display) -> AssetApiError {
    AssetApiError::Api(
        StatusCode::NOT_FOUND,
        ErrorDetail::new(format!("Record {} not found", id)),
    )
}

#[async_trait]
impl<E: MockEntity> EntityBackend for MockBackend<E> {
    type Entity = E;
    type Filters = E::Filters;
    type NewPayload = E::NewPayload;
    type Patch = E::Patch;

    const KIND: StoreKind = E::KIND;
    const INSERT: InsertPosition = E::INSERT;

    async fn list(&self, filters: &E::Filters) -> Result<Vec<E>, AssetApiError> {
        // A held request reports its failure only once released
        let outcome = self.begin(MockOp::List);
        let (records, held) = {
            let mut state = self.state.lock();
            (E::select(&state.records, filters), state.held.take())
        };
        if let Some(held) = held {
            let _ = held.entered.send(());
            let _ = held.release.await;
        }
        outcome?;
        Ok(records)
    }

    async fn create(&self, payload: E::NewPayload) -> Result<E, AssetApiError> {
        self.begin(MockOp::Create)?;
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let record = E::from_payload(id, payload);
        match E::INSERT {
            InsertPosition::Front => state.records.insert(0, record.clone()),
            InsertPosition::Back => state.records.push(record.clone()),
        }
        Ok(record)
    }

    async fn update(&self, id: EntityId<Self>, patch: E::Patch) -> Result<E, AssetApiError> {
        self.begin(MockOp::Update)?;
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| not_found(id))?;
        record.apply_patch(patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: EntityId<Self>) -> Result<(), AssetApiError> {
        self.begin(MockOp::Delete)?;
        let mut state = self.state.lock();
        let index = state
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| not_found(id))?;
        state.records.remove(index);
        Ok(())
    }
}

#[async_trait]
impl DeactivateBackend for MockBackend<RecurringTransaction> {
    async fn deactivate(&self, id: RecurringId) -> Result<(), AssetApiError> {
        self.begin(MockOp::Deactivate)?;
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        record.is_active = false;
        Ok(())
    }

    fn mark_inactive(entity: &mut RecurringTransaction) {
        entity.is_active = false;
    }
}

struct SummaryMockState {
    summary: Summary,
    trend: NetWorthTrend,
    fail_summary: bool,
    fail_trend: bool,
    summary_calls: usize,
}

/// Summary endpoint double returning whatever was last set
#[derive(Clone)]
pub struct MockSummaryBackend {
    state: Arc<Mutex<SummaryMockState>>,
}

impl MockSummaryBackend {
    pub fn new(summary: Summary) -> Self {
        Self {
            state: Arc::new(Mutex::new(SummaryMockState {
                summary,
                trend: NetWorthTrend::default(),
                fail_summary: false,
                fail_trend: false,
                summary_calls: 0,
            })),
        }
    }

    pub fn set_summary(&self, summary: Summary) {
        self.state.lock().summary = summary;
    }

    pub fn set_trend(&self, trend: NetWorthTrend) {
        self.state.lock().trend = trend;
    }

    pub fn fail_summary(&self, fail: bool) {
        self.state.lock().fail_summary = fail;
    }

    pub fn fail_trend(&self, fail: bool) {
        self.state.lock().fail_trend = fail;
    }

    pub fn summary_calls(&self) -> usize {
        self.state.lock().summary_calls
    }
}

impl Default for MockSummaryBackend {
    fn default() -> Self {
        Self::new(fixtures::summary(0, Vec::new()))
    }
}

fn server_error() -> AssetApiError {
    AssetApiError::Api(
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorDetail::new("summary unavailable"),
    )
}

#[async_trait]
impl SummaryBackend for MockSummaryBackend {
    async fn summary(&self) -> Result<Summary, AssetApiError> {
        let mut state = self.state.lock();
        state.summary_calls += 1;
        if state.fail_summary {
            return Err(server_error());
        }
        Ok(state.summary.clone())
    }

    async fn net_worth_trend(&self, _months: u32) -> Result<NetWorthTrend, AssetApiError> {
        let state = self.state.lock();
        if state.fail_trend {
            return Err(server_error());
        }
        Ok(state.trend.clone())
    }
}

/// Record builders with fixed timestamps
pub mod fixtures {
    use super::*;
    use asset_api::endpoints::{AccountType, Frequency, TransactionType};
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    pub fn timestamp() -> NaiveDateTime {
        date(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap_or_default()
    }

    pub fn account(id: i64, name: &str, balance: i64) -> Account {
        Account::from_payload(id, new_account(name, balance))
    }

    pub fn new_account(name: &str, balance: i64) -> NewAccount {
        NewAccount::new(name, AccountType::Checking).balance(balance)
    }

    pub fn transaction(id: i64, account_id: i64, amount: i64) -> Transaction {
        Transaction::from_payload(id, new_transaction(account_id, amount))
    }

    pub fn new_transaction(account_id: i64, amount: i64) -> NewTransaction {
        NewTransaction::new(
            AccountId::new(account_id),
            TransactionType::Expense,
            "Food",
            amount,
            date(2024, 6, 1),
        )
    }

    pub fn recurring(id: i64, account_id: i64, amount: i64) -> RecurringTransaction {
        RecurringTransaction::from_payload(id, new_recurring(account_id, amount))
    }

    pub fn new_recurring(account_id: i64, amount: i64) -> NewRecurring {
        NewRecurring::new(
            AccountId::new(account_id),
            TransactionType::Expense,
            "Rent",
            amount,
            Frequency::Monthly,
            date(2024, 1, 1),
        )
        .day_of_month(1u8)
    }

    /// Summary whose totals all equal `total`
    pub fn summary(total: i64, accounts: Vec<Account>) -> Summary {
        let total = Decimal::from(total);
        Summary {
            total_assets: total,
            net_worth: total,
            monthly_fixed_expenses: Decimal::ZERO,
            monthly_variable_expenses: Decimal::ZERO,
            monthly_income: Decimal::ZERO,
            net_monthly_cashflow: Decimal::ZERO,
            accounts,
        }
    }
}
