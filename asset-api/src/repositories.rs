use crate::endpoints::{
    AccountId, RecurringId, TransactionId,
    accounts::{AccountPatch, CreateAccount, DeleteAccount, ListAccounts, NewAccount, UpdateAccount},
    recurring::{
        CreateRecurring, DeactivateRecurring, DeleteRecurring, ListRecurring, NewRecurring,
        RecurringFilters, RecurringPatch, UpdateRecurring,
    },
    summary::{GetNetWorthTrend, GetSummary},
    transactions::{
        CreateTransaction, DeleteTransaction, ListTransactions, NewTransaction,
        TransactionFilters, TransactionPatch, UpdateTransaction,
    },
};

#[derive(Default)]
pub struct AccountRepository;

impl AccountRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self) -> ListAccounts {
        ListAccounts
    }

    pub fn create(&self, account: NewAccount) -> CreateAccount {
        CreateAccount::new(account)
    }

    pub fn update(&self, account_id: AccountId, patch: AccountPatch) -> UpdateAccount {
        UpdateAccount::new(account_id, patch)
    }

    pub fn delete(&self, account_id: AccountId) -> DeleteAccount {
        DeleteAccount::new(account_id)
    }
}

#[derive(Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self, filters: TransactionFilters) -> ListTransactions {
        ListTransactions::new(filters)
    }

    pub fn create(&self, transaction: NewTransaction) -> CreateTransaction {
        CreateTransaction::new(transaction)
    }

    pub fn update(
        &self,
        transaction_id: TransactionId,
        patch: TransactionPatch,
    ) -> UpdateTransaction {
        UpdateTransaction::new(transaction_id, patch)
    }

    pub fn delete(&self, transaction_id: TransactionId) -> DeleteTransaction {
        DeleteTransaction::new(transaction_id)
    }
}

#[derive(Default)]
pub struct RecurringRepository;

impl RecurringRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self, filters: RecurringFilters) -> ListRecurring {
        ListRecurring::new(filters)
    }

    pub fn create(&self, recurring: NewRecurring) -> CreateRecurring {
        CreateRecurring::new(recurring)
    }

    pub fn update(&self, recurring_id: RecurringId, patch: RecurringPatch) -> UpdateRecurring {
        UpdateRecurring::new(recurring_id, patch)
    }

    pub fn deactivate(&self, recurring_id: RecurringId) -> DeactivateRecurring {
        DeactivateRecurring::new(recurring_id)
    }

    pub fn delete(&self, recurring_id: RecurringId) -> DeleteRecurring {
        DeleteRecurring::new(recurring_id)
    }
}

#[derive(Default)]
pub struct SummaryRepository;

impl SummaryRepository {
    pub fn new() -> Self {
        Self
    }

    pub fn get(&self) -> GetSummary {
        GetSummary
    }

    pub fn net_worth_trend(&self, months: u32) -> GetNetWorthTrend {
        GetNetWorthTrend::new(months)
    }
}
