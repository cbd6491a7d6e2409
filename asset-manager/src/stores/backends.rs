use super::{DeactivateBackend, EntityBackend, InsertPosition, SummaryBackend};
use crate::events::StoreKind;
use asset_api::endpoints::{
    accounts::{Account, AccountPatch, NewAccount},
    recurring::{NewRecurring, RecurringFilters, RecurringPatch, RecurringTransaction},
    summary::{NetWorthTrend, Summary},
    transactions::{NewTransaction, Transaction, TransactionFilters, TransactionPatch},
    AccountId, RecurringId, TransactionId,
};
use asset_api::{AssetApiError, Client, Request};
use async_trait::async_trait;
use std::sync::Arc;

/// Account collection served by the REST backend
#[derive(Clone)]
pub struct AccountsApi {
    client: Arc<Client>,
}

impl AccountsApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityBackend for AccountsApi {
    type Entity = Account;
    type Filters = ();
    type NewPayload = NewAccount;
    type Patch = AccountPatch;

    const KIND: StoreKind = StoreKind::Accounts;

    async fn list(&self, _filters: &()) -> Result<Vec<Account>, AssetApiError> {
        self.client.send(Request::accounts().list()).await
    }

    async fn create(&self, payload: NewAccount) -> Result<Account, AssetApiError> {
        self.client.send(Request::accounts().create(payload)).await
    }

    async fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, AssetApiError> {
        self.client.send(Request::accounts().update(id, patch)).await
    }

    async fn delete(&self, id: AccountId) -> Result<(), AssetApiError> {
        self.client.send(Request::accounts().delete(id)).await?;
        Ok(())
    }
}

/// Transaction collection served by the REST backend, newest first
#[derive(Clone)]
pub struct TransactionsApi {
    client: Arc<Client>,
}

impl TransactionsApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityBackend for TransactionsApi {
    type Entity = Transaction;
    type Filters = TransactionFilters;
    type NewPayload = NewTransaction;
    type Patch = TransactionPatch;

    const KIND: StoreKind = StoreKind::Transactions;
    const INSERT: InsertPosition = InsertPosition::Front;

    async fn list(&self, filters: &TransactionFilters) -> Result<Vec<Transaction>, AssetApiError> {
        self.client
            .send(Request::transactions().list(filters.clone()))
            .await
    }

    async fn create(&self, payload: NewTransaction) -> Result<Transaction, AssetApiError> {
        self.client
            .send(Request::transactions().create(payload))
            .await
    }

    async fn update(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, AssetApiError> {
        self.client
            .send(Request::transactions().update(id, patch))
            .await
    }

    async fn delete(&self, id: TransactionId) -> Result<(), AssetApiError> {
        self.client.send(Request::transactions().delete(id)).await?;
        Ok(())
    }
}

/// Recurring transaction collection served by the REST backend
#[derive(Clone)]
pub struct RecurringApi {
    client: Arc<Client>,
}

impl RecurringApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityBackend for RecurringApi {
    type Entity = RecurringTransaction;
    type Filters = RecurringFilters;
    type NewPayload = NewRecurring;
    type Patch = RecurringPatch;

    const KIND: StoreKind = StoreKind::Recurring;

    async fn list(
        &self,
        filters: &RecurringFilters,
    ) -> Result<Vec<RecurringTransaction>, AssetApiError> {
        self.client
            .send(Request::recurring().list(filters.clone()))
            .await
    }

    async fn create(&self, payload: NewRecurring) -> Result<RecurringTransaction, AssetApiError> {
        self.client.send(Request::recurring().create(payload)).await
    }

    async fn update(
        &self,
        id: RecurringId,
        patch: RecurringPatch,
    ) -> Result<RecurringTransaction, AssetApiError> {
        self.client
            .send(Request::recurring().update(id, patch))
            .await
    }

    async fn delete(&self, id: RecurringId) -> Result<(), AssetApiError> {
        self.client.send(Request::recurring().delete(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl DeactivateBackend for RecurringApi {
    async fn deactivate(&self, id: RecurringId) -> Result<(), AssetApiError> {
        self.client.send(Request::recurring().deactivate(id)).await?;
        Ok(())
    }

    fn mark_inactive(entity: &mut RecurringTransaction) {
        entity.is_active = false;
    }
}

/// Summary aggregate served by the REST backend
#[derive(Clone)]
pub struct SummaryApi {
    client: Arc<Client>,
}

impl SummaryApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SummaryBackend for SummaryApi {
    async fn summary(&self) -> Result<Summary, AssetApiError> {
        self.client.send(Request::summary().get()).await
    }

    async fn net_worth_trend(&self, months: u32) -> Result<NetWorthTrend, AssetApiError> {
        self.client
            .send(Request::summary().net_worth_trend(months))
            .await
    }
}
