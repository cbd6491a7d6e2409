pub mod backends;
pub mod summary;

use crate::error::StoreError;
use crate::events::{MutationEvent, MutationKind, StoreKind};
use asset_api::endpoints::{
    accounts::Account, recurring::RecurringTransaction, transactions::Transaction, AccountId,
    RecurringId, TransactionId,
};
use asset_api::AssetApiError;
use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, watch};

pub use summary::{SummaryBackend, SummaryState, SummaryStore};

/// A record with a server-assigned identity
pub trait Identified: Clone + Debug + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Debug + Display + Into<i64> + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

impl Identified for Account {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }
}

impl Identified for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

impl Identified for RecurringTransaction {
    type Id = RecurringId;

    fn id(&self) -> RecurringId {
        self.id
    }
}

/// Where a freshly created record lands in the local collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Newest-first collections (transactions)
    Front,
    Back,
}

pub type EntityId<B> = <<B as EntityBackend>::Entity as Identified>::Id;

/// Request seam between a store and the backend collection it caches.
///
/// Production implementations live in [`backends`]; tests use
/// [`crate::testing::MockBackend`].
#[async_trait]
pub trait EntityBackend: Send + Sync + 'static {
    type Entity: Identified;
    type Filters: Clone + Default + Debug + Send + Sync + 'static;
    type NewPayload: Debug + Send + 'static;
    type Patch: Debug + Send + 'static;

    const KIND: StoreKind;
    const INSERT: InsertPosition = InsertPosition::Back;

    async fn list(&self, filters: &Self::Filters) -> Result<Vec<Self::Entity>, AssetApiError>;

    async fn create(&self, payload: Self::NewPayload) -> Result<Self::Entity, AssetApiError>;

    async fn update(
        &self,
        id: EntityId<Self>,
        patch: Self::Patch,
    ) -> Result<Self::Entity, AssetApiError>;

    async fn delete(&self, id: EntityId<Self>) -> Result<(), AssetApiError>;
}

/// Backends whose records can be switched off without being deleted
#[async_trait]
pub trait DeactivateBackend: EntityBackend {
    async fn deactivate(&self, id: EntityId<Self>) -> Result<(), AssetApiError>;

    /// Mirror the server-side deactivation on a cached record
    fn mark_inactive(entity: &mut Self::Entity);
}

/// Cached collection plus request status
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<E> {
    pub items: Vec<E>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<E> Default for StoreState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// Clears the loading flag when dropped, so a cancelled request future
/// cannot leave a store stuck in the loading state.
pub(crate) struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<T>,
    clear: fn(&mut T),
    armed: bool,
}

impl<'a, T> LoadingGuard<'a, T> {
    /// Marks the state as loading; `start` sets the flag and resets the error
    pub(crate) fn start(state: &'a watch::Sender<T>, start: fn(&mut T), clear: fn(&mut T)) -> Self {
        state.send_modify(start);
        Self {
            state,
            clear,
            armed: true,
        }
    }

    /// Applies the request outcome and clears loading in one transition
    pub(crate) fn finish(mut self, outcome: impl FnOnce(&mut T)) {
        self.armed = false;
        let clear = self.clear;
        self.state.send_modify(|state| {
            outcome(state);
            clear(state);
        });
    }
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(self.clear);
        }
    }
}

/// In-memory cache of one backend collection.
///
/// Methods take `&self` and may overlap freely; no request is serialized
/// against another. Two overlapping [`fetch_all`](Self::fetch_all) calls
/// leave whichever response arrives last in `items`, even if it answers the
/// older request.
pub struct RemoteEntityStore<B: EntityBackend> {
    backend: B,
    state: watch::Sender<StoreState<B::Entity>>,
    events: Option<mpsc::UnboundedSender<MutationEvent>>,
}

impl<B: EntityBackend> RemoteEntityStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: watch::Sender::new(StoreState::default()),
            events: None,
        }
    }

    /// Publish a [`MutationEvent`] after every successful mutation
    pub fn with_events(mut self, events: mpsc::UnboundedSender<MutationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<StoreState<B::Entity>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState<B::Entity> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<B::Entity> {
        self.state.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn find_by_id(&self, id: EntityId<B>) -> Option<B::Entity> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Replace `items` with the server collection, keeping server order
    pub async fn fetch_all(&self, filters: B::Filters) -> Result<(), StoreError> {
        tracing::info!("Loading {} ({:?})", B::KIND, filters);

        let guard = LoadingGuard::start(
            &self.state,
            |state: &mut StoreState<B::Entity>| {
                state.loading = true;
                state.error = None;
            },
            |state| state.loading = false,
        );

        match self.backend.list(&filters).await {
            Ok(items) => {
                tracing::info!("Loaded {} {}", items.len(), B::KIND);
                let items = unique_by_id(items, B::KIND);
                guard.finish(|state| state.items = items);
                Ok(())
            }
            Err(e) => {
                let err = StoreError::fetch(B::KIND, e);
                tracing::error!("{}", err);
                let message = err.to_string();
                guard.finish(|state| state.error = Some(message));
                Err(err)
            }
        }
    }

    /// Install a collection obtained elsewhere (e.g. the accounts embedded in
    /// a summary response)
    pub fn replace_all(&self, items: Vec<B::Entity>) {
        let items = unique_by_id(items, B::KIND);
        tracing::debug!("Replacing {} with {} records", B::KIND, items.len());
        self.state.send_modify(|state| state.items = items);
    }

    pub async fn create(&self, payload: B::NewPayload) -> Result<B::Entity, StoreError> {
        tracing::debug!("Creating {}: {:?}", B::KIND, payload);
        self.clear_error();

        let created = self
            .backend
            .create(payload)
            .await
            .map_err(|e| self.record_failure(StoreError::mutation(B::KIND, "create", e)))?;

        let id = created.id();
        let record = created.clone();
        self.state.send_modify(|state| {
            // A fetch that landed mid-request may already carry the record
            if let Some(existing) = state.items.iter_mut().find(|item| item.id() == id) {
                *existing = record;
            } else {
                match B::INSERT {
                    InsertPosition::Front => state.items.insert(0, record),
                    InsertPosition::Back => state.items.push(record),
                }
            }
        });

        tracing::info!("Created {} {}", B::KIND, id);
        self.publish(MutationKind::Created, id);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: EntityId<B>,
        patch: B::Patch,
    ) -> Result<B::Entity, StoreError> {
        tracing::debug!("Updating {} {}: {:?}", B::KIND, id, patch);
        self.clear_error();

        let updated = self
            .backend
            .update(id, patch)
            .await
            .map_err(|e| self.record_failure(StoreError::mutation(B::KIND, "update", e)))?;

        let record = updated.clone();
        let found = self.state.send_if_modified(|state| {
            match state.items.iter().position(|item| item.id() == id) {
                Some(index) => {
                    state.items[index] = record;
                    true
                }
                None => false,
            }
        });
        if !found {
            tracing::warn!("Updated {} {} is not in the local cache", B::KIND, id);
        }

        self.publish(MutationKind::Updated, id);
        Ok(updated)
    }

    pub async fn delete(&self, id: EntityId<B>) -> Result<(), StoreError> {
        tracing::debug!("Deleting {} {}", B::KIND, id);
        self.clear_error();

        self.backend
            .delete(id)
            .await
            .map_err(|e| self.record_failure(StoreError::mutation(B::KIND, "delete", e)))?;

        let found = self.state.send_if_modified(|state| {
            let before = state.items.len();
            state.items.retain(|item| item.id() != id);
            state.items.len() != before
        });
        if !found {
            tracing::warn!("Deleted {} {} was not in the local cache", B::KIND, id);
        }

        self.publish(MutationKind::Deleted, id);
        Ok(())
    }

    fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn record_failure(&self, err: StoreError) -> StoreError {
        tracing::error!("{}", err);
        let message = err.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        err
    }

    fn publish(&self, kind: MutationKind, id: EntityId<B>) {
        if let Some(events) = &self.events {
            let _ = events.send(MutationEvent::new(B::KIND, kind, id));
        }
    }
}

impl<B: DeactivateBackend> RemoteEntityStore<B> {
    pub async fn deactivate(&self, id: EntityId<B>) -> Result<(), StoreError> {
        tracing::debug!("Deactivating {} {}", B::KIND, id);
        self.clear_error();

        self.backend
            .deactivate(id)
            .await
            .map_err(|e| self.record_failure(StoreError::mutation(B::KIND, "deactivate", e)))?;

        let found = self.state.send_if_modified(|state| {
            match state.items.iter_mut().find(|item| item.id() == id) {
                Some(item) => {
                    B::mark_inactive(item);
                    true
                }
                None => false,
            }
        });
        if !found {
            tracing::warn!("Deactivated {} {} is not in the local cache", B::KIND, id);
        }

        self.publish(MutationKind::Deactivated, id);
        Ok(())
    }
}

/// Drops repeated identities, keeping the first occurrence
fn unique_by_id<E: Identified>(items: Vec<E>, kind: StoreKind) -> Vec<E> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    let before = items.len();
    let unique: Vec<E> = items
        .into_iter()
        .filter(|item| seen.insert(item.id()))
        .collect();
    if unique.len() != before {
        tracing::warn!(
            "Dropped {} duplicate {} records",
            before - unique.len(),
            kind
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn duplicate_ids_are_dropped_keeping_first() {
        let items = vec![
            fixtures::account(1, "Main", 100),
            fixtures::account(2, "Savings", 200),
            fixtures::account(1, "Main (stale)", 50),
        ];
        let unique = unique_by_id(items, StoreKind::Accounts);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "Main");
    }

    #[test]
    fn loading_guard_clears_flag_when_dropped() {
        let state = watch::Sender::new(StoreState::<Account>::default());
        {
            let _guard = LoadingGuard::start(
                &state,
                |s: &mut StoreState<Account>| s.loading = true,
                |s| s.loading = false,
            );
            assert!(state.borrow().loading);
        }
        assert!(!state.borrow().loading);
    }

    #[test]
    fn loading_guard_finish_applies_outcome_once() {
        let state = watch::Sender::new(StoreState::<Account>::default());
        let mut rx = state.subscribe();
        let guard = LoadingGuard::start(
            &state,
            |s: &mut StoreState<Account>| s.loading = true,
            |s| s.loading = false,
        );
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        guard.finish(|s| s.error = Some("boom".to_string()));
        let snapshot = rx.borrow_and_update().clone();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert!(!rx.has_changed().unwrap());
    }
}
