use crate::events::MutationEvent;
use crate::stores::{EntityBackend, RemoteEntityStore, SummaryBackend, SummaryStore};
use asset_api::endpoints::accounts::Account;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Keeps the summary consistent with mutations made through the entity stores.
///
/// Refreshes are best effort: the mutation that triggered them has already
/// been reported to its caller as a success, so a failed refresh is logged
/// and the summary stays stale until the next successful fetch.
pub struct CascadeCoordinator<S, A>
where
    S: SummaryBackend,
    A: EntityBackend<Entity = Account>,
{
    summary: Arc<SummaryStore<S>>,
    accounts: Arc<RemoteEntityStore<A>>,
}

impl<S, A> CascadeCoordinator<S, A>
where
    S: SummaryBackend,
    A: EntityBackend<Entity = Account>,
{
    pub fn new(summary: Arc<SummaryStore<S>>, accounts: Arc<RemoteEntityStore<A>>) -> Self {
        Self { summary, accounts }
    }

    /// React to one mutation. Never fails.
    pub async fn handle(&self, event: &MutationEvent) {
        if !event.affects_totals() {
            return;
        }
        tracing::debug!(
            "Refreshing summary after {:?} on {} {}",
            event.kind,
            event.source,
            event.id
        );
        self.refresh().await;
    }

    /// Refetch the summary and install the account balances it carries
    pub async fn refresh(&self) {
        match self.summary.fetch().await {
            Ok(summary) => self.accounts.replace_all(summary.accounts),
            Err(e) => {
                tracing::warn!("Summary refresh failed, keeping stale totals: {}", e);
            }
        }
    }

    /// Consume mutation events until every sender is dropped
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<MutationEvent>) {
        tracing::info!("Cascade coordinator started");
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        tracing::info!("Cascade coordinator stopped");
    }

    pub fn spawn(self, events: mpsc::UnboundedReceiver<MutationEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }
}
