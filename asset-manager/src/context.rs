use crate::animation::AnimatedCounter;
use crate::cascade::CascadeCoordinator;
use crate::config::Settings;
use crate::error::StoreError;
use crate::events::MutationEvent;
use crate::notifications::NotificationQueue;
use crate::preferences::{FileStore, MemoryStore, TerminalColorScheme, ThemePreference};
use crate::stores::backends::{AccountsApi, RecurringApi, SummaryApi, TransactionsApi};
use crate::stores::summary::as_display_number;
use crate::stores::{
    DeactivateBackend, EntityBackend, RemoteEntityStore, SummaryBackend, SummaryState,
    SummaryStore,
};
use asset_api::endpoints::{
    accounts::Account,
    recurring::RecurringTransaction,
    transactions::{Transaction, TransactionFilters},
    Decimal,
};
use asset_api::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything the presentation layer talks to, built once at start-up.
///
/// Stores publish mutation events into a shared channel; the receiving end
/// stays here until [`start_cascade`](Self::start_cascade) hands it to the
/// coordinator.
pub struct AppContext<A = AccountsApi, T = TransactionsApi, R = RecurringApi, S = SummaryApi>
where
    A: EntityBackend<Entity = Account>,
    T: EntityBackend<Entity = Transaction, Filters = TransactionFilters>,
    R: DeactivateBackend<Entity = RecurringTransaction>,
    S: SummaryBackend,
{
    pub settings: Settings,
    pub accounts: Arc<RemoteEntityStore<A>>,
    pub transactions: Arc<RemoteEntityStore<T>>,
    pub recurring: Arc<RemoteEntityStore<R>>,
    pub summary: Arc<SummaryStore<S>>,
    pub notifications: NotificationQueue,
    pub theme: Arc<ThemePreference>,
    cascade_rx: Option<mpsc::UnboundedReceiver<MutationEvent>>,
}

impl AppContext {
    /// Context backed by the REST API at `settings.api_base_url`
    pub fn from_settings(settings: Settings) -> Self {
        let client = Arc::new(Client::new(&settings.api_base_url));
        tracing::info!("Using backend at {}", client.base_url());

        let theme = match settings.preferences_path() {
            Some(path) => {
                tracing::debug!("Theme preferences stored in {}", path.display());
                ThemePreference::new(FileStore::new(path), TerminalColorScheme)
            }
            None => {
                tracing::warn!("No preferences location, theme changes will not persist");
                ThemePreference::new(MemoryStore::new(), TerminalColorScheme)
            }
        };

        Self::with_backends(
            settings,
            AccountsApi::new(client.clone()),
            TransactionsApi::new(client.clone()),
            RecurringApi::new(client.clone()),
            SummaryApi::new(client),
            theme,
        )
    }
}

impl<A, T, R, S> AppContext<A, T, R, S>
where
    A: EntityBackend<Entity = Account>,
    T: EntityBackend<Entity = Transaction, Filters = TransactionFilters>,
    R: DeactivateBackend<Entity = RecurringTransaction>,
    S: SummaryBackend,
{
    pub fn with_backends(
        settings: Settings,
        accounts: A,
        transactions: T,
        recurring: R,
        summary: S,
        theme: ThemePreference,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let notifications = NotificationQueue::with_default_duration(settings.toast_duration());

        Self {
            accounts: Arc::new(RemoteEntityStore::new(accounts).with_events(events_tx.clone())),
            transactions: Arc::new(
                RemoteEntityStore::new(transactions).with_events(events_tx.clone()),
            ),
            recurring: Arc::new(RemoteEntityStore::new(recurring).with_events(events_tx)),
            summary: Arc::new(SummaryStore::new(summary)),
            notifications,
            theme: Arc::new(theme),
            settings,
            cascade_rx: Some(events_rx),
        }
    }

    /// Spawn the cascade coordinator. Only the first call starts one.
    pub fn start_cascade(&mut self) -> Option<JoinHandle<()>> {
        let events = self.cascade_rx.take()?;
        let coordinator = CascadeCoordinator::new(self.summary.clone(), self.accounts.clone());
        Some(coordinator.spawn(events))
    }

    pub fn transaction_filters(&self) -> TransactionFilters {
        TransactionFilters::new().limit(self.settings.transaction_limit)
    }

    /// Fetch every store concurrently.
    ///
    /// Each failure is shown as an error toast and returned; the other
    /// stores still load.
    pub async fn load_all(&self) -> Vec<StoreError> {
        tracing::info!("Loading all stores");

        let (accounts, transactions, recurring, summary, trend) = tokio::join!(
            self.accounts.fetch_all(Default::default()),
            self.transactions.fetch_all(self.transaction_filters()),
            self.recurring.fetch_all(Default::default()),
            self.summary.fetch(),
            self.summary.fetch_trend(self.settings.trend_months),
        );

        // The trend keeps its previous points on failure and is not worth a toast
        if let Err(e) = trend {
            tracing::debug!("Initial trend load failed: {}", e);
        }

        let failures: Vec<StoreError> = [accounts, transactions, recurring, summary.map(|_| ())]
            .into_iter()
            .filter_map(Result::err)
            .collect();
        for failure in &failures {
            self.notifications.error(failure.to_string(), None);
        }
        failures
    }

    /// Animated counter that follows one summary metric
    pub fn summary_counter(
        &self,
        metric: fn(&SummaryState) -> Decimal,
    ) -> (AnimatedCounter, JoinHandle<()>) {
        let initial = as_display_number(metric(&self.summary.snapshot()));
        let counter = AnimatedCounter::new(initial, self.settings.animation_options());
        let task = counter.follow(self.summary.subscribe(), move |state| {
            as_display_number(metric(state))
        });
        (counter, task)
    }
}
