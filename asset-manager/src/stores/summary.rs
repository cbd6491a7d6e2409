use super::LoadingGuard;
use crate::error::StoreError;
use crate::events::StoreKind;
use asset_api::endpoints::summary::{NetWorthTrend, Summary};
use asset_api::endpoints::Decimal;
use asset_api::AssetApiError;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::watch;

#[async_trait]
pub trait SummaryBackend: Send + Sync + 'static {
    async fn summary(&self) -> Result<Summary, AssetApiError>;

    async fn net_worth_trend(&self, months: u32) -> Result<NetWorthTrend, AssetApiError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryState {
    pub summary: Option<Summary>,
    pub trend: NetWorthTrend,
    pub loading: bool,
    pub error: Option<String>,
}

impl SummaryState {
    fn metric(&self, field: fn(&Summary) -> Decimal) -> Decimal {
        self.summary.as_ref().map(field).unwrap_or(Decimal::ZERO)
    }

    pub fn total_assets(&self) -> Decimal {
        self.metric(|s| s.total_assets)
    }

    pub fn net_worth(&self) -> Decimal {
        self.metric(|s| s.net_worth)
    }

    pub fn monthly_income(&self) -> Decimal {
        self.metric(|s| s.monthly_income)
    }

    pub fn monthly_fixed_expenses(&self) -> Decimal {
        self.metric(|s| s.monthly_fixed_expenses)
    }

    pub fn net_monthly_cashflow(&self) -> Decimal {
        self.metric(|s| s.net_monthly_cashflow)
    }
}

/// Lossy conversion for display purposes (animated counters, charts)
pub fn as_display_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Snapshot of the server-computed aggregate.
///
/// The snapshot is never merged locally: each successful fetch replaces it.
pub struct SummaryStore<S: SummaryBackend> {
    backend: S,
    state: watch::Sender<SummaryState>,
}

impl<S: SummaryBackend> SummaryStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            state: watch::Sender::new(SummaryState::default()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SummaryState {
        self.state.borrow().clone()
    }

    pub fn summary(&self) -> Option<Summary> {
        self.state.borrow().summary.clone()
    }

    pub fn trend(&self) -> NetWorthTrend {
        self.state.borrow().trend.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn total_assets(&self) -> Decimal {
        self.state.borrow().total_assets()
    }

    pub fn net_worth(&self) -> Decimal {
        self.state.borrow().net_worth()
    }

    pub fn monthly_income(&self) -> Decimal {
        self.state.borrow().monthly_income()
    }

    pub fn monthly_fixed_expenses(&self) -> Decimal {
        self.state.borrow().monthly_fixed_expenses()
    }

    pub fn net_monthly_cashflow(&self) -> Decimal {
        self.state.borrow().net_monthly_cashflow()
    }

    pub async fn fetch(&self) -> Result<Summary, StoreError> {
        tracing::info!("Loading summary");

        let guard = LoadingGuard::start(
            &self.state,
            |state: &mut SummaryState| {
                state.loading = true;
                state.error = None;
            },
            |state| state.loading = false,
        );

        match self.backend.summary().await {
            Ok(summary) => {
                tracing::info!(
                    "Loaded summary (total assets {}, {} accounts)",
                    summary.total_assets,
                    summary.accounts.len()
                );
                let snapshot = summary.clone();
                guard.finish(|state| state.summary = Some(snapshot));
                Ok(summary)
            }
            Err(e) => {
                let err = StoreError::fetch(StoreKind::Summary, e);
                tracing::error!("{}", err);
                let message = err.to_string();
                guard.finish(|state| state.error = Some(message));
                Err(err)
            }
        }
    }

    /// Refresh the net-worth trend; a failure keeps the previous trend
    pub async fn fetch_trend(&self, months: u32) -> Result<NetWorthTrend, StoreError> {
        tracing::debug!("Loading net worth trend ({} months)", months);

        match self.backend.net_worth_trend(months).await {
            Ok(trend) => {
                let snapshot = trend.clone();
                self.state.send_modify(|state| state.trend = snapshot);
                Ok(trend)
            }
            Err(e) => {
                let err = StoreError::fetch(StoreKind::Summary, e);
                tracing::warn!("Keeping previous net worth trend: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSummaryBackend};

    #[test]
    fn metrics_default_to_zero_before_first_fetch() {
        let state = SummaryState::default();
        assert_eq!(state.total_assets(), Decimal::ZERO);
        assert_eq!(state.net_monthly_cashflow(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn fetch_replaces_snapshot_wholesale() {
        let backend = MockSummaryBackend::new(fixtures::summary(1_000, Vec::new()));
        let store = SummaryStore::new(backend.clone());

        store.fetch().await.unwrap();
        assert_eq!(store.total_assets(), Decimal::from(1_000));

        backend.set_summary(fixtures::summary(2_500, Vec::new()));
        store.fetch().await.unwrap();
        assert_eq!(store.total_assets(), Decimal::from(2_500));
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_last_snapshot_and_reraises() {
        let backend = MockSummaryBackend::new(fixtures::summary(1_000, Vec::new()));
        let store = SummaryStore::new(backend.clone());
        store.fetch().await.unwrap();

        backend.fail_summary(true);
        let err = store.fetch().await.unwrap_err();

        assert_eq!(err.store(), StoreKind::Summary);
        assert_eq!(store.total_assets(), Decimal::from(1_000));
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn failed_trend_keeps_previous_points() {
        let backend = MockSummaryBackend::new(fixtures::summary(1_000, Vec::new()));
        backend.set_trend(NetWorthTrend {
            labels: vec!["2024-05".to_string()],
            data: vec![1_000.0],
        });
        let store = SummaryStore::new(backend.clone());
        store.fetch_trend(6).await.unwrap();

        backend.fail_trend(true);
        assert!(store.fetch_trend(6).await.is_err());
        assert_eq!(store.trend().latest(), Some(("2024-05", 1_000.0)));
    }
}
