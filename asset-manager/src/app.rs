use anyhow::Result;

use crate::config::Settings;
use crate::context::AppContext;
use crate::logging::init_logging;
use crate::stores::SummaryState;

pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn run(self) -> Result<()> {
        let (log_path, _log_guard) = init_logging()?;
        tracing::info!("asset-manager starting, logging to {}", log_path.display());

        self.settings.validate()?;
        let mut context = AppContext::from_settings(self.settings);

        let theme = context.theme.init();
        tracing::info!("Theme: {}", theme);

        let cascade = context.start_cascade();

        let failures = context.load_all().await;
        if failures.is_empty() {
            tracing::info!("Initial load complete");
        } else {
            tracing::warn!("Initial load finished with {} failures", failures.len());
        }

        let (total_assets, assets_task) = context.summary_counter(SummaryState::total_assets);
        let (cashflow, cashflow_task) =
            context.summary_counter(SummaryState::net_monthly_cashflow);

        let mut toasts = context.notifications.subscribe();
        let mut assets_rx = total_assets.subscribe();
        let mut cashflow_rx = cashflow.subscribe();
        let mut theme_rx = context.theme.subscribe();

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        tracing::info!("Entering main event loop");

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    if let Err(e) = result {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                    tracing::info!("Shutdown requested, exiting event loop");
                    break;
                }
                Ok(()) = toasts.changed() => {
                    let active = toasts.borrow_and_update().clone();
                    tracing::info!("{} active notifications", active.len());
                    for toast in &active {
                        tracing::info!("[{}] {}", toast.kind.as_str(), toast.message);
                    }
                }
                Ok(()) = assets_rx.changed() => {
                    tracing::debug!("Total assets: {}", *assets_rx.borrow_and_update());
                }
                Ok(()) = cashflow_rx.changed() => {
                    tracing::debug!("Net monthly cashflow: {}", *cashflow_rx.borrow_and_update());
                }
                Ok(()) = theme_rx.changed() => {
                    tracing::info!("Theme switched to {}", *theme_rx.borrow_and_update());
                }
            }
        }

        tracing::info!("Cleaning up application");

        assets_task.abort();
        cashflow_task.abort();
        if let Some(cascade) = cascade {
            cascade.abort();
        }

        Ok(())
    }
}
