use crate::events::StoreKind;
use asset_api::AssetApiError;
use thiserror::Error;

/// A request against the backend failed; always surfaced to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to load {store}: {source}")]
    Fetch {
        store: StoreKind,
        #[source]
        source: AssetApiError,
    },

    #[error("Failed to {action} {store}: {source}")]
    Mutation {
        store: StoreKind,
        action: &'static str,
        #[source]
        source: AssetApiError,
    },
}

impl StoreError {
    pub fn fetch(store: StoreKind, source: AssetApiError) -> Self {
        StoreError::Fetch { store, source }
    }

    pub fn mutation(store: StoreKind, action: &'static str, source: AssetApiError) -> Self {
        StoreError::Mutation {
            store,
            action,
            source,
        }
    }

    pub fn store(&self) -> StoreKind {
        match self {
            StoreError::Fetch { store, .. } | StoreError::Mutation { store, .. } => *store,
        }
    }
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Preference storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
