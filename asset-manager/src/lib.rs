pub mod animation;
mod app;
pub mod cascade;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;
pub mod notifications;
pub mod preferences;
pub mod stores;

pub use crate::config::Settings;
pub use app::App;
pub use context::AppContext;
pub use error::{PreferenceError, SettingsError, StoreError};

// Always expose testing module (integration tests need it)
pub mod testing;
