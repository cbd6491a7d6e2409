use crate::animation::{ease_out_quad, AnimationOptions};
use crate::error::SettingsError;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "ASSET_MANAGER";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Page size for the transaction list
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: u32,

    #[serde(default = "default_trend_months")]
    pub trend_months: u32,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub animation: AnimationSettings,

    /// Theme storage file; defaults to the user config directory
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NotificationSettings {
    #[serde(default = "default_toast_duration_ms")]
    pub default_duration_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AnimationSettings {
    #[serde(default = "default_animation_duration_ms")]
    pub duration_ms: u64,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

fn default_api_base_url() -> String {
    asset_api::DEFAULT_BASE_URL.to_string()
}

fn default_transaction_limit() -> u32 {
    asset_api::endpoints::transactions::DEFAULT_LIMIT
}

fn default_trend_months() -> u32 {
    asset_api::endpoints::summary::DEFAULT_TREND_MONTHS
}

fn default_toast_duration_ms() -> u64 {
    3000
}

fn default_animation_duration_ms() -> u64 {
    1000
}

fn default_frame_interval_ms() -> u64 {
    16
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            default_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            duration_ms: default_animation_duration_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            transaction_limit: default_transaction_limit(),
            trend_months: default_trend_months(),
            notifications: NotificationSettings::default(),
            animation: AnimationSettings::default(),
            preferences_path: None,
        }
    }
}

impl Settings {
    /// Load from the file named by `ASSET_MANAGER_CONFIG` (default
    /// `config.toml`, optional) overridden by `ASSET_MANAGER_*` variables.
    /// Nested keys use `__`, e.g. `ASSET_MANAGER_ANIMATION__DURATION_MS`.
    pub fn new() -> Result<Self, SettingsError> {
        let config_path =
            std::env::var("ASSET_MANAGER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load(&config_path)
    }

    pub fn load(config_path: &str) -> Result<Self, SettingsError> {
        let builder = Config::builder().add_source(File::with_name(config_path).required(false));
        Self::build(builder)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.api_base_url.is_empty() {
            return Err(SettingsError::Invalid("api_base_url is required".to_string()));
        }
        if !self.api_base_url.starts_with("http") {
            return Err(SettingsError::Invalid(
                "api_base_url must be a valid HTTP(S) URL".to_string(),
            ));
        }
        if self.transaction_limit == 0 {
            return Err(SettingsError::Invalid(
                "transaction_limit must be positive".to_string(),
            ));
        }
        if self.trend_months == 0 {
            return Err(SettingsError::Invalid("trend_months must be positive".to_string()));
        }
        if self.notifications.default_duration_ms == 0 {
            return Err(SettingsError::Invalid(
                "notifications.default_duration_ms must be positive".to_string(),
            ));
        }
        if self.animation.frame_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "animation.frame_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.default_duration_ms)
    }

    pub fn animation_options(&self) -> AnimationOptions {
        AnimationOptions {
            duration: Duration::from_millis(self.animation.duration_ms),
            easing: ease_out_quad,
            frame_interval: Duration::from_millis(self.animation.frame_interval_ms),
        }
    }

    /// Configured theme storage file, or `<config dir>/asset-manager/preferences.json`
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("asset-manager").join("preferences.json"))
        })
    }
}
