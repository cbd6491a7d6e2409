use crate::error::PreferenceError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Storage key of the persisted theme
pub const THEME_KEY: &str = "asset-manager-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(PreferenceError::Storage(format!(
                "Unknown theme value: {}",
                other
            ))),
        }
    }
}

/// Durable string storage keyed by name
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Key-value pairs kept as a JSON object in a single file
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/asset-manager/preferences.json`
    pub fn default_location() -> Result<Self, PreferenceError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PreferenceError::Storage("Could not find config directory".to_string()))?
            .join("asset-manager");
        Ok(Self::new(config_dir.join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock();
        let mut values = self.read_map().unwrap_or_else(|e| {
            tracing::warn!(
                "Replacing unreadable preferences file {}: {}",
                self.path.display(),
                e
            );
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Process-local storage; clones share the same values
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Environment-level dark mode hint; `None` when there is no signal
pub trait AmbientPreference: Send + Sync {
    fn prefers_dark(&self) -> Option<bool>;
}

impl<F> AmbientPreference for F
where
    F: Fn() -> Option<bool> + Send + Sync,
{
    fn prefers_dark(&self) -> Option<bool> {
        self()
    }
}

/// Reads the terminal background from `COLORFGBG` (`"fg;bg"`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalColorScheme;

impl TerminalColorScheme {
    fn parse(value: &str) -> Option<bool> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        Some(matches!(background, 0..=6 | 8))
    }
}

impl AmbientPreference for TerminalColorScheme {
    fn prefers_dark(&self) -> Option<bool> {
        std::env::var("COLORFGBG")
            .ok()
            .as_deref()
            .and_then(Self::parse)
    }
}

/// The theme setting.
///
/// The persisted value is read once, on the first [`init`](Self::init);
/// later calls only return the current theme. Changes are published to
/// subscribers before they are written to storage.
pub struct ThemePreference {
    storage: Box<dyn KeyValueStore>,
    ambient: Box<dyn AmbientPreference>,
    theme: watch::Sender<Theme>,
    initialized: OnceLock<()>,
}

impl ThemePreference {
    pub fn new(
        storage: impl KeyValueStore + 'static,
        ambient: impl AmbientPreference + 'static,
    ) -> Self {
        Self {
            storage: Box::new(storage),
            ambient: Box::new(ambient),
            theme: watch::Sender::new(Theme::default()),
            initialized: OnceLock::new(),
        }
    }

    pub fn init(&self) -> Theme {
        self.initialized.get_or_init(|| {
            let theme = self.resolve();
            tracing::info!("Theme initialized: {}", theme);
            self.theme.send_replace(theme);
        });
        self.theme()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get().is_some()
    }

    // Stored value, then the ambient hint, then light
    fn resolve(&self) -> Theme {
        match self.storage.get(THEME_KEY) {
            Ok(Some(value)) => match value.parse::<Theme>() {
                Ok(theme) => return theme,
                Err(e) => tracing::warn!("Ignoring stored theme: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read stored theme: {}", e),
        }

        match self.ambient.prefers_dark() {
            Some(true) => Theme::Dark,
            Some(false) | None => Theme::Light,
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    pub fn is_dark(&self) -> bool {
        self.theme() == Theme::Dark
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }

    /// Apply `theme` and persist it if it differs from the current one.
    ///
    /// A storage failure is returned after the new theme has been applied.
    pub fn set_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        self.init();

        let changed = self.theme.send_if_modified(|current| {
            if *current == theme {
                return false;
            }
            *current = theme;
            true
        });
        if !changed {
            return Ok(());
        }

        tracing::info!("Theme changed to {}", theme);
        self.storage.set(THEME_KEY, theme.as_str()).inspect_err(|e| {
            tracing::warn!("Failed to persist theme: {}", e);
        })
    }

    pub fn toggle_theme(&self) -> Result<Theme, PreferenceError> {
        let theme = self.init().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn no_hint() -> Option<bool> {
        None
    }

    #[test]
    fn stored_value_wins_over_ambient() {
        let storage = MemoryStore::new();
        storage.set(THEME_KEY, "light").unwrap();
        let preference = ThemePreference::new(storage, || Some(true));
        assert_eq!(preference.init(), Theme::Light);
    }

    #[test]
    fn ambient_used_when_nothing_stored() {
        let preference = ThemePreference::new(MemoryStore::new(), || Some(true));
        assert_eq!(preference.init(), Theme::Dark);
    }

    #[test]
    fn defaults_to_light() {
        let preference = ThemePreference::new(MemoryStore::new(), no_hint);
        assert_eq!(preference.init(), Theme::Light);
    }

    #[test]
    fn garbage_in_storage_falls_back() {
        let storage = MemoryStore::new();
        storage.set(THEME_KEY, "sepia").unwrap();
        let preference = ThemePreference::new(storage, || Some(true));
        assert_eq!(preference.init(), Theme::Dark);
    }

    #[test]
    fn init_reads_storage_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let preference = ThemePreference::new(MemoryStore::new(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(true)
        });

        preference.init();
        preference.init();
        preference.set_theme(Theme::Light).unwrap();
        assert_eq!(preference.init(), Theme::Light);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_theme_persists_and_reload_skips_ambient() {
        let storage = MemoryStore::new();
        let first = ThemePreference::new(storage.clone(), no_hint);
        first.set_theme(Theme::Dark).unwrap();
        assert!(first.is_dark());

        let consulted = Arc::new(AtomicUsize::new(0));
        let counter = consulted.clone();
        let reloaded = ThemePreference::new(storage, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(false)
        });
        assert_eq!(reloaded.init(), Theme::Dark);
        assert_eq!(consulted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn toggle_publishes_to_subscribers() {
        let preference = ThemePreference::new(MemoryStore::new(), no_hint);
        let mut rx = preference.subscribe();

        assert_eq!(preference.toggle_theme().unwrap(), Theme::Dark);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Theme::Dark);

        assert_eq!(preference.toggle_theme().unwrap(), Theme::Light);
    }

    #[test]
    fn file_store_round_trips_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        let store = FileStore::new(&path);

        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        store.set("other", "value").unwrap();
        store.set(THEME_KEY, "dark").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_next_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        let preference = ThemePreference::new(FileStore::new(&path), no_hint);
        assert_eq!(preference.init(), Theme::Light);
        preference.set_theme(Theme::Dark).unwrap();
        assert_eq!(preference.toggle_theme().unwrap(), Theme::Light);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn persist_failure_still_applies_theme() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a preferences file
        let preference = ThemePreference::new(FileStore::new(dir.path()), no_hint);

        assert!(preference.set_theme(Theme::Dark).is_err());
        assert_eq!(preference.theme(), Theme::Dark);
    }

    #[test]
    fn colorfgbg_background_decides_darkness() {
        assert_eq!(TerminalColorScheme::parse("15;0"), Some(true));
        assert_eq!(TerminalColorScheme::parse("0;15"), Some(false));
        assert_eq!(TerminalColorScheme::parse("15;default;8"), Some(true));
        assert_eq!(TerminalColorScheme::parse("garbage"), None);
    }
}
