//! Persisted icon theme selection.
//!
//! The effective selection is a tiny TOML file:
//!
//! ```toml
//! icon_theme = "breeze"
//! overrides = false
//! ```
//!
//! [`SettingsStore`] holds it in memory, writes it back on request, and
//! fans theme changes out to subscribers. It is the [`ConfigBus`] the
//! selection session commits through.

use std::cell::RefCell;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::session::ConfigBus;

/// Effective icon theme configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconThemeSettings {
    /// Selected theme id; unset means the desktop default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_theme: Option<String>,

    /// Whether the icon theme takes precedence over icons shipped by the
    /// general desktop theme.
    pub overrides: bool,
}

impl IconThemeSettings {
    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/iconsel/settings.toml`, else under `~/.config`.
    pub fn default_path() -> PathBuf {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("iconsel/settings.toml")
    }
}

type ThemeChangedCallback = Box<dyn Fn(Option<&str>)>;

/// File-backed effective settings with change subscribers.
pub struct SettingsStore {
    path: PathBuf,
    current: RefCell<IconThemeSettings>,
    listeners: RefCell<Vec<ThemeChangedCallback>>,
}

impl SettingsStore {
    /// Load the store from `path` (defaults when the file doesn't exist).
    pub fn open(path: PathBuf) -> Result<Self> {
        let current = IconThemeSettings::load(&path)?;
        Ok(Self::with_settings(path, current))
    }

    pub fn with_settings(path: PathBuf, current: IconThemeSettings) -> Self {
        Self {
            path,
            current: RefCell::new(current),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> IconThemeSettings {
        self.current.borrow().clone()
    }

    /// Register a callback run after every committed theme change.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + 'static,
    {
        self.listeners.borrow_mut().push(Box::new(callback));
    }
}

impl ConfigBus for SettingsStore {
    fn store(&self, settings: &IconThemeSettings) {
        *self.current.borrow_mut() = settings.clone();
    }

    fn request_persist(&self) -> Result<()> {
        self.current.borrow().save(&self.path)?;
        debug!("Saved icon theme settings to {}", self.path.display());
        Ok(())
    }

    fn notify_theme_changed(&self, theme_id: Option<&str>) {
        info!("Icon theme changed to {}", theme_id.unwrap_or("<unset>"));
        for listener in self.listeners.borrow().iter() {
            listener(theme_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = IconThemeSettings::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, IconThemeSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let settings = IconThemeSettings {
            icon_theme: Some("Papirus".to_string()),
            overrides: true,
        };

        settings.save(&path).unwrap();
        assert_eq!(IconThemeSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_unset_theme_not_written() {
        let content = toml::to_string(&IconThemeSettings::default()).unwrap();
        assert!(!content.contains("icon_theme"));
        assert!(content.contains("overrides = false"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "icon_theme = [").unwrap();
        assert!(IconThemeSettings::load(&path).is_err());
    }

    #[test]
    fn test_store_bus_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let store = SettingsStore::open(path.clone()).unwrap();

        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        store.subscribe(move |theme| {
            assert_eq!(theme, Some("breeze"));
            counter.set(counter.get() + 1);
        });

        let settings = IconThemeSettings {
            icon_theme: Some("breeze".to_string()),
            overrides: false,
        };
        store.store(&settings);
        store.request_persist().unwrap();
        store.notify_theme_changed(Some("breeze"));

        assert_eq!(store.current(), settings);
        assert_eq!(notified.get(), 1);
        assert_eq!(IconThemeSettings::load(&path).unwrap(), settings);
    }
}
