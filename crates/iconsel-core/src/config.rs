//! Configuration types and parsing.
//!
//! The picker configuration covers icon sizes, the icon candidates used for
//! list rows and preview slots, and where themes and the persisted selection
//! live. The selection itself is not part of this file; see
//! [`crate::settings`].

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::error::{Error, Result};
use crate::preview::{IconCandidates, PreviewResolver, PreviewSlot};

/// Largest icon size accepted for list rows and previews.
const MAX_ICON_SIZE: u32 = 512;

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// List and preview icon settings.
    pub picker: PickerConfig,

    /// Icon theme discovery.
    pub catalog: CatalogConfig,

    /// Persisted selection location.
    pub settings: SettingsConfig,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Parse a TOML string and deep-merge it over the embedded defaults
    /// (user values win).
    pub fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// If `explicit_path` is `Some`, that path is used directly and an error
    /// is returned if it doesn't exist or can't be parsed (no fallback).
    ///
    /// If `explicit_path` is `None`, searches in order:
    /// 1. `$XDG_CONFIG_HOME/iconsel/config.toml`
    /// 2. `~/.config/iconsel/config.toml`
    /// 3. `./config.toml` (current working directory)
    ///
    /// If no config file is found, the embedded default is used.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        // A config file that exists but fails to load is an error, not a
        // reason to fall back to defaults.
        let search_paths = Self::config_search_paths();
        for path in &search_paths {
            if path.exists() {
                return match Self::load(path) {
                    Ok(config) => Ok(ConfigLoadResult {
                        config,
                        source: Some(path.clone()),
                        used_defaults: false,
                    }),
                    Err(e) => {
                        tracing::error!("Config file {:?} exists but failed to load: {}", path, e);
                        Err(e)
                    }
                };
            }
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("iconsel/config.toml"));
        }

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/iconsel/config.toml"));
        }

        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        for (key, size) in [
            ("picker.list_icon_size", self.picker.list_icon_size),
            ("picker.preview_size", self.picker.preview_size),
        ] {
            if size == 0 || size > MAX_ICON_SIZE {
                errors.push(format!(
                    "{}: invalid value '{}', must be between 1 and {}",
                    key, size, MAX_ICON_SIZE
                ));
            }
        }

        if self.picker.fallback_icons.is_empty() {
            errors.push("picker.fallback_icons: must list at least one icon name".to_string());
        }
        if self.picker.fallback_icons.iter().any(|n| n.trim().is_empty()) {
            errors.push("picker.fallback_icons: icon names must not be empty".to_string());
        }

        for slot in PreviewSlot::ALL {
            if self.picker.preview.icon_for(slot).trim().is_empty() {
                errors.push(format!("picker.preview.{}: must not be empty", slot.key()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Human-readable summary for `--check-config -v`.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Picker:".to_string());
        lines.push(format!("  list_icon_size: {}px", self.picker.list_icon_size));
        lines.push(format!("  preview_size: {}px", self.picker.preview_size));
        lines.push(format!(
            "  fallback_icons: {}",
            self.picker.fallback_icons.join(", ")
        ));
        for slot in PreviewSlot::ALL {
            lines.push(format!(
                "  preview.{}: {}",
                slot.key(),
                self.picker.preview.icon_for(slot)
            ));
        }

        lines.push("\nCatalog:".to_string());
        lines.push(format!("  include_hidden: {}", self.catalog.include_hidden));
        for path in &self.catalog.extra_search_paths {
            lines.push(format!("  extra: {}", path.display()));
        }

        lines.push("\nSettings:".to_string());
        match &self.settings.path {
            Some(path) => lines.push(format!("  path: {}", path.display())),
            None => lines.push("  path: (default)".to_string()),
        }

        lines.join("\n")
    }
}

/// Recursively merge `overlay` into `base`; overlay values win.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Icon sizes and candidate names used by the picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickerConfig {
    /// Size of the per-row icon in the theme list.
    pub list_icon_size: u32,

    /// Size of the icons in the preview panel.
    pub preview_size: u32,

    /// Icons tried after a theme's own example icon, first match wins.
    pub fallback_icons: Vec<String>,

    /// Icon names for the preview slots.
    pub preview: PreviewIconsConfig,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            list_icon_size: 24,
            preview_size: 48,
            fallback_icons: IconCandidates::default_fallbacks(),
            preview: PreviewIconsConfig::default(),
        }
    }
}

impl PickerConfig {
    /// Candidate chain for list row icons.
    pub fn icon_candidates(&self) -> IconCandidates {
        IconCandidates::new(self.fallback_icons.clone(), self.list_icon_size)
    }

    /// Resolver for the preview panel.
    pub fn preview_resolver(&self) -> PreviewResolver {
        PreviewResolver::new(self.preview.clone(), self.preview_size)
    }
}

/// Icon name shown in each preview slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewIconsConfig {
    pub application: String,
    pub file_manager: String,
    pub theme_settings: String,
    pub generic_document: String,
}

impl Default for PreviewIconsConfig {
    fn default() -> Self {
        Self {
            application: "system-run".to_string(),
            file_manager: "system-file-manager".to_string(),
            theme_settings: "preferences-desktop-theme".to_string(),
            generic_document: "text-x-generic".to_string(),
        }
    }
}

impl PreviewIconsConfig {
    pub fn icon_for(&self, slot: PreviewSlot) -> &str {
        match slot {
            PreviewSlot::Application => &self.application,
            PreviewSlot::FileManager => &self.file_manager,
            PreviewSlot::ThemeSettings => &self.theme_settings,
            PreviewSlot::GenericDocument => &self.generic_document,
        }
    }
}

/// Icon theme discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Searched after the XDG icon directories.
    pub extra_search_paths: Vec<PathBuf>,

    /// List themes marked `Hidden=true`.
    pub include_hidden: bool,
}

/// Location of the persisted selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    /// Overrides the default `$XDG_CONFIG_HOME/iconsel/settings.toml`.
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.picker.list_icon_size, 24);
        assert_eq!(config.picker.preview_size, 48);
        assert_eq!(config.picker.fallback_icons[0], "folder");
        assert_eq!(config.picker.fallback_icons.len(), 5);
        assert_eq!(config.picker.preview.application, "system-run");
        assert!(!config.catalog.include_hidden);
        assert!(config.settings.path.is_none());
    }

    #[test]
    fn test_embedded_default_config_parses_and_validates() {
        let config = Config::from_default_toml().expect("embedded default config should parse");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_embedded_default_matches_struct_defaults() {
        let from_toml = Config::from_default_toml().unwrap();
        let from_struct = Config::default();

        assert_eq!(
            from_toml.picker.list_icon_size,
            from_struct.picker.list_icon_size
        );
        assert_eq!(from_toml.picker.preview_size, from_struct.picker.preview_size);
        assert_eq!(
            from_toml.picker.fallback_icons,
            from_struct.picker.fallback_icons
        );
        assert_eq!(from_toml.picker.preview, from_struct.picker.preview);
    }

    #[test]
    fn test_user_toml_merges_over_defaults() {
        let config = Config::load_with_defaults(
            r#"
            [picker]
            preview_size = 64

            [picker.preview]
            application = "utilities-terminal"
            "#,
        )
        .unwrap();

        assert_eq!(config.picker.preview_size, 64);
        assert_eq!(config.picker.list_icon_size, 24);
        assert_eq!(config.picker.preview.application, "utilities-terminal");
        assert_eq!(config.picker.preview.file_manager, "system-file-manager");
    }

    #[test]
    fn test_fallback_list_replaced_not_merged() {
        let config = Config::load_with_defaults(
            r#"
            [picker]
            fallback_icons = ["computer"]
            "#,
        )
        .unwrap();

        assert_eq!(config.picker.fallback_icons, vec!["computer".to_string()]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Config::load_with_defaults(
            r#"
            [picker]
            bogus = 1
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut config = Config::default();
        config.picker.list_icon_size = 0;
        config.picker.preview_size = 4096;

        let err = config.validate().unwrap_err();
        match err {
            Error::ConfigValidation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("picker.list_icon_size"));
                assert!(errors[1].contains("picker.preview_size"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_fallbacks() {
        let mut config = Config::default();
        config.picker.fallback_icons.clear();
        assert!(config.validate().is_err());

        config.picker.fallback_icons = vec!["folder".into(), "  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_preview_icon() {
        let mut config = Config::default();
        config.picker.preview.theme_settings = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("picker.preview.theme_settings"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/iconsel/config.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_summary_lists_sections() {
        let summary = Config::default().summary();
        assert!(summary.contains("Picker:"));
        assert!(summary.contains("Catalog:"));
        assert!(summary.contains("preview.file_manager: system-file-manager"));
    }
}
