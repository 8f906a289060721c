//! Icon lookups for theme list rows and the preview panel.
//!
//! Two independent lookups live here:
//!
//! - [`IconCandidates`] picks the small icon shown next to a theme in the
//!   list: the theme's own example icon, then a configurable fallback chain.
//!   First match wins; no match means a label-only row.
//! - [`PreviewResolver`] fills the four fixed preview slots for the selected
//!   theme at the larger preview size.
//!
//! Misses are expected and never reported as errors.

use std::path::PathBuf;

use tracing::trace;

use crate::catalog::{Theme, ThemeCatalog};
use crate::config::PreviewIconsConfig;

/// Fallback chain used when a theme has no example icon that resolves.
const DEFAULT_FALLBACK_ICONS: &[&str] = &[
    "folder",
    "user-home",
    "text-x-generic",
    "system-run",
    "preferences-system",
];

/// Ordered icon names tried for a theme's list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCandidates {
    fallbacks: Vec<String>,
    size: u32,
}

impl IconCandidates {
    pub fn new(fallbacks: Vec<String>, size: u32) -> Self {
        Self { fallbacks, size }
    }

    pub fn default_fallbacks() -> Vec<String> {
        DEFAULT_FALLBACK_ICONS.iter().map(|s| s.to_string()).collect()
    }

    /// Names tried for `theme`, in order.
    pub fn names_for<'a>(&'a self, theme: &'a Theme) -> impl Iterator<Item = &'a str> {
        theme
            .example_icon
            .as_deref()
            .into_iter()
            .chain(self.fallbacks.iter().map(String::as_str))
    }

    /// First candidate that `catalog` can resolve for `theme`.
    pub fn resolve(&self, catalog: &dyn ThemeCatalog, theme: &Theme) -> Option<PathBuf> {
        self.names_for(theme).find_map(|name| {
            let path = catalog.resolve_icon_path(&theme.internal_id, name, self.size);
            if path.is_none() {
                trace!("{}: no '{}' icon at {}px", theme.internal_id, name, self.size);
            }
            path
        })
    }
}

impl Default for IconCandidates {
    fn default() -> Self {
        Self::new(Self::default_fallbacks(), 24)
    }
}

/// The fixed semantic slots of the preview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewSlot {
    Application,
    FileManager,
    ThemeSettings,
    GenericDocument,
}

impl PreviewSlot {
    /// All slots in display order.
    pub const ALL: [PreviewSlot; 4] = [
        PreviewSlot::Application,
        PreviewSlot::FileManager,
        PreviewSlot::ThemeSettings,
        PreviewSlot::GenericDocument,
    ];

    /// Config key (`picker.preview.<key>`).
    pub fn key(self) -> &'static str {
        match self {
            PreviewSlot::Application => "application",
            PreviewSlot::FileManager => "file_manager",
            PreviewSlot::ThemeSettings => "theme_settings",
            PreviewSlot::GenericDocument => "generic_document",
        }
    }

    pub fn index(self) -> usize {
        match self {
            PreviewSlot::Application => 0,
            PreviewSlot::FileManager => 1,
            PreviewSlot::ThemeSettings => 2,
            PreviewSlot::GenericDocument => 3,
        }
    }
}

/// Resolved icon per preview slot; `None` shows an empty slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSet {
    slots: [Option<PathBuf>; 4],
}

impl PreviewSet {
    pub fn get(&self, slot: PreviewSlot) -> Option<&PathBuf> {
        self.slots[slot.index()].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PreviewSlot, Option<&PathBuf>)> {
        PreviewSlot::ALL.into_iter().map(|slot| (slot, self.get(slot)))
    }

    /// Number of slots that resolved to an icon.
    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Fills the preview panel for a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResolver {
    icons: PreviewIconsConfig,
    size: u32,
}

impl PreviewResolver {
    pub fn new(icons: PreviewIconsConfig, size: u32) -> Self {
        Self { icons, size }
    }

    pub fn resolve_slot(
        &self,
        catalog: &dyn ThemeCatalog,
        theme_id: &str,
        slot: PreviewSlot,
    ) -> Option<PathBuf> {
        catalog.resolve_icon_path(theme_id, self.icons.icon_for(slot), self.size)
    }

    /// Resolve all four slots. With no theme every slot is empty.
    pub fn resolve(&self, catalog: &dyn ThemeCatalog, theme_id: Option<&str>) -> PreviewSet {
        let mut set = PreviewSet::default();
        if let Some(theme_id) = theme_id {
            for slot in PreviewSlot::ALL {
                set.slots[slot.index()] = self.resolve_slot(catalog, theme_id, slot);
            }
        }
        set
    }
}

impl Default for PreviewResolver {
    fn default() -> Self {
        Self::new(PreviewIconsConfig::default(), 48)
    }
}
