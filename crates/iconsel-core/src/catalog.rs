//! Icon theme catalog abstraction.
//!
//! A [`ThemeCatalog`] lists installed themes and resolves icon paths inside
//! them. The population engine only ever talks to this trait; the
//! freedesktop implementation lives in [`crate::xdg`] and an in-memory one
//! ([`MemoryCatalog`]) is provided for scripted runs and tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;

/// One installed icon theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Directory name of the theme, used as its stable identifier.
    pub internal_id: String,
    /// Human-readable name from `index.theme`, if it declares one.
    pub display_name: Option<String>,
    /// Icon the theme suggests for showing it off.
    pub example_icon: Option<String>,
}

impl Theme {
    pub fn new(internal_id: impl Into<String>) -> Self {
        Self {
            internal_id: internal_id.into(),
            display_name: None,
            example_icon: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_example(mut self, icon: impl Into<String>) -> Self {
        self.example_icon = Some(icon.into());
        self
    }

    /// Text shown for the theme in the list.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.internal_id)
    }
}

/// Source of installed themes and icon lookups.
pub trait ThemeCatalog {
    /// Every theme the catalog knows about, in no particular order.
    fn list_themes(&self) -> Result<Vec<Theme>>;

    /// Path of `icon_name` in `theme_id` at roughly `size` pixels.
    fn resolve_icon_path(&self, theme_id: &str, icon_name: &str, size: u32) -> Option<PathBuf>;
}

/// Display-name ordering: named themes first, byte-wise; nameless last.
fn compare_display_names(a: &Theme, b: &Theme) -> Ordering {
    match (&a.display_name, &b.display_name) {
        (Some(a), Some(b)) => a.as_bytes().cmp(b.as_bytes()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Themes in list order, as captured by one population run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    themes: Vec<Theme>,
}

impl CatalogSnapshot {
    /// Sort `themes` into list order.
    ///
    /// The sort is stable, so themes with equal names (and all nameless
    /// themes) keep their input order.
    pub fn from_themes(mut themes: Vec<Theme>) -> Self {
        themes.sort_by(compare_display_names);
        Self { themes }
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Theme> {
        self.themes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Theme> {
        self.themes.iter()
    }
}

/// Catalog backed by a fixed table of themes and icon paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    themes: Vec<Theme>,
    icons: HashMap<(String, String), PathBuf>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.themes.push(theme);
        self
    }

    /// Register `icon_name` for `theme_id`; it resolves at every size.
    pub fn with_icon(
        mut self,
        theme_id: impl Into<String>,
        icon_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.icons
            .insert((theme_id.into(), icon_name.into()), path.into());
        self
    }
}

impl ThemeCatalog for MemoryCatalog {
    fn list_themes(&self) -> Result<Vec<Theme>> {
        Ok(self.themes.clone())
    }

    fn resolve_icon_path(&self, theme_id: &str, icon_name: &str, _size: u32) -> Option<PathBuf> {
        self.icons
            .get(&(theme_id.to_string(), icon_name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(snapshot: &CatalogSnapshot) -> Vec<&str> {
        snapshot.iter().map(|t| t.internal_id.as_str()).collect()
    }

    #[test]
    fn test_sort_named_before_nameless() {
        let snapshot = CatalogSnapshot::from_themes(vec![
            Theme::new("b").with_name("Bravo"),
            Theme::new("a").with_name("Alpha"),
            Theme::new("c"),
        ]);
        assert_eq!(ids(&snapshot), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_nameless_keep_input_order() {
        let snapshot = CatalogSnapshot::from_themes(vec![
            Theme::new("z"),
            Theme::new("m").with_name("Mint"),
            Theme::new("y"),
            Theme::new("x"),
        ]);
        assert_eq!(ids(&snapshot), vec!["m", "z", "y", "x"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_names() {
        let snapshot = CatalogSnapshot::from_themes(vec![
            Theme::new("second").with_name("Same"),
            Theme::new("other").with_name("Other"),
            Theme::new("first").with_name("Same"),
        ]);
        assert_eq!(ids(&snapshot), vec!["other", "second", "first"]);
    }

    #[test]
    fn test_sort_is_bytewise_not_locale_aware() {
        let snapshot = CatalogSnapshot::from_themes(vec![
            Theme::new("lower").with_name("adwaita"),
            Theme::new("upper").with_name("Breeze"),
        ]);
        // 'B' (0x42) sorts before 'a' (0x61)
        assert_eq!(ids(&snapshot), vec!["upper", "lower"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CatalogSnapshot::from_themes(Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.get(0).is_none());
    }

    #[test]
    fn test_label_falls_back_to_id() {
        assert_eq!(Theme::new("hicolor").label(), "hicolor");
        assert_eq!(Theme::new("breeze").with_name("Breeze").label(), "Breeze");
    }

    #[test]
    fn test_memory_catalog_resolves_registered_icons_only() {
        let catalog = MemoryCatalog::new()
            .with_theme(Theme::new("a"))
            .with_icon("a", "folder", "/icons/a/folder.png");

        assert_eq!(
            catalog.resolve_icon_path("a", "folder", 24),
            Some(PathBuf::from("/icons/a/folder.png"))
        );
        assert!(catalog.resolve_icon_path("a", "user-home", 24).is_none());
        assert!(catalog.resolve_icon_path("b", "folder", 24).is_none());
        assert_eq!(catalog.list_themes().unwrap().len(), 1);
    }
}
