//! Freedesktop icon theme catalog.
//!
//! Themes are directories containing an `index.theme` file, found under the
//! XDG icon base directories:
//!
//! 1. `$HOME/.icons`
//! 2. `$XDG_DATA_HOME/icons` (default `~/.local/share/icons`)
//! 3. `<dir>/icons` for each entry of `$XDG_DATA_DIRS`
//!    (default `/usr/local/share:/usr/share`)
//! 4. any extra paths from the configuration
//!
//! A theme id may appear under several base directories; the first
//! `index.theme` found describes it, and icons are looked up in all of them,
//! including directories that carry no `index.theme` of their own.
//!
//! Icon lookup follows the icon theme spec: an exact size match in the theme,
//! then the closest size, then each inherited theme depth-first, then
//! `hicolor`. Unthemed fallback icons (`/usr/share/pixmaps`) are not
//! consulted; a preview should only show what the theme itself provides.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::catalog::{Theme, ThemeCatalog};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// Theme every other theme implicitly inherits from.
const FALLBACK_THEME: &str = "hicolor";

/// Icon file extensions, in preference order.
const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];

/// Group holding theme-wide keys in `index.theme`.
const ICON_THEME_GROUP: &str = "Icon Theme";

/// Default `Threshold` for threshold directories.
const DEFAULT_THRESHOLD: u32 = 2;

type IniGroups = HashMap<String, HashMap<String, String>>;

/// Parse a desktop-entry style file into groups of key/value pairs.
///
/// Localized keys (`Name[de]`) are kept verbatim, so plain lookups only see
/// the untranslated value.
fn parse_ini(content: &str) -> IniGroups {
    let mut groups = IniGroups::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(name.to_string());
            groups.entry(name.to_string()).or_default();
            continue;
        }
        let (Some(group), Some((key, value))) = (&current, line.split_once('=')) else {
            continue;
        };
        groups
            .entry(group.clone())
            .or_default()
            .entry(key.trim().to_string())
            .or_insert_with(|| value.trim().to_string());
    }

    groups
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirKind {
    Fixed,
    Scalable,
    Threshold,
}

/// One size directory of a theme (e.g. `48x48/apps`).
#[derive(Debug, Clone, PartialEq, Eq)]
struct IconDir {
    subdir: String,
    kind: DirKind,
    size: u32,
    min_size: u32,
    max_size: u32,
    threshold: u32,
}

impl IconDir {
    fn from_group(subdir: &str, keys: &HashMap<String, String>) -> Option<Self> {
        let num = |key: &str| keys.get(key).and_then(|v| v.parse::<u32>().ok());

        let size = num("Size")?;
        // Only unscaled directories are used for lookups.
        if num("Scale").is_some_and(|scale| scale != 1) {
            return None;
        }
        let kind = match keys.get("Type").map(String::as_str) {
            Some("Fixed") => DirKind::Fixed,
            Some("Scalable") => DirKind::Scalable,
            _ => DirKind::Threshold,
        };

        Some(Self {
            subdir: subdir.to_string(),
            kind,
            size,
            min_size: num("MinSize").unwrap_or(size),
            max_size: num("MaxSize").unwrap_or(size),
            threshold: num("Threshold").unwrap_or(DEFAULT_THRESHOLD),
        })
    }

    fn matches(&self, size: u32) -> bool {
        match self.kind {
            DirKind::Fixed => self.size == size,
            DirKind::Scalable => (self.min_size..=self.max_size).contains(&size),
            DirKind::Threshold => {
                let low = self.size.saturating_sub(self.threshold);
                let high = self.size.saturating_add(self.threshold);
                (low..=high).contains(&size)
            }
        }
    }

    fn distance(&self, size: u32) -> u32 {
        let (low, high) = match self.kind {
            DirKind::Fixed => (self.size, self.size),
            DirKind::Scalable => (self.min_size, self.max_size),
            DirKind::Threshold => (
                self.size.saturating_sub(self.threshold),
                self.size.saturating_add(self.threshold),
            ),
        };
        if size < low {
            low - size
        } else {
            size.saturating_sub(high)
        }
    }
}

/// Parsed `index.theme` plus every base directory holding the theme.
#[derive(Debug, Clone)]
struct ThemeIndex {
    name: Option<String>,
    example: Option<String>,
    inherits: Vec<String>,
    hidden: bool,
    dirs: Vec<IconDir>,
    roots: Vec<PathBuf>,
}

impl ThemeIndex {
    fn parse(root: &Path, content: &str) -> Option<Self> {
        let groups = parse_ini(content);
        let theme = groups.get(ICON_THEME_GROUP)?;

        let dirs = split_list(theme.get("Directories"))
            .iter()
            .filter_map(|subdir| {
                groups
                    .get(subdir)
                    .and_then(|keys| IconDir::from_group(subdir, keys))
            })
            .collect();

        Some(Self {
            name: theme.get("Name").cloned(),
            example: theme.get("Example").cloned(),
            inherits: split_list(theme.get("Inherits")),
            hidden: theme
                .get("Hidden")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            dirs,
            roots: vec![root.to_path_buf()],
        })
    }

    fn find_in_dir(&self, dir: &IconDir, icon_name: &str) -> Option<PathBuf> {
        self.roots.iter().find_map(|root| {
            ICON_EXTENSIONS.iter().find_map(|ext| {
                let path = root
                    .join(&dir.subdir)
                    .join(format!("{}.{}", icon_name, ext));
                path.is_file().then_some(path)
            })
        })
    }

    /// Exact match first, then the file from the closest-sized directory.
    fn lookup(&self, icon_name: &str, size: u32) -> Option<PathBuf> {
        let exact = self
            .dirs
            .iter()
            .filter(|dir| dir.matches(size))
            .find_map(|dir| self.find_in_dir(dir, icon_name));
        if exact.is_some() {
            return exact;
        }

        let mut best: Option<(u32, PathBuf)> = None;
        for dir in &self.dirs {
            let distance = dir.distance(size);
            if best.as_ref().is_some_and(|(d, _)| *d <= distance) {
                continue;
            }
            if let Some(path) = self.find_in_dir(dir, icon_name) {
                best = Some((distance, path));
            }
        }
        best.map(|(_, path)| path)
    }
}

/// Base directories searched for icon themes, in priority order.
pub fn icon_base_dirs(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = env::var_os("HOME").map(PathBuf::from);

    if let Some(home) = &home {
        dirs.push(home.join(".icons"));
    }

    match env::var_os("XDG_DATA_HOME") {
        Some(data_home) if !data_home.is_empty() => {
            dirs.push(PathBuf::from(data_home).join("icons"));
        }
        _ => {
            if let Some(home) = &home {
                dirs.push(home.join(".local/share/icons"));
            }
        }
    }

    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir).join("icons"));
    }

    dirs.extend(extra.iter().cloned());
    dirs
}

/// [`ThemeCatalog`] over the icon themes installed on this system.
pub struct XdgIconCatalog {
    search_paths: Vec<PathBuf>,
    include_hidden: bool,
    index: RefCell<Option<HashMap<String, ThemeIndex>>>,
}

impl XdgIconCatalog {
    /// Catalog searching exactly `search_paths`.
    pub fn new(search_paths: Vec<PathBuf>, include_hidden: bool) -> Self {
        Self {
            search_paths,
            include_hidden,
            index: RefCell::new(None),
        }
    }

    /// Catalog over the XDG base directories plus configured extras.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            icon_base_dirs(&config.extra_search_paths),
            config.include_hidden,
        )
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn scan(&self) -> Result<HashMap<String, ThemeIndex>> {
        let mut themes: HashMap<String, ThemeIndex> = HashMap::new();
        let mut unindexed: HashMap<String, Vec<PathBuf>> = HashMap::new();
        let mut readable = 0;

        for base in &self.search_paths {
            let entries = match fs::read_dir(base) {
                Ok(entries) => entries,
                Err(e) => {
                    trace!("Skipping icon directory {}: {}", base.display(), e);
                    continue;
                }
            };
            readable += 1;

            for entry in entries.flatten() {
                let root = entry.path();
                let Some(id) = root.file_name().and_then(|n| n.to_str()).map(str::to_string)
                else {
                    continue;
                };

                if !root.is_dir() {
                    continue;
                }
                if let Some(existing) = themes.get_mut(&id) {
                    existing.roots.push(root);
                    continue;
                }

                let index = fs::read_to_string(root.join("index.theme"))
                    .ok()
                    .and_then(|content| ThemeIndex::parse(&root, &content));
                match index {
                    Some(mut index) => {
                        // Earlier base dirs without an index still hold icons.
                        if let Some(mut roots) = unindexed.remove(&id) {
                            roots.append(&mut index.roots);
                            index.roots = roots;
                        }
                        themes.insert(id, index);
                    }
                    None => unindexed.entry(id).or_default().push(root),
                }
            }
        }

        if !unindexed.is_empty() {
            trace!("{} icon directories without a usable index.theme", unindexed.len());
        }

        if readable == 0 && !self.search_paths.is_empty() {
            return Err(Error::Catalog(format!(
                "none of the icon directories could be read ({})",
                self.search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        debug!("Found {} icon theme(s) in {} directories", themes.len(), readable);
        Ok(themes)
    }

    fn lookup(
        index: &HashMap<String, ThemeIndex>,
        theme_id: &str,
        icon_name: &str,
        size: u32,
        visited: &mut HashSet<String>,
    ) -> Option<PathBuf> {
        if !visited.insert(theme_id.to_string()) {
            return None;
        }
        let theme = index.get(theme_id)?;

        theme.lookup(icon_name, size).or_else(|| {
            theme
                .inherits
                .iter()
                .find_map(|parent| Self::lookup(index, parent, icon_name, size, visited))
        })
    }
}

impl ThemeCatalog for XdgIconCatalog {
    fn list_themes(&self) -> Result<Vec<Theme>> {
        let index = self.scan()?;

        let themes = index
            .iter()
            .filter(|(_, t)| self.include_hidden || !t.hidden)
            .map(|(id, t)| Theme {
                internal_id: id.clone(),
                display_name: t.name.clone(),
                example_icon: t.example.clone(),
            })
            .collect();

        *self.index.borrow_mut() = Some(index);
        Ok(themes)
    }

    fn resolve_icon_path(&self, theme_id: &str, icon_name: &str, size: u32) -> Option<PathBuf> {
        if self.index.borrow().is_none() {
            let scanned = self.scan().ok()?;
            *self.index.borrow_mut() = Some(scanned);
        }
        let guard = self.index.borrow();
        let index = guard.as_ref()?;

        let mut visited = HashSet::new();
        Self::lookup(index, theme_id, icon_name, size, &mut visited).or_else(|| {
            (theme_id != FALLBACK_THEME)
                .then(|| Self::lookup(index, FALLBACK_THEME, icon_name, size, &mut visited))
                .flatten()
        })
    }
}
