//! Headless subcommands.
//!
//! `list` drives the same population engine as the dialog, with an
//! [`IdleQueue`] standing in for the GTK main loop and a console list view
//! that prints once the run finalizes.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use iconsel_core::{
    CommitResult, Config, DialogViews, IconThemeDialog, IconThemeSettings, IdleQueue, Phase,
    PreviewPanel, PreviewSet, SelectionSession, SettingsStore, ThemeCatalog, ThemeListView,
    XdgIconCatalog,
};

/// Where the selected theme is persisted.
pub fn settings_path(config: &Config) -> PathBuf {
    config
        .settings
        .path
        .clone()
        .unwrap_or_else(IconThemeSettings::default_path)
}

pub fn open_store(config: &Config) -> Result<SettingsStore> {
    let path = settings_path(config);
    SettingsStore::open(path.clone())
        .with_context(|| format!("failed to read settings from {}", path.display()))
}

struct ConsoleRow {
    icon: Option<PathBuf>,
    label: String,
    theme_id: String,
}

/// Buffers rows and prints them when the run finalizes.
struct ConsoleList {
    rows: RefCell<Vec<ConsoleRow>>,
    selected: Cell<Option<usize>>,
    show_icons: bool,
}

impl ConsoleList {
    fn new(show_icons: bool) -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            selected: Cell::new(None),
            show_icons,
        }
    }
}

impl ThemeListView for ConsoleList {
    fn clear(&self) {
        self.rows.borrow_mut().clear();
        self.selected.set(None);
    }

    fn append_row(&self, icon: Option<&Path>, label: &str, theme_id: &str) {
        self.rows.borrow_mut().push(ConsoleRow {
            icon: icon.map(Path::to_path_buf),
            label: label.to_string(),
            theme_id: theme_id.to_string(),
        });
    }

    fn mark_selected(&self, row: usize) {
        self.selected.set(Some(row));
    }

    fn finalize(&self) {
        let rows = self.rows.borrow();
        let width = rows.iter().map(|r| r.theme_id.len()).max().unwrap_or(0);

        for (i, row) in rows.iter().enumerate() {
            let marker = if self.selected.get() == Some(i) { '*' } else { ' ' };
            print!("{} {:<width$}  {}", marker, row.theme_id, row.label);
            if self.show_icons {
                match &row.icon {
                    Some(path) => print!("  [{}]", path.display()),
                    None => print!("  [no icon]"),
                }
            }
            println!();
        }
    }
}

/// Keeps the preview set shown when the run finished.
#[derive(Default)]
struct ConsolePreviews {
    last: RefCell<Option<PreviewSet>>,
}

impl PreviewPanel for ConsolePreviews {
    fn show_previews(&self, previews: &PreviewSet) {
        *self.last.borrow_mut() = Some(previews.clone());
    }
}

fn print_previews(theme_id: &str, previews: &PreviewSet) {
    println!("{}:", theme_id);
    for (slot, path) in previews.iter() {
        match path {
            Some(path) => println!("  {:<16}  {}", slot.key(), path.display()),
            None => println!("  {:<16}  (missing)", slot.key()),
        }
    }
}

pub fn list(config: &Config, show_icons: bool) -> Result<()> {
    let store = open_store(config)?;
    let queue = Rc::new(IdleQueue::new());
    let previews = Rc::new(ConsolePreviews::default());
    let dialog = IconThemeDialog::new(
        Rc::new(XdgIconCatalog::from_config(&config.catalog)),
        queue.clone(),
        DialogViews {
            list: Rc::new(ConsoleList::new(show_icons)),
            previews: previews.clone(),
        },
        store.current(),
        &config.picker,
    );

    dialog.start_population();
    let steps = queue.run_until_idle(usize::MAX);
    debug!("Population finished after {} step(s)", steps);

    if dialog.phase() == Some(Phase::Failed) {
        bail!("could not list icon themes (see log output with -v)");
    }

    if show_icons {
        let selected = dialog.session().pending_theme().map(str::to_owned);
        if let (Some(theme_id), Some(set)) = (selected, previews.last.borrow().as_ref()) {
            println!();
            print_previews(&theme_id, set);
        }
    }
    Ok(())
}

pub fn preview(config: &Config, theme: Option<&str>) -> Result<()> {
    let theme_id = match theme {
        Some(theme) => theme.to_string(),
        None => match open_store(config)?.current().icon_theme {
            Some(theme) => theme,
            None => bail!("no icon theme selected; pass a theme id"),
        },
    };

    let catalog = XdgIconCatalog::from_config(&config.catalog);
    let previews = config
        .picker
        .preview_resolver()
        .resolve(&catalog, Some(theme_id.as_str()));
    print_previews(&theme_id, &previews);
    Ok(())
}

pub fn current(config: &Config) -> Result<()> {
    let settings = open_store(config)?.current();
    println!(
        "{} (overrides: {})",
        settings.icon_theme.as_deref().unwrap_or("(unset)"),
        if settings.overrides { "yes" } else { "no" }
    );
    Ok(())
}

pub fn set(config: &Config, theme: &str, overrides: Option<bool>) -> Result<()> {
    let catalog = XdgIconCatalog::from_config(&config.catalog);
    let themes = catalog
        .list_themes()
        .context("failed to list installed icon themes")?;
    if !themes.iter().any(|t| t.internal_id == theme) {
        bail!("no icon theme with id '{}' is installed", theme);
    }

    let store = open_store(config)?;
    let mut session = SelectionSession::new(store.current());
    session.set_pending_theme(Some(theme.to_string()));
    if let Some(overrides) = overrides {
        session.set_pending_override(overrides);
    }

    match session
        .commit(&store)
        .with_context(|| format!("failed to save {}", store.path().display()))?
    {
        CommitResult::Unchanged => println!("Icon theme already set to {}", theme),
        CommitResult::Applied => println!("Icon theme set to {}", theme),
    }
    Ok(())
}
