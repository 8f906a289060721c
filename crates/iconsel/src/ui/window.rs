//! Icon theme dialog window.
//!
//! Layout: the theme list (icon + name per row), a preview frame with the
//! four preview slots, the "overrides" check box, and OK / Apply / Cancel.

use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use anyhow::Result;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, CheckButton, Frame, Image,
    Label, ListBox, ListBoxRow, Orientation, PolicyType, ScrolledWindow, SelectionMode, glib,
};
use tracing::{debug, error};

use iconsel_core::{
    CommitResult, Config, DialogViews, IconThemeDialog, PreviewPanel, PreviewSet, PreviewSlot,
    SettingsStore, ThemeListView, XdgIconCatalog,
};

use super::idle::GlibIdleScheduler;
use crate::cli;

const WINDOW_TITLE: &str = "Icon Theme Settings";
const LIST_MIN_WIDTH: i32 = 200;
const LIST_MIN_HEIGHT: i32 = 240;
const SPACING: i32 = 6;

/// Theme list backed by a `ListBox`.
struct GtkThemeList {
    list: ListBox,
    /// Theme id per row index.
    ids: RefCell<Vec<String>>,
    icon_size: i32,
}

impl GtkThemeList {
    fn new(icon_size: u32) -> Self {
        let list = ListBox::new();
        list.set_selection_mode(SelectionMode::Single);
        Self {
            list,
            ids: RefCell::new(Vec::new()),
            icon_size: icon_size as i32,
        }
    }

    fn theme_id_at(&self, row: i32) -> Option<String> {
        let index = usize::try_from(row).ok()?;
        self.ids.borrow().get(index).cloned()
    }
}

impl ThemeListView for GtkThemeList {
    fn clear(&self) {
        self.list.remove_all();
        self.ids.borrow_mut().clear();
    }

    fn append_row(&self, icon: Option<&Path>, label: &str, theme_id: &str) {
        let content = GtkBox::new(Orientation::Horizontal, SPACING);

        let image = match icon {
            Some(path) => Image::from_file(path),
            None => Image::new(),
        };
        image.set_pixel_size(self.icon_size);
        image.set_size_request(self.icon_size, self.icon_size);
        content.append(&image);

        let text = Label::new(Some(label));
        text.set_halign(Align::Start);
        content.append(&text);

        let row = ListBoxRow::new();
        row.set_child(Some(&content));
        row.set_tooltip_text(Some(theme_id));

        // Record the id first: appending may emit row signals.
        self.ids.borrow_mut().push(theme_id.to_string());
        self.list.append(&row);
    }

    fn mark_selected(&self, row: usize) {
        let Ok(index) = i32::try_from(row) else {
            return;
        };
        if let Some(row) = self.list.row_at_index(index) {
            self.list.select_row(Some(&row));
        }
    }

    fn finalize(&self) {
        if let Some(row) = self.list.selected_row() {
            row.grab_focus();
        }
    }
}

/// The four preview images.
struct GtkPreviewPanel {
    images: Vec<Image>,
}

impl GtkPreviewPanel {
    fn new(size: u32) -> Self {
        let images = PreviewSlot::ALL
            .iter()
            .map(|_| {
                let image = Image::new();
                image.set_pixel_size(size as i32);
                image.set_size_request(size as i32, size as i32);
                image
            })
            .collect();
        Self { images }
    }
}

impl PreviewPanel for GtkPreviewPanel {
    fn show_previews(&self, previews: &PreviewSet) {
        for (slot, path) in previews.iter() {
            let image = &self.images[slot.index()];
            match path {
                Some(path) => image.set_from_file(Some(path)),
                None => image.clear(),
            }
        }
    }
}

fn apply(dialog: &IconThemeDialog, store: &SettingsStore) -> bool {
    match dialog.apply(store) {
        Ok(CommitResult::Applied) => {
            debug!("Icon theme settings applied");
            true
        }
        Ok(CommitResult::Unchanged) => true,
        Err(e) => {
            error!("Failed to apply icon theme settings: {:#}", e);
            false
        }
    }
}

/// Build the dialog window, start populating it, and show it.
pub fn present(app: &Application, config: &Config) -> Result<()> {
    let store = Rc::new(cli::open_store(config)?);
    store.subscribe(|theme| {
        debug!("Theme change broadcast: {}", theme.unwrap_or("<unset>"));
    });

    let theme_list = Rc::new(GtkThemeList::new(config.picker.list_icon_size));
    let previews = Rc::new(GtkPreviewPanel::new(config.picker.preview_size));

    let dialog = Rc::new(IconThemeDialog::new(
        Rc::new(XdgIconCatalog::from_config(&config.catalog)),
        Rc::new(GlibIdleScheduler::new()),
        DialogViews {
            list: theme_list.clone(),
            previews: previews.clone(),
        },
        store.current(),
        &config.picker,
    ));

    let window = ApplicationWindow::builder()
        .application(app)
        .title(WINDOW_TITLE)
        .resizable(true)
        .build();

    let root = GtkBox::new(Orientation::Vertical, SPACING);
    root.set_margin_top(12);
    root.set_margin_bottom(12);
    root.set_margin_start(12);
    root.set_margin_end(12);

    let scroller = ScrolledWindow::builder()
        .child(&theme_list.list)
        .hscrollbar_policy(PolicyType::Never)
        .min_content_width(LIST_MIN_WIDTH)
        .min_content_height(LIST_MIN_HEIGHT)
        .vexpand(true)
        .build();
    root.append(&scroller);

    let preview_row = GtkBox::new(Orientation::Horizontal, SPACING);
    preview_row.set_halign(Align::Center);
    for image in &previews.images {
        preview_row.append(image);
    }
    let frame = Frame::new(Some("Preview"));
    frame.set_child(Some(&preview_row));
    root.append(&frame);

    let overrides = CheckButton::with_label("This overrides general theme");
    overrides.set_active(dialog.session().pending_overrides());
    root.append(&overrides);

    let buttons = GtkBox::new(Orientation::Horizontal, SPACING);
    buttons.set_halign(Align::End);
    let ok_button = Button::with_label("OK");
    let apply_button = Button::with_label("Apply");
    let cancel_button = Button::with_label("Cancel");
    buttons.append(&ok_button);
    buttons.append(&apply_button);
    buttons.append(&cancel_button);
    root.append(&buttons);

    apply_button.set_sensitive(dialog.is_dirty());

    {
        let weak: Weak<IconThemeDialog> = Rc::downgrade(&dialog);
        let list_for_ids = Rc::downgrade(&theme_list);
        let apply_button = apply_button.clone();
        theme_list.list.connect_row_selected(move |_, row| {
            let (Some(dialog), Some(list)) = (weak.upgrade(), list_for_ids.upgrade()) else {
                return;
            };
            let Some(theme_id) = row.and_then(|r| list.theme_id_at(r.index())) else {
                return;
            };
            dialog.select_theme(Some(&theme_id));
            apply_button.set_sensitive(dialog.is_dirty());
        });
    }

    {
        let weak = Rc::downgrade(&dialog);
        let apply_button = apply_button.clone();
        overrides.connect_toggled(move |check| {
            if let Some(dialog) = weak.upgrade() {
                dialog.set_overrides(check.is_active());
                apply_button.set_sensitive(dialog.is_dirty());
            }
        });
    }

    {
        let dialog = Rc::clone(&dialog);
        let store = Rc::clone(&store);
        apply_button.connect_clicked(move |button| {
            apply(&dialog, &store);
            button.set_sensitive(dialog.is_dirty());
        });
    }

    {
        let dialog = Rc::clone(&dialog);
        let store = Rc::clone(&store);
        let window = window.clone();
        ok_button.connect_clicked(move |_| {
            if apply(&dialog, &store) {
                window.close();
            }
        });
    }

    {
        let window = window.clone();
        cancel_button.connect_clicked(move |_| window.close());
    }

    {
        let dialog = Rc::clone(&dialog);
        window.connect_close_request(move |_| {
            dialog.close();
            glib::Propagation::Proceed
        });
    }

    window.set_child(Some(&root));
    dialog.start_population();
    window.present();
    Ok(())
}
