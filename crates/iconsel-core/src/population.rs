//! Incremental population of the theme list.
//!
//! A [`PopulationRun`] is driven by a [`Scheduler`](crate::scheduler::Scheduler)
//! one step at a time. The first step loads and sorts the whole catalog; each
//! following step appends exactly one row, so a step costs one theme's worth
//! of icon lookups no matter how many themes are installed. The step after the
//! last row finalizes the list and fills the preview panel.
//!
//! ```text
//! NotStarted -> LoadingCatalog -> Emitting -> ... -> Emitting -> Done
//!                     |
//!                     +-> Failed            (any non-terminal) -> Cancelled
//! ```
//!
//! The phase lives in a shared [`RunStatus`] cell so the owner can cancel a
//! run, or ask whether it is still going, without borrowing the run itself.
//! That matters because list-view callbacks fire while a step is in
//! progress.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::catalog::{CatalogSnapshot, ThemeCatalog};
use crate::preview::{IconCandidates, PreviewResolver, PreviewSet};
use crate::session::SelectionSession;

/// Where a population run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    LoadingCatalog,
    Emitting,
    Done,
    Cancelled,
    /// The catalog could not be listed.
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Cancelled | Phase::Failed)
    }
}

/// List widget the run appends to.
///
/// Rows are numbered from zero in append order since the last `clear`.
pub trait ThemeListView {
    /// Remove all rows.
    fn clear(&self);

    /// Append a row; `icon` is `None` for a label-only row.
    fn append_row(&self, icon: Option<&Path>, label: &str, theme_id: &str);

    /// Highlight row `row` as the current selection.
    fn mark_selected(&self, row: usize);

    /// No more rows will be appended by this run.
    fn finalize(&self);
}

/// Panel showing the preview slots for the pending theme.
pub trait PreviewPanel {
    fn show_previews(&self, previews: &PreviewSet);
}

/// Shared, borrow-free view of a run's phase.
#[derive(Debug, Clone)]
pub struct RunStatus(Rc<Cell<Phase>>);

impl RunStatus {
    fn new() -> Self {
        Self(Rc::new(Cell::new(Phase::NotStarted)))
    }

    pub fn phase(&self) -> Phase {
        self.0.get()
    }

    pub fn is_active(&self) -> bool {
        !self.phase().is_terminal()
    }

    fn set(&self, phase: Phase) {
        self.0.set(phase);
    }

    /// Mark the run cancelled. Returns `false` if it had already ended.
    pub fn cancel(&self) -> bool {
        if self.phase().is_terminal() {
            return false;
        }
        self.set(Phase::Cancelled);
        true
    }
}

/// Collaborators a run reads from and writes to.
#[derive(Clone)]
pub struct PopulationContext {
    pub catalog: Rc<dyn ThemeCatalog>,
    pub list: Rc<dyn ThemeListView>,
    pub previews: Rc<dyn PreviewPanel>,
    /// Read only, to decide which row to highlight.
    pub session: Rc<RefCell<SelectionSession>>,
    pub candidates: IconCandidates,
    pub preview_resolver: PreviewResolver,
}

impl PopulationContext {
    /// Resolve and show the preview slots for the pending theme.
    pub fn refresh_previews(&self) {
        let pending = self.session.borrow().pending_theme().map(str::to_owned);
        let set = self
            .preview_resolver
            .resolve(self.catalog.as_ref(), pending.as_deref());
        debug!(
            theme = pending.as_deref().unwrap_or("<unset>"),
            resolved = set.resolved_count(),
            "Preview refreshed"
        );
        self.previews.show_previews(&set);
    }
}

/// One attempt at filling the theme list.
pub struct PopulationRun {
    ctx: PopulationContext,
    snapshot: Option<CatalogSnapshot>,
    cursor: usize,
    /// Rows appended so far; the next row's index.
    index: usize,
    selected_row: Option<usize>,
    status: RunStatus,
}

impl PopulationRun {
    pub fn new(ctx: PopulationContext) -> Self {
        Self {
            ctx,
            snapshot: None,
            cursor: 0,
            index: 0,
            selected_row: None,
            status: RunStatus::new(),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status.clone()
    }

    pub fn phase(&self) -> Phase {
        self.status.phase()
    }

    pub fn rows_emitted(&self) -> usize {
        self.index
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    /// Do one unit of work. Returns whether the scheduler should call again.
    ///
    /// A cancelled run returns `false` without touching the catalog or the
    /// list.
    pub fn step(&mut self) -> bool {
        match self.phase() {
            Phase::NotStarted | Phase::LoadingCatalog => self.load_catalog(),
            Phase::Emitting => self.emit_next(),
            Phase::Done | Phase::Cancelled | Phase::Failed => false,
        }
    }

    fn load_catalog(&mut self) -> bool {
        self.status.set(Phase::LoadingCatalog);

        match self.ctx.catalog.list_themes() {
            Ok(themes) => {
                let snapshot = CatalogSnapshot::from_themes(themes);
                debug!("Loaded {} icon theme(s)", snapshot.len());
                self.snapshot = Some(snapshot);
                self.cursor = 0;
                self.status.set(Phase::Emitting);
                true
            }
            Err(e) => {
                warn!("Failed to list icon themes: {}", e);
                self.status.set(Phase::Failed);
                self.ctx.list.finalize();
                false
            }
        }
    }

    fn emit_next(&mut self) -> bool {
        let Some(theme) = self
            .snapshot
            .as_ref()
            .and_then(|s| s.get(self.cursor))
            .cloned()
        else {
            self.finish();
            return false;
        };
        self.cursor += 1;

        let icon = self.ctx.candidates.resolve(self.ctx.catalog.as_ref(), &theme);
        let is_pending =
            self.ctx.session.borrow().pending_theme() == Some(theme.internal_id.as_str());

        trace!(
            row = self.index,
            theme = %theme.internal_id,
            has_icon = icon.is_some(),
            "Appending theme row"
        );
        self.ctx
            .list
            .append_row(icon.as_deref(), theme.label(), &theme.internal_id);
        let row = self.index;
        self.index += 1;

        // The list may have run callbacks that cancelled us.
        if self.phase() == Phase::Cancelled {
            return false;
        }

        if is_pending && self.selected_row.is_none() {
            self.selected_row = Some(row);
            self.ctx.list.mark_selected(row);
        }

        self.phase() == Phase::Emitting
    }

    fn finish(&mut self) {
        self.ctx.list.finalize();
        if self.phase() == Phase::Cancelled {
            return;
        }
        self.status.set(Phase::Done);
        debug!("Icon theme list populated with {} row(s)", self.index);
        self.ctx.refresh_previews();
    }
}
