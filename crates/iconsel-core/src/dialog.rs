//! Icon theme dialog controller.
//!
//! [`IconThemeDialog`] ties the pieces together for one open dialog: it owns
//! the selection session, the view handles and at most one population run.
//! Starting a new run always cancels the previous one first, and closing or
//! dropping the dialog cancels whatever is still running, so a queued step
//! never runs against a dialog that has moved on.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::catalog::ThemeCatalog;
use crate::config::PickerConfig;
use crate::error::Result;
use crate::population::{
    Phase, PopulationContext, PopulationRun, PreviewPanel, RunStatus, ThemeListView,
};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::session::{CommitResult, ConfigBus, SelectionSession};
use crate::settings::IconThemeSettings;

/// View handles the dialog drives.
#[derive(Clone)]
pub struct DialogViews {
    pub list: Rc<dyn ThemeListView>,
    pub previews: Rc<dyn PreviewPanel>,
}

struct ActiveRun {
    status: RunStatus,
    handle: TaskHandle,
}

pub struct IconThemeDialog {
    context: PopulationContext,
    scheduler: Rc<dyn Scheduler>,
    active: RefCell<Option<ActiveRun>>,
}

impl IconThemeDialog {
    /// Create the dialog with `baseline` as the effective selection.
    ///
    /// Population does not start until [`start_population`](Self::start_population).
    pub fn new(
        catalog: Rc<dyn ThemeCatalog>,
        scheduler: Rc<dyn Scheduler>,
        views: DialogViews,
        baseline: IconThemeSettings,
        picker: &PickerConfig,
    ) -> Self {
        let context = PopulationContext {
            catalog,
            list: views.list,
            previews: views.previews,
            session: Rc::new(RefCell::new(SelectionSession::new(baseline))),
            candidates: picker.icon_candidates(),
            preview_resolver: picker.preview_resolver(),
        };
        Self {
            context,
            scheduler,
            active: RefCell::new(None),
        }
    }

    pub fn session(&self) -> Ref<'_, SelectionSession> {
        self.context.session.borrow()
    }

    /// Phase of the current run, if one was started.
    pub fn phase(&self) -> Option<Phase> {
        self.active.borrow().as_ref().map(|a| a.status.phase())
    }

    /// Whether a run is still filling the list.
    pub fn is_populating(&self) -> bool {
        self.active
            .borrow()
            .as_ref()
            .is_some_and(|a| a.status.is_active())
    }

    /// (Re)fill the list from the catalog, replacing any run in progress.
    pub fn start_population(&self) {
        self.cancel_population();
        self.context.list.clear();

        let mut run = PopulationRun::new(self.context.clone());
        let status = run.status();
        let handle = self
            .scheduler
            .schedule_repeating(Box::new(move || run.step()));

        debug!(task = handle.id(), "Icon theme population started");
        *self.active.borrow_mut() = Some(ActiveRun { status, handle });
    }

    /// Stop the current run, if any. Once this returns no further step of
    /// that run executes.
    pub fn cancel_population(&self) {
        let active = self.active.borrow_mut().take();
        if let Some(active) = active {
            if active.status.cancel() {
                debug!(task = active.handle.id(), "Icon theme population cancelled");
            }
            self.scheduler.cancel(active.handle);
        }
    }

    /// User picked a theme in the list.
    ///
    /// Previews follow the pick unless the list is still being filled; the
    /// run refreshes them itself when it finishes.
    pub fn select_theme(&self, theme_id: Option<&str>) {
        {
            let mut session = self.context.session.borrow_mut();
            if session.pending_theme() == theme_id {
                return;
            }
            session.set_pending_theme(theme_id.map(str::to_owned));
        }

        if self.is_populating() {
            return;
        }
        self.context.refresh_previews();
    }

    pub fn set_overrides(&self, overrides: bool) {
        self.context
            .session
            .borrow_mut()
            .set_pending_override(overrides);
    }

    pub fn is_dirty(&self) -> bool {
        self.context.session.borrow().is_dirty()
    }

    /// Commit the pending selection through `bus`.
    ///
    /// Bus subscribers may call back into the dialog. A selection they make
    /// during the commit stays pending against the new baseline.
    pub fn apply(&self, bus: &dyn ConfigBus) -> Result<CommitResult> {
        let mut committed = self.context.session.borrow().clone();
        let result = committed.commit(bus);
        self.context
            .session
            .borrow_mut()
            .rebase(committed.baseline().clone());
        result
    }

    /// Tear down: cancel any run in progress.
    pub fn close(&self) {
        self.cancel_population();
        debug!("Icon theme dialog closed");
    }
}

impl Drop for IconThemeDialog {
    fn drop(&mut self) {
        self.cancel_population();
    }
}
