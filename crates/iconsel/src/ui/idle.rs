//! [`Scheduler`] backed by glib idle sources on the GTK main loop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gtk4::glib::{self, ControlFlow, SourceId};
use tracing::trace;

use iconsel_core::{Scheduler, StepFn, TaskHandle};

/// Runs each task from an idle source, one step per main loop iteration.
#[derive(Default)]
pub struct GlibIdleScheduler {
    next_id: Cell<u64>,
    /// Live sources. A source leaves the map when its task finishes or is
    /// cancelled, so it is never removed twice.
    sources: Rc<RefCell<HashMap<u64, SourceId>>>,
}

impl GlibIdleScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for GlibIdleScheduler {
    fn schedule_repeating(&self, mut step: StepFn) -> TaskHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let sources = Rc::clone(&self.sources);
        let source = glib::idle_add_local(move || {
            if step() {
                ControlFlow::Continue
            } else {
                sources.borrow_mut().remove(&id);
                trace!(task = id, "Idle source finished");
                ControlFlow::Break
            }
        });

        self.sources.borrow_mut().insert(id, source);
        TaskHandle::new(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        let source = self.sources.borrow_mut().remove(&handle.id());
        if let Some(source) = source {
            source.remove();
            trace!(task = handle.id(), "Idle source removed");
        }
    }
}
