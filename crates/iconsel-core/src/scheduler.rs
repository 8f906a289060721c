//! Cooperative scheduling of repeating idle tasks.
//!
//! A task is a closure returning `true` to be called again or `false` when
//! it is finished. The host runs tasks between its own work (on GTK that is
//! a glib idle source), one invocation at a time on the main thread.
//!
//! [`IdleQueue`] is a host-free scheduler driven by an explicit loop, used by
//! the headless CLI and by tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::trace;

/// Repeating step function; returns whether to keep going.
pub type StepFn = Box<dyn FnMut() -> bool>;

/// Identifies a scheduled task for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Runs repeating tasks cooperatively on the calling thread's event loop.
pub trait Scheduler {
    /// Call `step` repeatedly until it returns `false` or the task is
    /// cancelled.
    fn schedule_repeating(&self, step: StepFn) -> TaskHandle;

    /// Stop calling the task. Must take effect before returning: the task's
    /// closure is never invoked again. Unknown or finished handles are
    /// ignored.
    fn cancel(&self, handle: TaskHandle);
}

struct QueuedTask {
    handle: TaskHandle,
    step: StepFn,
}

/// Round-robin scheduler driven by [`IdleQueue::tick`].
///
/// Each tick invokes exactly one task once. Tasks may schedule or cancel
/// tasks (including themselves) from inside their step.
#[derive(Default)]
pub struct IdleQueue {
    tasks: RefCell<VecDeque<QueuedTask>>,
    next_id: Cell<u64>,
    running: Cell<Option<TaskHandle>>,
    running_cancelled: Cell<bool>,
}

impl IdleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run (excluding one currently running).
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Run the task at the front of the queue once.
    ///
    /// Returns `false` if there was nothing to run.
    pub fn tick(&self) -> bool {
        let Some(mut task) = self.tasks.borrow_mut().pop_front() else {
            return false;
        };

        self.running.set(Some(task.handle));
        self.running_cancelled.set(false);

        // No borrow of `tasks` is held here, so the step may re-enter.
        let keep = (task.step)();

        self.running.set(None);
        let cancelled = self.running_cancelled.replace(false);

        if keep && !cancelled {
            self.tasks.borrow_mut().push_back(task);
        } else {
            trace!(task = task.handle.id(), cancelled, "Idle task finished");
        }
        true
    }

    /// Tick until no task remains or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }
}

impl Scheduler for IdleQueue {
    fn schedule_repeating(&self, step: StepFn) -> TaskHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = TaskHandle::new(id);

        self.tasks.borrow_mut().push_back(QueuedTask { handle, step });
        trace!(task = id, "Idle task scheduled");
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        if self.running.get() == Some(handle) {
            self.running_cancelled.set(true);
            return;
        }
        self.tasks.borrow_mut().retain(|t| t.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn counting_task(counter: &Rc<Cell<u32>>, limit: u32) -> StepFn {
        let counter = Rc::clone(counter);
        Box::new(move || {
            counter.set(counter.get() + 1);
            counter.get() < limit
        })
    }

    #[test]
    fn test_task_runs_until_it_returns_false() {
        let queue = IdleQueue::new();
        let counter = Rc::new(Cell::new(0));
        queue.schedule_repeating(counting_task(&counter, 3));

        assert_eq!(queue.run_until_idle(100), 3);
        assert_eq!(counter.get(), 3);
        assert!(queue.is_idle());
        assert!(!queue.tick());
    }

    #[test]
    fn test_tasks_interleave() {
        let queue = IdleQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["a", "b"] {
            let log = Rc::clone(&log);
            let mut left = 2;
            queue.schedule_repeating(Box::new(move || {
                log.borrow_mut().push(name);
                left -= 1;
                left > 0
            }));
        }

        queue.run_until_idle(100);
        assert_eq!(*log.borrow(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_cancel_queued_task() {
        let queue = IdleQueue::new();
        let counter = Rc::new(Cell::new(0));
        let handle = queue.schedule_repeating(counting_task(&counter, 100));

        queue.tick();
        queue.cancel(handle);
        assert_eq!(queue.run_until_idle(100), 0);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_task_cancelling_itself_is_not_requeued() {
        let queue = Rc::new(IdleQueue::new());
        let handle_cell: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
        let runs = Rc::new(Cell::new(0));

        let task_queue = Rc::clone(&queue);
        let task_handle = Rc::clone(&handle_cell);
        let task_runs = Rc::clone(&runs);
        let handle = queue.schedule_repeating(Box::new(move || {
            task_runs.set(task_runs.get() + 1);
            if let Some(handle) = task_handle.get() {
                task_queue.cancel(handle);
            }
            true
        }));
        handle_cell.set(Some(handle));

        queue.run_until_idle(100);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_cancel_unknown_handle_is_ignored() {
        let queue = IdleQueue::new();
        let counter = Rc::new(Cell::new(0));
        queue.schedule_repeating(counting_task(&counter, 2));

        queue.cancel(TaskHandle::new(999));
        assert_eq!(queue.run_until_idle(100), 2);
    }

    #[test]
    fn test_run_until_idle_respects_limit() {
        let queue = IdleQueue::new();
        let counter = Rc::new(Cell::new(0));
        queue.schedule_repeating(counting_task(&counter, 1000));

        assert_eq!(queue.run_until_idle(10), 10);
        assert_eq!(queue.pending(), 1);
    }
}
