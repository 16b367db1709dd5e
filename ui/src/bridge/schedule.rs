//! Deferred task scheduling with cancellable handles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Run `task` once after `delay`. Dropping or cancelling the returned handle
    /// before the delay elapses prevents the task from running.
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask;
}

/// Handle for a pending task.
#[must_use = "dropping a ScheduledTask cancels it"]
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl ScheduledTask {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel (the task already ran).
    pub fn completed() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Browser timer backed scheduler.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeoutScheduler;

#[cfg(target_arch = "wasm32")]
impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = gloo_timers::callback::Timeout::new(millis, task);
        // Dropping a gloo Timeout clears it.
        ScheduledTask::new(move || drop(timeout))
    }
}

/// Runs every task synchronously at schedule time. Used where no event loop
/// timer exists (native builds).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, _delay: Duration, task: Task) -> ScheduledTask {
        task();
        ScheduledTask::completed()
    }
}

struct PendingTask {
    id: u64,
    due: Duration,
    task: Task,
}

#[derive(Default)]
struct Timeline {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<Vec<PendingTask>>,
}

/// Virtual clock scheduler; tasks only run when [`ManualScheduler::advance`] is
/// called. Clones share the same timeline.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timeline: Rc<Timeline>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.timeline.queue.borrow().len()
    }

    /// Move the clock forward and run every task that became due, in due order.
    pub fn advance(&self, by: Duration) {
        let target = self.timeline.now.get() + by;
        loop {
            let next = {
                let mut queue = self.timeline.queue.borrow_mut();
                let position = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, pending)| pending.due <= target)
                    .min_by_key(|(_, pending)| (pending.due, pending.id))
                    .map(|(idx, _)| idx);
                position.map(|idx| queue.remove(idx))
            };
            let Some(pending) = next else {
                break;
            };
            self.timeline.now.set(pending.due);
            (pending.task)();
        }
        self.timeline.now.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> ScheduledTask {
        let id = self.timeline.next_id.get();
        self.timeline.next_id.set(id + 1);
        self.timeline.queue.borrow_mut().push(PendingTask {
            id,
            due: self.timeline.now.get() + delay,
            task,
        });

        let timeline = Rc::downgrade(&self.timeline);
        ScheduledTask::new(move || {
            if let Some(timeline) = timeline.upgrade() {
                timeline.queue.borrow_mut().retain(|pending| pending.id != id);
            }
        })
    }
}
