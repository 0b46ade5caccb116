//! The single shared per-frame task runner.
//!
//! Every animation in the engine registers here instead of driving its own
//! timer. The scheduler keeps at most one frame request outstanding: a request
//! exists exactly while the task set is non-empty. The host loop asks
//! [`AnimationScheduler::has_pending_frame`] and, when a frame is granted,
//! calls [`AnimationScheduler::tick`] with the shared frame context.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, warn};

/// What a task wants after running for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Continue,
    /// Unregister this task (one-shot work such as a finished transition).
    Stop,
}

/// Failure reported by a task. The scheduler drops the task and keeps going.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TaskError(pub String);

impl TaskError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type TaskResult = std::result::Result<TaskStatus, TaskError>;

/// Timing information handed to every task on a tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub now: Instant,
    /// Number of ticks the scheduler has run so far.
    pub frame: u64,
}

/// Opaque handle returned by [`AnimationScheduler::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A registered per-frame callback over a shared context `C`.
pub type AnimationTask<C> = Box<dyn FnMut(&mut C, FrameInfo) -> TaskResult>;

struct Entry<C> {
    id: TaskId,
    name: &'static str,
    task: AnimationTask<C>,
}

pub struct AnimationScheduler<C> {
    tasks: Vec<Entry<C>>,
    next_task_id: u64,
    /// Whether a request for the next frame is outstanding.
    frame_requested: bool,
    frames: u64,
    failures: u64,
}

impl<C> Default for AnimationScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AnimationScheduler<C> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_task_id: 0,
            frame_requested: false,
            frames: 0,
            failures: 0,
        }
    }

    /// Register a task. Starts the loop if it was idle.
    pub fn add<F>(&mut self, name: &'static str, task: F) -> TaskId
    where
        F: FnMut(&mut C, FrameInfo) -> TaskResult + 'static,
    {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.tasks.push(Entry {
            id,
            name,
            task: Box::new(task),
        });
        debug!(task = name, active = self.tasks.len(), "animation task added");
        self.request_frame();
        id
    }

    /// Unregister a task. Stops the loop once nothing is left.
    /// Returns `false` if the id was not registered.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|entry| entry.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(active = self.tasks.len(), "animation task removed");
        }
        if self.tasks.is_empty() {
            self.cancel_frame();
        }
        removed
    }

    /// Drop every task and stop unconditionally.
    pub fn destroy(&mut self) {
        self.tasks.clear();
        self.cancel_frame();
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|entry| entry.id == id)
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_running(&self) -> bool {
        self.frame_requested
    }

    /// 0 when idle, 1 when running. Never more.
    pub fn pending_frame_requests(&self) -> usize {
        usize::from(self.frame_requested)
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame_requested
    }

    pub fn failed_task_count(&self) -> u64 {
        self.failures
    }

    pub fn frames_run(&self) -> u64 {
        self.frames
    }

    /// Run one frame: every live task once, in registration order.
    ///
    /// Does nothing unless a frame request is outstanding. A task that
    /// returns an error or panics is removed on its own; its siblings still
    /// run. Returns the number of tasks invoked.
    pub fn tick(&mut self, ctx: &mut C, now: Instant) -> usize {
        if !std::mem::take(&mut self.frame_requested) {
            return 0;
        }

        let info = FrameInfo {
            now,
            frame: self.frames,
        };
        self.frames += 1;

        let entries = std::mem::take(&mut self.tasks);
        let invoked = entries.len();
        let mut survivors = Vec::with_capacity(entries.len());

        for mut entry in entries {
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.task)(ctx, info)));
            match outcome {
                Ok(Ok(TaskStatus::Continue)) => survivors.push(entry),
                Ok(Ok(TaskStatus::Stop)) => {
                    debug!(task = entry.name, "animation task finished");
                }
                Ok(Err(err)) => {
                    self.failures += 1;
                    warn!(task = entry.name, error = %err, "animation task failed, removing it");
                }
                Err(payload) => {
                    self.failures += 1;
                    warn!(
                        task = entry.name,
                        panic = %panic_message(payload.as_ref()),
                        "animation task panicked, removing it"
                    );
                }
            }
        }

        self.tasks = survivors;
        if !self.tasks.is_empty() {
            self.request_frame();
        }
        invoked
    }

    fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    fn cancel_frame(&mut self) {
        if std::mem::take(&mut self.frame_requested) {
            debug!("animation loop idle");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(_: &mut Vec<&'static str>, _: FrameInfo) -> TaskResult {
        Ok(TaskStatus::Continue)
    }

    #[test]
    fn test_add_starts_and_remove_stops() {
        let mut scheduler: AnimationScheduler<Vec<&'static str>> = AnimationScheduler::new();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.pending_frame_requests(), 0);

        let id = scheduler.add("t1", counting);
        assert!(scheduler.is_running());
        assert_eq!(scheduler.pending_frame_requests(), 1);

        assert!(scheduler.remove(id));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.pending_frame_requests(), 0);
        assert!(!scheduler.remove(id));
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut scheduler: AnimationScheduler<()> = AnimationScheduler::new();
        scheduler.add("a", |_, _| Ok(TaskStatus::Continue));
        scheduler.add("b", |_, _| Ok(TaskStatus::Continue));
        scheduler.add("c", |_, _| Ok(TaskStatus::Continue));
        assert_eq!(scheduler.pending_frame_requests(), 1);
        scheduler.tick(&mut (), Instant::now());
        assert_eq!(scheduler.pending_frame_requests(), 1);
    }

    #[test]
    fn test_failing_task_is_isolated() {
        let mut scheduler: AnimationScheduler<Vec<&'static str>> = AnimationScheduler::new();
        scheduler.add("first", |log, _| {
            log.push("first");
            Ok(TaskStatus::Continue)
        });
        scheduler.add("broken", |_, _| Err(TaskError::new("boom")));
        scheduler.add("last", |log, _| {
            log.push("last");
            Ok(TaskStatus::Continue)
        });

        let mut log = Vec::new();
        assert_eq!(scheduler.tick(&mut log, Instant::now()), 3);
        assert_eq!(log, vec!["first", "last"]);
        assert_eq!(scheduler.active_task_count(), 2);
        assert_eq!(scheduler.failed_task_count(), 1);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let mut scheduler: AnimationScheduler<u32> = AnimationScheduler::new();
        scheduler.add("panics", |_, _| panic!("effect exploded"));
        scheduler.add("counts", |n, _| {
            *n += 1;
            Ok(TaskStatus::Continue)
        });

        let mut count = 0;
        scheduler.tick(&mut count, Instant::now());
        scheduler.tick(&mut count, Instant::now());
        assert_eq!(count, 2);
        assert_eq!(scheduler.active_task_count(), 1);
    }

    #[test]
    fn test_only_task_failing_leaves_scheduler_idle() {
        let mut scheduler: AnimationScheduler<()> = AnimationScheduler::new();
        scheduler.add("broken", |_, _| Err(TaskError::new("nope")));
        scheduler.tick(&mut (), Instant::now());
        assert_eq!(scheduler.active_task_count(), 0);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_stop_status_self_unregisters() {
        let mut scheduler: AnimationScheduler<u32> = AnimationScheduler::new();
        scheduler.add("one-shot", |n, _| {
            *n += 1;
            Ok(TaskStatus::Stop)
        });
        let mut runs = 0;
        scheduler.tick(&mut runs, Instant::now());
        assert_eq!(runs, 1);
        assert_eq!(scheduler.active_task_count(), 0);
        assert_eq!(scheduler.pending_frame_requests(), 0);

        // No frame outstanding, nothing runs.
        assert_eq!(scheduler.tick(&mut runs, Instant::now()), 0);
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut scheduler: AnimationScheduler<()> = AnimationScheduler::new();
        scheduler.add("a", |_, _| Ok(TaskStatus::Continue));
        scheduler.add("b", |_, _| Ok(TaskStatus::Continue));
        scheduler.destroy();
        assert_eq!(scheduler.active_task_count(), 0);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_frame_counter_advances() {
        let mut scheduler: AnimationScheduler<Vec<u64>> = AnimationScheduler::new();
        scheduler.add("frames", |seen, info| {
            seen.push(info.frame);
            Ok(TaskStatus::Continue)
        });
        let mut seen = Vec::new();
        for _ in 0..3 {
            scheduler.tick(&mut seen, Instant::now());
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(scheduler.frames_run(), 3);
    }
}
