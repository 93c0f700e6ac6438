//! A single unit of scheduled work: a run closure gated on a set of
//! dependency tasks, with atomic status transitions and a cancel path.

use crate::class::ThreadClass;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Lifecycle of a [`Task`]. Transitions are compare-and-swap guarded so a
/// task runs or cancels at most once no matter how many threads race to
/// pick it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    /// Queued, not yet started.
    Pending = 0,
    /// A worker has claimed it and is running its closure.
    InProgress = 1,
    /// Finished normally.
    Complete = 2,
    /// Canceled before it ran, either directly or by a canceled dependency.
    Canceled = 3,
}

impl TaskStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Pending,
            1 => TaskStatus::InProgress,
            2 => TaskStatus::Complete,
            _ => TaskStatus::Canceled,
        }
    }

    /// Whether a dependent waiting on this status may proceed.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Canceled)
    }
}

type RunFn = Box<dyn FnOnce() + Send>;

/// A unit of scheduled work.
pub struct Task {
    id: u64,
    class: ThreadClass,
    status: AtomicU8,
    dependencies: Vec<Arc<Task>>,
    run: Mutex<Option<RunFn>>,
    on_cancel: Mutex<Option<RunFn>>,
}

impl Task {
    pub(crate) fn new(
        id: u64,
        class: ThreadClass,
        dependencies: Vec<Arc<Task>>,
        run: RunFn,
        on_cancel: Option<RunFn>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            class,
            status: AtomicU8::new(TaskStatus::Pending as u8),
            dependencies,
            run: Mutex::new(Some(run)),
            on_cancel: Mutex::new(on_cancel),
        })
    }

    /// Opaque identifier assigned at `spawn` time.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The class of thread this task must run on.
    #[must_use]
    pub fn class(&self) -> ThreadClass {
        self.class
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Whether every dependency has settled (completed or been canceled).
    #[must_use]
    pub fn dependencies_settled(&self) -> bool {
        self.dependencies.iter().all(|d| d.status().is_settled())
    }

    /// Whether any dependency was canceled, meaning this task can never
    /// run and should be canceled itself.
    #[must_use]
    pub fn has_canceled_dependency(&self) -> bool {
        self.dependencies.iter().any(|d| d.status() == TaskStatus::Canceled)
    }

    /// Atomically claim this task for execution. Returns `false` if
    /// another thread already claimed or canceled it.
    pub(crate) fn try_claim(&self) -> bool {
        self.status
            .compare_exchange(
                TaskStatus::Pending as u8,
                TaskStatus::InProgress as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Run the closure (must already be claimed via `try_claim`) and mark
    /// the task complete.
    pub(crate) fn run(&self) {
        if let Some(f) = self.run.lock().expect("task run lock poisoned").take() {
            f();
        }
        self.status.store(TaskStatus::Complete as u8, Ordering::Release);
    }

    /// Cancel this task if it is still pending. Fires the cancel callback,
    /// if one was supplied, exactly once.
    ///
    /// Returns `true` if this call performed the cancellation.
    pub fn cancel(&self) -> bool {
        let canceled = self
            .status
            .compare_exchange(
                TaskStatus::Pending as u8,
                TaskStatus::Canceled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if canceled {
            if let Some(f) = self.on_cancel.lock().expect("task cancel lock poisoned").take() {
                f();
            }
        }
        canceled
    }

    /// Mark this task canceled because a dependency was canceled, without
    /// requiring it to currently be `Pending` from the caller's view (used
    /// by the scheduler's fan-out pass, which already checked status).
    pub(crate) fn cancel_fanout(self: &Arc<Self>) {
        self.cancel();
    }
}
