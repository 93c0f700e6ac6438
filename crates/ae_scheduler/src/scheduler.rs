//! Class-sharded, dependency-gated task pool.
//!
//! Generalizes a phase/conflict-batched ECS scheduler into a pool where
//! each task declares the [`ThreadClass`] of thread it needs and an
//! explicit list of dependency tasks, rather than being grouped by a
//! fixed render-frame phase.

use crate::class::{ThreadClass, ThreadClassMask};
use crate::task::{Task, TaskStatus};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SHARDS_PER_CLASS: usize = 2;
const SLEEP_STEP: Duration = Duration::from_nanos(4);
const MAX_SLEEP_ON_IDLE: Duration = Duration::from_micros(10);

/// A single shard of a class's task queue, reference-counted so worker
/// threads can hold their own handle without borrowing the `Scheduler`
/// for `'static`.
type Shard = Arc<Mutex<std::collections::VecDeque<Arc<Task>>>>;

/// Owns the per-class task queues and the worker threads draining them.
pub struct Scheduler {
    queues: [Vec<Shard>; 5],
    looping: Arc<AtomicBool>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with no worker threads running yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| {
                (0..SHARDS_PER_CLASS).map(|_| Arc::new(Mutex::new(Default::default()))).collect()
            }),
            looping: Arc::new(AtomicBool::new(true)),
            threads: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a new task for `class`, gated on `dependencies`. The task
    /// runs only once every dependency has completed; if any dependency is
    /// canceled, this task is canceled in turn (fan-out) instead of
    /// running.
    pub fn spawn(
        &self,
        class: ThreadClass,
        dependencies: Vec<Arc<Task>>,
        run: impl FnOnce() + Send + 'static,
    ) -> Arc<Task> {
        self.spawn_with_cancel(class, dependencies, run, None)
    }

    /// Like [`Scheduler::spawn`] but with an explicit cancellation
    /// callback, invoked at most once if the task is canceled before it
    /// runs.
    pub fn spawn_with_cancel(
        &self,
        class: ThreadClass,
        dependencies: Vec<Arc<Task>>,
        run: impl FnOnce() + Send + 'static,
        on_cancel: Option<Box<dyn FnOnce() + Send>>,
    ) -> Arc<Task> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let task = Task::new(id, class, dependencies, Box::new(run), on_cancel);
        let shards = &self.queues[class.index()];
        let shard_idx = (id as usize) % shards.len();
        shards[shard_idx].lock().expect("scheduler shard poisoned").push_back(Arc::clone(&task));
        task
    }

    /// Directly cancel `task`. Returns `true` if this call performed the
    /// cancellation (it is a no-op if the task already started, completed,
    /// or was already canceled).
    pub fn cancel(&self, task: &Arc<Task>) -> bool {
        task.cancel()
    }

    /// Spawn `count` worker threads, each pulling only from classes set in
    /// `serviced`.
    pub fn spawn_threads(&self, count: usize, serviced: ThreadClassMask) {
        let classes: Vec<ThreadClass> =
            ThreadClass::ALL.into_iter().filter(|c| serviced.contains(c.mask())).collect();
        let mut threads = self.threads.lock().expect("scheduler thread list poisoned");
        for _ in 0..count {
            let looping = Arc::clone(&self.looping);
            let queues = self.queues_ptr();
            let classes = classes.clone();
            threads.push(thread::spawn(move || worker_loop(looping, queues, classes)));
        }
    }

    fn queues_ptr(&self) -> SharedQueues {
        SharedQueues(self.queues.iter().map(|class_shards| class_shards.clone()).collect())
    }

    /// Block the calling thread until every task in `tasks` has settled
    /// (completed or been canceled), or until `timeout` elapses. Returns
    /// `true` if all tasks settled before the timeout.
    #[must_use]
    pub fn wait_all(&self, tasks: &[Arc<Task>], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if tasks.iter().all(|t| t.status().is_settled()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::yield_now();
        }
    }

    /// Stop accepting new work on the worker threads and join them all.
    pub fn detach(&self) {
        self.looping.store(false, Ordering::Release);
        let mut threads = self.threads.lock().expect("scheduler thread list poisoned");
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.detach();
    }
}

struct SharedQueues(Vec<Vec<Shard>>);

fn worker_loop(looping: Arc<AtomicBool>, queues: SharedQueues, classes: Vec<ThreadClass>) {
    let mut sleep = SLEEP_STEP;
    while looping.load(Ordering::Acquire) {
        let mut did_work = false;
        for class in &classes {
            let shards = &queues.0[class.index()];
            for shard in shards {
                let Ok(mut guard) = shard.try_lock() else { continue };
                let Some(task) = guard.pop_front() else { continue };
                drop(guard);

                if task.status() != TaskStatus::Pending {
                    did_work = true;
                    continue;
                }
                if task.has_canceled_dependency() {
                    task.cancel_fanout();
                    did_work = true;
                    continue;
                }
                if !task.dependencies_settled() {
                    shard.lock().expect("scheduler shard poisoned").push_back(task);
                    continue;
                }
                if task.try_claim() {
                    task.run();
                    did_work = true;
                }
            }
        }

        if did_work {
            sleep = SLEEP_STEP;
        } else {
            thread::sleep(sleep);
            sleep = (sleep * 2).min(MAX_SLEEP_ON_IDLE);
        }
    }
}
