//! Dependency-gated, class-sharded task scheduler used by the build
//! server and the pack compilers for everything that benefits from
//! running off the calling thread: file I/O, network uploads, and
//! CPU-bound compilation work.
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod class;
pub mod scheduler;
pub mod task;

pub use class::{ThreadClass, ThreadClassMask};
pub use scheduler::Scheduler;
pub use task::{Task, TaskStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn independent_tasks_all_complete() {
        let sched = Scheduler::new();
        sched.spawn_threads(2, ThreadClassMask::all_classes());
        let counter = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let counter = Arc::clone(&counter);
                sched.spawn(ThreadClass::Worker, Vec::new(), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        assert!(sched.wait_all(&tasks, Duration::from_secs(5)));
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        sched.detach();
    }

    #[test]
    fn dependent_task_runs_after_its_dependency() {
        let sched = Scheduler::new();
        sched.spawn_threads(2, ThreadClassMask::all_classes());
        let order = Arc::new(Mutex_::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let first = sched.spawn(ThreadClass::Worker, Vec::new(), move || {
            o1.lock().unwrap().push(1);
        });
        let o2 = Arc::clone(&order);
        let second = sched.spawn(ThreadClass::Worker, vec![Arc::clone(&first)], move || {
            o2.lock().unwrap().push(2);
        });

        assert!(sched.wait_all(&[first, second], Duration::from_secs(5)));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
        sched.detach();
    }

    #[test]
    fn canceling_a_dependency_fans_out_to_dependents() {
        // Tasks are spawned before any worker thread exists, so cancel()
        // is guaranteed to observe the blocker as still Pending.
        let sched = Scheduler::new();
        let ran = Arc::new(AtomicU32::new(0));

        let blocker = sched.spawn(ThreadClass::Worker, Vec::new(), || {});
        let r = Arc::clone(&ran);
        let dependent =
            sched.spawn(ThreadClass::Worker, vec![Arc::clone(&blocker)], move || {
                r.fetch_add(1, Ordering::SeqCst);
            });

        assert!(sched.cancel(&blocker));
        sched.spawn_threads(2, ThreadClassMask::all_classes());
        assert!(sched.wait_all(&[dependent.clone()], Duration::from_secs(5)));
        assert_eq!(dependent.status(), TaskStatus::Canceled);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        sched.detach();
    }

    use std::sync::Mutex as Mutex_;
}
