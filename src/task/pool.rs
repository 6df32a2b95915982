use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_queue::SegQueue;
use log::{debug, error};
use parking_lot::{Condvar, Mutex};

use super::{Executor, Job};

/// Bound on an idle worker's sleep, so that shutdown is never missed.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Fixed set of worker threads fed by a lock-free job queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    queue: SegQueue<Job>,
    lock: Mutex<()>,
    cond: Condvar,
    running: AtomicBool,
}

impl WorkerPool {
    /// Start `size` worker threads (at least one).
    pub fn new(size: usize) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: SegQueue::new(),
            lock: Mutex::new(()),
            cond: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let threads = (0..size.max(1))
            .map(|i| {
                let shared = shared.clone();
                thread::Builder::new()
                    .name(format!("hivews-worker-{}", i))
                    .spawn(move || work(shared))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(Self {
            shared,
            threads: Mutex::new(threads),
        })
    }

    /// Number of queued jobs not picked up yet.
    pub fn queued(&self) -> usize { self.shared.queue.len() }

    /// Stop accepting new work, let queued jobs finish, then join the workers.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Release);
        {
            let _guard = self.shared.lock.lock();
            self.shared.cond.notify_all();
        }

        let current = thread::current().id();
        for handle in self.threads.lock().drain(..) {
            // the last reference may be dropped by one of our own jobs
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        if !self.shared.running.load(Ordering::Acquire) {
            debug!("worker pool: job dropped after shutdown");
            return;
        }
        self.shared.queue.push(job);
        let _guard = self.shared.lock.lock();
        self.shared.cond.notify_one();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) { self.shutdown(); }
}

fn work(shared: Arc<Shared>) {
    loop {
        if let Some(job) = shared.queue.pop() {
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                error!("worker pool: job panicked");
            }
            continue;
        }

        if !shared.running.load(Ordering::Acquire) {
            break;
        }

        let mut guard = shared.lock.lock();
        if shared.queue.is_empty() && shared.running.load(Ordering::Acquire) {
            shared.cond.wait_for(&mut guard, IDLE_WAIT);
        }
    }
}
