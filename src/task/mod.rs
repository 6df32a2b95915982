//! Dispatch of per-event work.
//!
//! A multiplexer never runs a read cycle itself; it hands a [`Job`] to an
//! [`Executor`] and goes back to waiting for readiness.

mod pool;

pub use pool::WorkerPool;

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio")] {
        mod runtime;
        pub use runtime::TokioExecutor;
    }
}

/// Unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs jobs, in any order, on any thread.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job);
}
