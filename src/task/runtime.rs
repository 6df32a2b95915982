use tokio::runtime::Handle;

use super::{Executor, Job};

/// Run jobs on the blocking pool of a tokio runtime.
///
/// Read cycles and handler callbacks are synchronous, so they go through
/// `spawn_blocking` rather than occupying the async workers.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self { Self { handle } }

    /// Use the runtime the caller is running on, if any.
    pub fn try_current() -> Option<Self> { Handle::try_current().ok().map(Self::new) }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        // dropping the JoinHandle detaches the job
        let _ = self.handle.spawn_blocking(job);
    }
}
