//! Pool traits
//!
//! The rename barrier never depends on a concrete pool. It needs exactly two
//! things: the current worker count and a way to get a closure executed on
//! some worker thread.

use crate::handle::JobHandle;

/// A unit of work. The argument is the ID of the worker running it.
pub type Job = Box<dyn FnOnce(usize) + Send + 'static>;

/// A pool of worker threads that executes submitted jobs.
///
/// **Contract:**
/// - `size()` never blocks and may change concurrently (resize, shutdown).
/// - `submit()` never blocks on job execution. Every job is either run
///   exactly once on a worker thread or dropped; the returned handle
///   resolves in both cases.
/// - Jobs may run in any order and interleave with unrelated work.
pub trait WorkerPool: Send + Sync {
    /// Current number of workers (best effort)
    fn size(&self) -> usize;

    /// Queue `job` for execution on some worker
    fn submit(&self, job: Job) -> JobHandle;
}

impl<P: WorkerPool + ?Sized> WorkerPool for &P {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn submit(&self, job: Job) -> JobHandle {
        (**self).submit(job)
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for std::sync::Arc<P> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn submit(&self, job: Job) -> JobHandle {
        (**self).submit(job)
    }
}
