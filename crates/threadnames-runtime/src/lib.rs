//! # threadnames-runtime
//!
//! Platform-specific runtime for naming the threads of a worker pool.
//!
//! This crate provides:
//! - OS thread naming (`prctl`, `pthread_setname_np`, `pthread_set_name_np`)
//! - A resizable FIFO worker pool
//! - Idle-worker parking (futex on Linux, condvar elsewhere)
//! - The rename barrier that names every worker of a live pool

pub mod config;
pub mod identity;
pub mod tls;
pub mod parking;
pub mod pool;
pub mod gate;
pub mod barrier;

// Re-exports
pub use config::{PoolConfig, RenameConfig};
pub use identity::{
    get_internal_name, get_os_name, os_name_max_len, rename_current_thread, set_internal_name,
    set_os_name,
};
pub use pool::ThreadPool;
pub use gate::ReleaseGate;
pub use barrier::{rename_pool, PollExit, RenameBarrier, RenameReport};
pub use parking::{new_parking, WorkerParking};
