//! Error types for pool management
//!
//! Naming and the rename barrier never fail observably; only building,
//! resizing and configuring a pool can.

use core::fmt;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur in pool operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The OS refused to spawn a worker thread
    SpawnFailed(WorkerSpawnError),

    /// The pool was stopped
    Stopped,

    /// Requested worker count exceeds `MAX_WORKERS`
    TooManyWorkers(usize),

    /// Configuration failed validation
    InvalidConfig(&'static str),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::SpawnFailed(e) => write!(f, "failed to spawn worker: {}", e),
            PoolError::Stopped => write!(f, "pool stopped"),
            PoolError::TooManyWorkers(n) => write!(f, "too many workers requested: {}", n),
            PoolError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure to start a worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpawnError {
    /// Worker ID that failed to start
    pub worker_id: usize,
    /// OS error text
    pub reason: String,
}

impl fmt::Display for WorkerSpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {}: {}", self.worker_id, self.reason)
    }
}

impl std::error::Error for WorkerSpawnError {}

impl From<WorkerSpawnError> for PoolError {
    fn from(e: WorkerSpawnError) -> Self {
        PoolError::SpawnFailed(e)
    }
}
