//! Thread-local worker context
//!
//! Pool workers record their ID here so that code running inside a job can
//! ask which worker it is on without threading the ID through every call.

use std::cell::Cell;
use threadnames_core::constants::WORKER_NONE;

thread_local! {
    /// Worker ID of this OS thread within its pool
    static WORKER_ID: Cell<usize> = const { Cell::new(WORKER_NONE) };
}

/// Set the current worker ID
#[inline]
pub(crate) fn set_worker_id(id: usize) {
    WORKER_ID.with(|cell| cell.set(id));
}

/// Forget the worker ID (thread leaving the pool)
#[inline]
pub(crate) fn clear_worker_id() {
    WORKER_ID.with(|cell| cell.set(WORKER_NONE));
}

/// Worker ID of the calling thread, or `None` if it is not a pool worker
#[inline]
pub fn current_worker_id() -> Option<usize> {
    let id = WORKER_ID.with(|cell| cell.get());
    if id == WORKER_NONE {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_lifecycle() {
        std::thread::spawn(|| {
            assert_eq!(current_worker_id(), None);
            set_worker_id(4);
            assert_eq!(current_worker_id(), Some(4));
            clear_worker_id();
            assert_eq!(current_worker_id(), None);
        })
        .join()
        .unwrap();
    }
}
