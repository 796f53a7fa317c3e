//! Per-thread internal name
//!
//! The internal name is an in-process label owned by the thread that set it.
//! It is independent of the OS-visible name and is what log lines and
//! diagnostics use. There is no API to read or write another
//! thread's slot.
//!
//! With the `no-thread-local` feature the slot does not exist: stores are
//! dropped and every read yields the empty string.

cfg_if::cfg_if! {
    if #[cfg(not(feature = "no-thread-local"))] {
        use std::cell::RefCell;

        thread_local! {
            /// Internal name of the current OS thread ("" until set)
            static INTERNAL_NAME: RefCell<String> = const { RefCell::new(String::new()) };
        }

        /// Set the in-memory internal name for the calling thread.
        ///
        /// Overwrites any previous value. Does not affect the OS-visible name.
        #[inline]
        pub fn set_internal_name(name: &str) {
            INTERNAL_NAME.with_borrow_mut(|slot| {
                slot.clear();
                slot.push_str(name);
            });
        }

        /// Run `f` with a borrow of the calling thread's internal name.
        #[inline]
        pub fn with_internal_name<R>(f: impl FnOnce(&str) -> R) -> R {
            INTERNAL_NAME.with_borrow(|slot| f(slot.as_str()))
        }
    } else {
        /// Set the in-memory internal name for the calling thread (no-op).
        #[inline]
        pub fn set_internal_name(_name: &str) {}

        /// Run `f` with the calling thread's internal name (always "").
        #[inline]
        pub fn with_internal_name<R>(f: impl FnOnce(&str) -> R) -> R {
            f("")
        }
    }
}

/// Get the calling thread's internal name, or "" if it was never set.
#[inline]
pub fn get_internal_name() -> String {
    with_internal_name(str::to_owned)
}
