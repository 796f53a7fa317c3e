//! FreeBSD / OpenBSD / DragonFly naming through `pthread_set_name_np`
//!
//! No read-back: the name is only visible to external tools.

use std::ffi::CStr;

/// `MAXCOMLEN` on OpenBSD; FreeBSD allows a little more but shows 15 in `ps`
pub(super) const MAX_NAME_LEN: usize = 15;

pub(super) fn set_name(name: &CStr) {
    // Safety: `name` is a valid NUL-terminated string for the duration of the call
    unsafe {
        libc::pthread_set_name_np(libc::pthread_self(), name.as_ptr());
    }
}

pub(super) fn get_name() -> Option<String> {
    None
}
