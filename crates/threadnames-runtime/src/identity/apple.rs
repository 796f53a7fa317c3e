//! macOS / iOS naming through `pthread_setname_np`
//!
//! Apple's variant only names the calling thread.

use std::ffi::CStr;

/// `MAXTHREADNAMESIZE` (64) minus the terminator
pub(super) const MAX_NAME_LEN: usize = 63;

pub(super) fn set_name(name: &CStr) {
    // Safety: `name` is a valid NUL-terminated string for the duration of the call
    unsafe {
        libc::pthread_setname_np(name.as_ptr());
    }
}

pub(super) fn get_name() -> Option<String> {
    let mut buf = [0 as libc::c_char; MAX_NAME_LEN + 1];
    // Safety: buffer length is passed explicitly; the call NUL-terminates
    let rc = unsafe { libc::pthread_getname_np(libc::pthread_self(), buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return None;
    }
    // Safety: a successful call left a NUL-terminated string in `buf`
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(name.to_string_lossy().into_owned())
}
