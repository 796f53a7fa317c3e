//! Thread identity: OS-visible name plus in-process internal name
//!
//! Every function here acts on the *calling* thread. There is no way to
//! rename another thread by handle; pool workers rename themselves by running
//! a job (see [`crate::barrier`]).
//!
//! OS naming is best effort. Names are cut at the first NUL byte and
//! truncated on a UTF-8 boundary to the platform limit; platforms without a
//! naming call silently ignore the request.

pub use threadnames_core::thread_name::{get_internal_name, set_internal_name, with_internal_name};

use std::ffi::CString;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        mod linux;
        use linux as platform;
    } else if #[cfg(any(target_os = "macos", target_os = "ios"))] {
        mod apple;
        use apple as platform;
    } else if #[cfg(any(target_os = "freebsd", target_os = "openbsd", target_os = "dragonfly"))] {
        mod bsd;
        use bsd as platform;
    } else {
        mod fallback;
        use fallback as platform;
    }
}

/// Maximum visible bytes of an OS thread name on this platform
#[inline]
pub fn os_name_max_len() -> usize {
    platform::MAX_NAME_LEN
}

/// Set the calling thread's OS-visible name. Does not touch the internal name.
pub fn set_os_name(name: &str) {
    if let Some(cname) = os_name_cstring(name, platform::MAX_NAME_LEN) {
        platform::set_name(&cname);
    }
}

/// Read back the calling thread's OS-visible name, where the platform allows.
pub fn get_os_name() -> Option<String> {
    platform::get_name()
}

/// Set both the OS-visible and the internal name of the calling thread.
pub fn rename_current_thread(name: &str) {
    set_os_name(name);
    set_internal_name(name);
}

/// Build the C string handed to the OS: stop at the first NUL, then keep at
/// most `max` bytes without splitting a character.
fn os_name_cstring(name: &str, max: usize) -> Option<CString> {
    let name = match name.find('\0') {
        Some(nul) => &name[..nul],
        None => name,
    };
    let mut end = name.len().min(max);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    CString::new(&name[..end]).ok()
}
