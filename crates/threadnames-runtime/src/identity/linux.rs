//! Linux / Android naming through `prctl(PR_SET_NAME)`

use std::ffi::CStr;

/// 16-byte `comm` buffer minus the terminator
pub(super) const MAX_NAME_LEN: usize = 15;

pub(super) fn set_name(name: &CStr) {
    let _ = nix::sys::prctl::set_name(name);
}

pub(super) fn get_name() -> Option<String> {
    nix::sys::prctl::get_name()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
}
