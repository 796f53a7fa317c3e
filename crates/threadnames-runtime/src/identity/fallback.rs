//! Platforms without a thread naming call: every operation is a no-op.

use std::ffi::CStr;

pub(super) const MAX_NAME_LEN: usize = 15;

pub(super) fn set_name(_name: &CStr) {}

pub(super) fn get_name() -> Option<String> {
    None
}
