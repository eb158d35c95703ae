//! Access to the host process: environment, argument vector, filesystem and
//! command interpreter.
//!
//! The delete-file and shell helpers forward to the C library primitives and
//! return their raw status codes untouched; interpreting them is up to the
//! caller.

use core::ffi::{CStr, c_char, c_int};
use std::ffi::OsStr;

use crate::config::runtime_config;
use crate::error::RuntimeResult;
use crate::managed::ManagedString;
use crate::plain::checked_index;

unsafe extern "C" {
    fn remove(path: *const c_char) -> c_int;
    fn system(command: *const c_char) -> c_int;
}

pub fn is_windows_host() -> bool {
    runtime_config().platform.is_windows()
}

/// Delete `path` with the C library `remove`. Returns 0 on success and the
/// host's non-zero status on failure.
pub fn remove_file(path: &CStr) -> i32 {
    let status = unsafe { remove(path.as_ptr()) };
    tracing::debug!(?path, status, "remove");
    status
}

/// Run `command` through the C library `system` and return its raw status
/// (a wait status on POSIX hosts).
///
/// The command reaches the shell verbatim: no quoting or escaping is applied,
/// and compiled programs rely on the shell's expansion and redirection.
/// Keeping untrusted input out of `command` is the caller's responsibility.
///
/// `None` asks the host whether a command interpreter is available (non-zero
/// if so), as `system(NULL)` does.
pub fn run_shell_command(command: Option<&CStr>) -> i32 {
    let ptr = command.map_or(core::ptr::null(), CStr::as_ptr);
    let status = unsafe { system(ptr) };
    tracing::debug!(?command, status, "system");
    status
}

/// Copy the value of the environment variable `name`, or `None` if unset.
pub fn environment_variable(name: &CStr) -> RuntimeResult<Option<ManagedString>> {
    let Some(key) = env_key(name) else {
        return Ok(None);
    };
    let value = std::env::var_os(key);
    tracing::debug!(?name, found = value.is_some(), "getenv");
    match value {
        Some(value) => ManagedString::from_bytes(value.as_encoded_bytes()).map(Some),
        None => Ok(None),
    }
}

#[cfg(unix)]
fn env_key(name: &CStr) -> Option<&OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Some(OsStr::from_bytes(name.to_bytes()))
}

#[cfg(not(unix))]
fn env_key(name: &CStr) -> Option<&OsStr> {
    name.to_str().ok().map(OsStr::new)
}

/// Read `argv[index]` without copying it.
///
/// A null `argv` yields null; a negative `index` is rejected.
///
/// # Safety
///
/// A non-null `argv` must point to an array holding more than `index` entries.
pub unsafe fn raw_argument(
    argv: *const *const c_char,
    index: i64,
) -> RuntimeResult<*const c_char> {
    if argv.is_null() {
        return Ok(core::ptr::null());
    }
    let i = checked_index(index, isize::MAX as usize)?;
    Ok(unsafe { argv.add(i).read() })
}

/// Copy `argv[index]` into a new string. A null `argv` or a null entry
/// yields `None`.
///
/// # Safety
///
/// A non-null `argv` must point to an array holding more than `index` entries,
/// each null or NUL-terminated.
pub unsafe fn argument_from_argv(
    argv: *const *const c_char,
    index: i64,
) -> RuntimeResult<Option<ManagedString>> {
    let entry = unsafe { raw_argument(argv, index) }?;
    tracing::debug!(index, present = !entry.is_null(), "argv");
    unsafe { ManagedString::from_host_ptr(entry) }
}

/// Copy the current process's argument at `index`, or `None` past the end.
pub fn argument(index: usize) -> RuntimeResult<Option<ManagedString>> {
    match std::env::args_os().nth(index) {
        Some(arg) => ManagedString::from_bytes(arg.as_encoded_bytes()).map(Some),
        None => Ok(None),
    }
}
