//! wl runtime library.
//!
//! Provides the native functions called by code generated by `wlc`:
//! - Setup (`wl_runtime_init`)
//! - String creation (`to_wl_str`, `wl_alloc_string`)
//! - Byte access (`__wl_str_get`, `__wl_str_set`)
//! - Reference counting (`wl_str_retain`, `wl_str_release`, `wl_str_refcount`)
//! - Host access (`wl_getenv`, `get_arg`, `remove_file`, `system_call`, `is_windows`)
//! - Error reporting (`wl_last_error`, `wl_clear_error`)
//!
//! Strings cross the boundary as payload pointers with the 8-byte header
//! described in [`wl_core::managed`]. A failing call returns a null pointer,
//! a zero byte or does nothing, and records an error code that
//! `wl_last_error` reports.

use core::ffi::{c_char, c_int, c_longlong};
use core::ptr::NonNull;

use wl_core::{ManagedString, RuntimeError, RuntimeResult, host, managed, or_record};

fn into_c(result: RuntimeResult<Option<ManagedString>>) -> *mut c_char {
    or_record(result, None).map_or(core::ptr::null_mut(), ManagedString::into_raw)
}

// =============================================================================
// Initialization
// =============================================================================

/// Load the runtime configuration and install the stderr log subscriber.
///
/// Optional: without it the runtime works the same but logs nothing.
///
/// Signature: `() -> ()`
#[unsafe(no_mangle)]
pub extern "C" fn wl_runtime_init() {
    wl_core::logging::init(wl_core::runtime_config());
}

// =============================================================================
// String creation
// =============================================================================

/// Copy a host C string into a new wl string with refcount 0.
///
/// Returns null for a null input (no error) or when allocation fails
/// (`AllocationFailed` recorded).
///
/// Signature: `(c_str: ptr) -> ptr`
///
/// # Safety
///
/// A non-null `c_str` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn to_wl_str(c_str: *const c_char) -> *mut c_char {
    into_c(unsafe { ManagedString::from_host_ptr(c_str) })
}

/// Allocate a zero-filled wl string with room for `size` bytes plus the
/// terminator.
///
/// Capacities are limited to `2^31 - 1` bytes (`wl_core::MAX_CAPACITY`), the
/// most the header's reserved word can describe. A larger `size` returns null
/// and records `AllocationFailed`, as does an exhausted allocator. A negative
/// `size` returns null and records `NegativeSize`.
///
/// Signature: `(size: i64) -> ptr`
#[unsafe(no_mangle)]
pub extern "C" fn wl_alloc_string(size: c_longlong) -> *mut c_char {
    into_c(allocate(size).map(Some))
}

fn allocate(size: i64) -> RuntimeResult<ManagedString> {
    if size < 0 {
        tracing::warn!(size, "negative string size");
        return Err(RuntimeError::NegativeSize { size });
    }
    let capacity = usize::try_from(size).map_err(|_| RuntimeError::AllocationFailed {
        requested: usize::MAX,
    })?;
    ManagedString::allocate(capacity)
}

// =============================================================================
// Byte access
// =============================================================================

/// Write the low byte of `val` at `idx`.
///
/// A null `s` is a no-op. An index outside `0..capacity` leaves the string
/// untouched and records `InvalidIndex`, except that writing 0 at `capacity`
/// is accepted since it leaves the terminator as it was.
///
/// Signature: `(s: ptr, idx: i32, val: i32) -> ()`
///
/// # Safety
///
/// A non-null `s` must be a live wl string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wl_str_set(s: *mut c_char, idx: c_int, val: c_int) {
    let Some(ptr) = NonNull::new(s) else {
        return;
    };
    or_record(unsafe { managed::set_byte_at(ptr, idx.into(), val as u8) }, ());
}

/// Read the byte at `idx`; the terminator at `capacity` is readable.
///
/// A null `s` reads as 0. An out-of-range index reads as 0 and records
/// `InvalidIndex`.
///
/// Signature: `(s: ptr, idx: i32) -> i8`
///
/// # Safety
///
/// A non-null `s` must be a live wl string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wl_str_get(s: *mut c_char, idx: c_int) -> c_char {
    let Some(ptr) = NonNull::new(s) else {
        return 0;
    };
    or_record(unsafe { managed::byte_at(ptr, idx.into()) }, 0) as c_char
}

// =============================================================================
// Reference counting
// =============================================================================

/// Register an additional owner of `s`. Null and foreign strings are ignored.
///
/// Signature: `(s: ptr) -> ()`
///
/// # Safety
///
/// A non-null `s` must be a live wl string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wl_str_retain(s: *mut c_char) {
    if let Some(ptr) = NonNull::new(s) {
        unsafe { managed::retain(ptr) };
    }
}

/// Drop one owner of `s`, freeing it when the refcount is already 0.
/// Null and foreign strings are ignored.
///
/// Signature: `(s: ptr) -> ()`
///
/// # Safety
///
/// A non-null `s` must be a live wl string whose reference the caller owns.
/// `s` must not be used after the release that frees it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wl_str_release(s: *mut c_char) {
    if let Some(ptr) = NonNull::new(s) {
        unsafe { managed::release(ptr) };
    }
}

/// Current header refcount of `s` (0 for null).
///
/// Signature: `(s: ptr) -> i32`
///
/// # Safety
///
/// A non-null `s` must be a live wl string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wl_str_refcount(s: *const c_char) -> c_int {
    match NonNull::new(s.cast_mut()) {
        Some(ptr) => unsafe { managed::refcount(ptr) },
        None => 0,
    }
}

// =============================================================================
// Host access
// =============================================================================

/// Returns 1 when built for Windows, 0 otherwise.
///
/// Signature: `() -> i32`
#[unsafe(no_mangle)]
pub extern "C" fn is_windows() -> c_int {
    host::is_windows_host() as c_int
}

/// Copy the environment variable `name` into a new wl string.
///
/// Returns null when `name` is null or the variable is unset.
///
/// Signature: `(name: ptr) -> ptr`
///
/// # Safety
///
/// A non-null `name` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wl_getenv(name: *const c_char) -> *mut c_char {
    if name.is_null() {
        return core::ptr::null_mut();
    }
    into_c(host::environment_variable(unsafe { core::ffi::CStr::from_ptr(name) }))
}

/// Copy `argv[idx]` into a new wl string.
///
/// Returns null for a null `argv` or entry. A negative `idx` returns null and
/// records `InvalidIndex`.
///
/// Signature: `(argv: ptr, idx: i32) -> ptr`
///
/// # Safety
///
/// A non-null `argv` must point to the process argument vector (or any array
/// of NUL-terminated strings) holding more than `idx` entries.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_arg(argv: *mut *mut c_char, idx: c_int) -> *mut c_char {
    into_c(unsafe { host::argument_from_argv(argv.cast_const().cast(), idx.into()) })
}

/// Delete the file at `path` via the C library `remove`.
///
/// Returns the host's raw status: 0 on success, non-zero on failure. A null
/// `path` returns -1 without touching the filesystem.
///
/// Signature: `(path: ptr) -> i32`
///
/// # Safety
///
/// A non-null `path` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn remove_file(path: *mut c_char) -> c_int {
    if path.is_null() {
        return -1;
    }
    host::remove_file(unsafe { core::ffi::CStr::from_ptr(path) })
}

/// Run `cmd` through the C library `system` and return its raw status.
///
/// The command is passed to the shell verbatim, without escaping; callers
/// must not build it from untrusted input. A null `cmd` asks whether a shell
/// is available.
///
/// Signature: `(cmd: ptr) -> i32`
///
/// # Safety
///
/// A non-null `cmd` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn system_call(cmd: *mut c_char) -> c_int {
    let command = (!cmd.is_null()).then(|| unsafe { core::ffi::CStr::from_ptr(cmd) });
    host::run_shell_command(command)
}

// =============================================================================
// Error reporting
// =============================================================================

/// Code of the last error recorded on this thread (0 if none). Reading does
/// not clear it.
///
/// Signature: `() -> i32`
#[unsafe(no_mangle)]
pub extern "C" fn wl_last_error() -> c_int {
    wl_core::last_error().as_raw()
}

/// Reset this thread's last error to 0.
///
/// Signature: `() -> ()`
#[unsafe(no_mangle)]
pub extern "C" fn wl_clear_error() {
    wl_core::clear_error();
}

// =============================================================================
// Tests
// =============================================================================
