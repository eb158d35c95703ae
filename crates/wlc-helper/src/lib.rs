//! Host helpers for the bootstrap wl compiler.
//!
//! The first-generation compiler works on plain C strings with no runtime
//! header, so these exports differ from `wl-runtime` in two ways:
//! `get_arg` hands back the `argv` entry itself, and byte access has no
//! recorded capacity to check against. Keeping `idx` inside the buffer is the
//! caller's job; only negative indices are rejected.
//!
//! Failures are reported the same way as in the runtime: a neutral return
//! value plus an error code readable through `wl_last_error`.

use core::ffi::{CStr, c_char, c_int};

use wl_core::{host, or_record, plain};

/// Returns 1 when built for Windows, 0 otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn is_windows() -> c_int {
    host::is_windows_host() as c_int
}

/// Delete `path` via the C library `remove`; returns the raw status. A null
/// `path` returns -1.
///
/// # Safety
///
/// A non-null `path` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn remove_file(path: *mut c_char) -> c_int {
    if path.is_null() {
        return -1;
    }
    host::remove_file(unsafe { CStr::from_ptr(path) })
}

/// Return `argv[idx]` as is. A null `argv` or negative `idx` yields null.
///
/// # Safety
///
/// A non-null `argv` must point to an array holding more than `idx` entries.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_arg(argv: *mut *mut c_char, idx: c_int) -> *mut c_char {
    let entry = or_record(
        unsafe { host::raw_argument(argv.cast_const().cast(), idx.into()) },
        core::ptr::null(),
    );
    entry.cast_mut()
}

/// Run `cmd` through the C library `system`, verbatim and unescaped, and
/// return the raw status.
///
/// # Safety
///
/// A non-null `cmd` must point to a NUL-terminated byte sequence.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn system_call(cmd: *mut c_char) -> c_int {
    let command = (!cmd.is_null()).then(|| unsafe { CStr::from_ptr(cmd) });
    host::run_shell_command(command)
}

/// Write the low byte of `val` at `idx`. A null `s` is a no-op and a negative
/// `idx` records `InvalidIndex`.
///
/// # Safety
///
/// A non-null `s` must point to a writable buffer holding more than `idx`
/// bytes. The terminator does not bound the write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wl_str_set(s: *mut c_char, idx: c_int, val: c_int) {
    if s.is_null() {
        return;
    }
    or_record(unsafe { plain::set_byte_at(s, idx.into(), val as u8) }, ());
}

/// Read the byte at `idx`. A null `s` reads as 0; a negative `idx` reads as 0
/// and records `InvalidIndex`.
///
/// # Safety
///
/// A non-null `s` must point to a buffer holding more than `idx` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __wl_str_get(s: *mut c_char, idx: c_int) -> c_char {
    if s.is_null() {
        return 0;
    }
    let byte = or_record(unsafe { plain::byte_at(s, idx.into()) }, 0);
    tracing::trace!(idx, byte, "plain byte read");
    byte as c_char
}

#[unsafe(no_mangle)]
pub extern "C" fn wl_last_error() -> c_int {
    wl_core::last_error().as_raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn wl_clear_error() {
    wl_core::clear_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wl_core::ErrorCode;

    #[test]
    fn test_get_arg_returns_entry_itself() {
        let mut argv = [c"wlc".as_ptr().cast_mut(), c"main.wl".as_ptr().cast_mut()];
        unsafe {
            assert_eq!(get_arg(argv.as_mut_ptr(), 1), argv[1]);
            assert!(get_arg(core::ptr::null_mut(), 0).is_null());
        }
    }

    #[test]
    fn test_get_arg_negative_index() {
        wl_clear_error();
        let mut argv = [c"wlc".as_ptr().cast_mut()];
        assert!(unsafe { get_arg(argv.as_mut_ptr(), -2) }.is_null());
        assert_eq!(wl_last_error(), ErrorCode::InvalidIndex.as_raw());
        wl_clear_error();
    }

    #[test]
    fn test_fill_zeroed_buffer() {
        wl_clear_error();
        let mut buf = [0u8; 6];
        let s = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            for (i, b) in b"hello".iter().enumerate() {
                __wl_str_set(s, i as c_int, *b as c_int);
            }
            assert_eq!(__wl_str_get(s, 4), b'o' as c_char);
            assert_eq!(__wl_str_get(s, 5), 0);
        }
        assert_eq!(wl_last_error(), 0);
        assert_eq!(&buf, b"hello\0");
    }

    #[test]
    fn test_round_trip_through_interior_nul() {
        wl_clear_error();
        let mut buf = *b"abc\0";
        let s = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            __wl_str_set(s, 1, 0);
            assert_eq!(__wl_str_get(s, 2), b'c' as c_char);
            __wl_str_set(s, 1, b'b' as c_int);
        }
        assert_eq!(wl_last_error(), 0);
        assert_eq!(&buf, b"abc\0");
    }

    #[test]
    fn test_negative_index_records_error() {
        wl_clear_error();
        let mut buf = *b"wl\0";
        let s = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            __wl_str_set(s, -1, b'!' as c_int);
            assert_eq!(wl_last_error(), ErrorCode::InvalidIndex.as_raw());
            wl_clear_error();
            assert_eq!(__wl_str_get(s, -1), 0);
            assert_eq!(wl_last_error(), ErrorCode::InvalidIndex.as_raw());
        }
        wl_clear_error();
        assert_eq!(&buf, b"wl\0");
    }

    #[test]
    fn test_null_strings() {
        unsafe {
            assert_eq!(__wl_str_get(core::ptr::null_mut(), 5), 0);
            __wl_str_set(core::ptr::null_mut(), 5, 1);
            assert_eq!(remove_file(core::ptr::null_mut()), -1);
        }
    }

    #[test]
    fn test_is_windows() {
        assert_eq!(is_windows(), cfg!(windows) as c_int);
    }
}
