//! Behaviour of the runtime's C ABI as seen by generated code

use std::ffi::{CStr, CString, c_char, c_int};

use serial_test::serial;
use wl_runtime::{
    __wl_str_get, __wl_str_set, get_arg, remove_file, system_call, to_wl_str, wl_alloc_string,
    wl_clear_error, wl_getenv, wl_last_error, wl_str_refcount, wl_str_release,
};

unsafe fn read(s: *const c_char) -> Vec<u8> {
    unsafe { CStr::from_ptr(s) }.to_bytes_with_nul().to_vec()
}

/// Header refcount, read the way generated code would.
unsafe fn header_refcount(s: *const c_char) -> i32 {
    unsafe { s.sub(8).cast::<i32>().read() }
}

#[test]
fn test_to_wl_str_copies_host_string() {
    let host = c"from the host";
    unsafe {
        let s = to_wl_str(host.as_ptr());
        assert!(!s.is_null());
        assert_ne!(s.cast_const(), host.as_ptr());
        assert_eq!(read(s), host.to_bytes_with_nul());
        assert_eq!(header_refcount(s), 0);
        assert_eq!(wl_str_refcount(s), 0);
        wl_str_release(s);
    }
}

#[test]
fn test_to_wl_str_null() {
    assert!(unsafe { to_wl_str(std::ptr::null()) }.is_null());
}

#[test]
fn test_alloc_string_is_zeroed() {
    for size in [0, 1, 5, 100] {
        let s = wl_alloc_string(size);
        assert!(!s.is_null());
        unsafe {
            for i in 0..=size as c_int {
                assert_eq!(__wl_str_get(s, i), 0, "size {size}, index {i}");
            }
            assert_eq!(header_refcount(s), 0);
            wl_str_release(s);
        }
    }
}

#[test]
fn test_null_string_access() {
    unsafe {
        assert_eq!(__wl_str_get(std::ptr::null_mut(), 0), 0);
        assert_eq!(__wl_str_get(std::ptr::null_mut(), 1234), 0);
        __wl_str_set(std::ptr::null_mut(), 0, b'x' as c_int);
    }
}

#[test]
fn test_set_get_round_trip() {
    let s = wl_alloc_string(8);
    unsafe {
        for i in 0..8 {
            for v in [0u8, 1, 0x7f, 0x80, 0xff] {
                __wl_str_set(s, i, v as c_int);
                assert_eq!(__wl_str_get(s, i) as u8, v);
            }
        }
        wl_str_release(s);
    }
}

#[test]
fn test_hello_scenario() {
    let s = wl_alloc_string(5);
    unsafe {
        for (i, b) in b"hello".iter().enumerate() {
            __wl_str_set(s, i as c_int, *b as c_int);
        }
        assert_eq!(read(s), b"hello\0");
        assert_eq!(__wl_str_get(s, 5), 0);
        wl_str_release(s);
    }
}

#[test]
fn test_out_of_range_write_keeps_terminator() {
    wl_clear_error();
    let s = wl_alloc_string(3);
    unsafe {
        __wl_str_set(s, 3, b'!' as c_int);
        __wl_str_set(s, 100, b'!' as c_int);
        assert_ne!(wl_last_error(), 0);
        assert_eq!(read(s), b"\0");
        assert_eq!(__wl_str_get(s, 3), 0);
        wl_str_release(s);
    }
    wl_clear_error();
}

#[test]
#[serial]
fn test_getenv_unset() {
    unsafe { std::env::remove_var("DEFINITELY_UNSET_VAR_XYZ") };
    assert!(unsafe { wl_getenv(c"DEFINITELY_UNSET_VAR_XYZ".as_ptr()) }.is_null());
}

#[test]
#[serial]
fn test_getenv_set() {
    unsafe { std::env::set_var("WL_RUNTIME_TEST_VAR", "abc") };
    let s = unsafe { wl_getenv(c"WL_RUNTIME_TEST_VAR".as_ptr()) };
    unsafe { std::env::remove_var("WL_RUNTIME_TEST_VAR") };
    assert!(!s.is_null());
    unsafe {
        assert_eq!(read(s), b"abc\0");
        assert_eq!(header_refcount(s), 0);
        wl_str_release(s);
    }
}

#[test]
fn test_get_arg_copies_entry() {
    let args = [CString::new("wlprog").unwrap(), CString::new("input.wl").unwrap()];
    let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr().cast_mut()).collect();
    unsafe {
        let s = get_arg(argv.as_mut_ptr(), 1);
        assert!(!s.is_null());
        assert_ne!(s, argv[1]);
        assert_eq!(read(s), b"input.wl\0");
        wl_str_release(s);
    }
}

#[test]
fn test_remove_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("scratch.txt");
    let c_file = CString::new(file.as_os_str().as_encoded_bytes()).unwrap();

    assert_ne!(unsafe { remove_file(c_file.as_ptr().cast_mut()) }, 0);

    std::fs::write(&file, b"data").unwrap();
    assert_eq!(unsafe { remove_file(c_file.as_ptr().cast_mut()) }, 0);
    assert!(!file.exists());
}

#[cfg(unix)]
#[test]
fn test_system_call_status() {
    unsafe {
        assert_eq!(system_call(c"true".as_ptr().cast_mut()), 0);
        assert_ne!(system_call(c"false".as_ptr().cast_mut()), 0);
    }
}
