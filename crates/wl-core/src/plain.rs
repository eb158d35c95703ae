//! Byte access on strings whose allocation size the runtime does not know.
//!
//! Plain C strings carry no header, and foreign header strings carry no
//! capacity, so nothing bounds an access from above: keeping `index` inside
//! the caller's buffer is a precondition, exactly as with `s[idx]` in C. Only
//! negative indices are rejected. The terminator plays no part in the bound,
//! so a zero-filled buffer can be filled byte by byte and an interior NUL can
//! be overwritten again.

use core::ffi::c_char;

use crate::error::{RuntimeError, RuntimeResult};

/// Validate `index` against the exclusive upper `bound`.
pub(crate) fn checked_index(index: i64, bound: usize) -> RuntimeResult<usize> {
    match usize::try_from(index) {
        Ok(i) if i < bound => Ok(i),
        _ => {
            tracing::warn!(index, bound, "byte index out of bounds");
            Err(RuntimeError::InvalidIndex { index, bound })
        }
    }
}

/// Read the byte at `index`.
///
/// # Safety
///
/// `ptr` must be non-null and `ptr + index` must lie inside the allocation
/// `ptr` points into.
pub unsafe fn byte_at(ptr: *const c_char, index: i64) -> RuntimeResult<u8> {
    let i = checked_index(index, isize::MAX as usize)?;
    Ok(unsafe { ptr.cast::<u8>().add(i).read() })
}

/// Overwrite the byte at `index`.
///
/// # Safety
///
/// `ptr` must be non-null and writable, and `ptr + index` must lie inside the
/// allocation `ptr` points into.
pub unsafe fn set_byte_at(ptr: *mut c_char, index: i64, value: u8) -> RuntimeResult<()> {
    let i = checked_index(index, isize::MAX as usize)?;
    unsafe { ptr.cast::<u8>().add(i).write(value) };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_index() {
        assert_eq!(checked_index(0, 1), Ok(0));
        assert_eq!(checked_index(4, 5), Ok(4));
        assert_eq!(
            checked_index(5, 5),
            Err(RuntimeError::InvalidIndex { index: 5, bound: 5 })
        );
        assert_eq!(
            checked_index(-1, 5),
            Err(RuntimeError::InvalidIndex { index: -1, bound: 5 })
        );
        assert!(checked_index(0, 0).is_err());
    }

    #[test]
    fn test_fill_zeroed_buffer() {
        let mut buf = [0u8; 6];
        let ptr = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            for (i, b) in b"hello".iter().enumerate() {
                assert_eq!(set_byte_at(ptr, i as i64, *b), Ok(()));
            }
            assert_eq!(byte_at(ptr, 4), Ok(b'o'));
            assert_eq!(byte_at(ptr, 5), Ok(0));
        }
        assert_eq!(&buf, b"hello\0");
    }

    #[test]
    fn test_round_trip_through_interior_nul() {
        let mut buf = *b"abc\0";
        let ptr = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            set_byte_at(ptr, 1, 0).unwrap();
            // Bytes past the interior NUL stay reachable.
            assert_eq!(byte_at(ptr, 2), Ok(b'c'));
            set_byte_at(ptr, 1, b'b').unwrap();
            assert_eq!(byte_at(ptr, 1), Ok(b'b'));
        }
        assert_eq!(&buf, b"abc\0");
    }

    #[test]
    fn test_negative_index_rejected() {
        let mut buf = *b"xy\0";
        let ptr = buf.as_mut_ptr().cast::<c_char>();
        unsafe {
            assert!(matches!(
                byte_at(ptr, -1),
                Err(RuntimeError::InvalidIndex { index: -1, .. })
            ));
            assert!(set_byte_at(ptr, -3, b'!').is_err());
        }
        assert_eq!(&buf, b"xy\0");
    }
}
