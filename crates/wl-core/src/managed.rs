//! Reference-counted strings shared with generated code.
//!
//! Every string handed to compiled wl code is a pointer to its payload, with
//! an 8-byte header in front of it:
//!
//! ```text
//! [-8: refcount: i32][-4: info: u32][0: payload ...][capacity: 0]
//! ```
//!
//! `refcount` counts owners *in addition to* the creator, so it starts at 0
//! and the release that finds it at 0 frees the allocation. `info` is the
//! word generated code treats as reserved: the runtime stores
//! `OWNED_FLAG | capacity` there for strings it allocates. A zero `info` marks
//! a foreign string (for example a literal emitted with a header by the
//! compiler); those are never freed, and their byte access is bounded only by
//! the caller, as for [`plain`] strings.
//!
//! Every header must either come from this runtime or have a zeroed `info`
//! word. A header whose `info` was left uninitialized (as a bare
//! `malloc` + `*rc = 0` would leave it) may be mistaken for an owned one.

use core::alloc::Layout;
use core::ffi::{CStr, c_char};
use core::fmt;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicI32, Ordering, fence};
use std::alloc::{alloc, alloc_zeroed, dealloc};

use crate::error::{RuntimeError, RuntimeResult};
use crate::plain::{self, checked_index};

/// Size of the header that precedes every payload.
pub const HEADER_SIZE: usize = 8;

const HEADER_ALIGN: usize = 8;

/// Set in `info` for strings allocated by this runtime.
const OWNED_FLAG: u32 = 1 << 31;

/// Largest payload capacity the header can describe.
pub const MAX_CAPACITY: usize = (OWNED_FLAG - 1) as usize;

#[repr(C)]
struct Header {
    refcount: AtomicI32,
    info: u32,
}

const _: () = assert!(size_of::<Header>() == HEADER_SIZE);

fn layout_for(capacity: usize) -> RuntimeResult<Layout> {
    let failed = RuntimeError::AllocationFailed {
        requested: capacity,
    };
    if capacity > MAX_CAPACITY {
        return Err(failed);
    }
    let size = capacity.checked_add(HEADER_SIZE + 1).ok_or(failed)?;
    Layout::from_size_align(size, HEADER_ALIGN).map_err(|_| failed)
}

/// Allocate a header plus `capacity + 1` payload bytes and return the payload
/// pointer. Unless `zeroed`, the payload is left uninitialized.
fn allocate_raw(capacity: usize, zeroed: bool) -> RuntimeResult<NonNull<u8>> {
    let layout = layout_for(capacity).inspect_err(|_| {
        tracing::error!(capacity, "string capacity exceeds the header limit");
    })?;
    let base = unsafe {
        if zeroed {
            alloc_zeroed(layout)
        } else {
            alloc(layout)
        }
    };
    let Some(base) = NonNull::new(base) else {
        tracing::error!(capacity, size = layout.size(), "string allocation failed");
        return Err(RuntimeError::AllocationFailed {
            requested: capacity,
        });
    };
    unsafe {
        base.cast::<Header>().write(Header {
            refcount: AtomicI32::new(0),
            info: OWNED_FLAG | capacity as u32,
        });
    }
    tracing::trace!(capacity, "allocated string");
    Ok(unsafe { base.add(HEADER_SIZE) })
}

/// # Safety
///
/// `ptr` must be a payload pointer preceded by an owned header.
unsafe fn header<'a>(ptr: NonNull<c_char>) -> &'a Header {
    unsafe { &*ptr.as_ptr().sub(HEADER_SIZE).cast::<Header>() }
}

/// Capacity of an owned string, or `None` for a foreign one.
///
/// Ownership is read from bit 31 of the `info` word alone.
///
/// # Safety
///
/// `ptr` must be a payload pointer preceded by an 8-byte header that was
/// either written by this runtime or has its `info` word (bytes `-4..0`)
/// zeroed. Any other `info` value can be misread as an owned capacity.
pub unsafe fn capacity_of(ptr: NonNull<c_char>) -> Option<usize> {
    let info = unsafe { ptr.as_ptr().sub(4).cast::<u32>().read_unaligned() };
    (info & OWNED_FLAG != 0).then_some((info & !OWNED_FLAG) as usize)
}

/// Current header refcount.
///
/// # Safety
///
/// `ptr` must be a payload pointer preceded by an 8-byte header.
pub unsafe fn refcount(ptr: NonNull<c_char>) -> i32 {
    match unsafe { capacity_of(ptr) } {
        Some(_) => unsafe { header(ptr) }.refcount.load(Ordering::Relaxed),
        None => unsafe { ptr.as_ptr().sub(HEADER_SIZE).cast::<i32>().read_unaligned() },
    }
}

/// Read the byte at `index`. Owned strings allow `0..=capacity`; foreign
/// strings only reject negative indices.
///
/// # Safety
///
/// `ptr` must be a live payload pointer preceded by an 8-byte header. For a
/// foreign string, `index` must lie inside its storage.
pub unsafe fn byte_at(ptr: NonNull<c_char>, index: i64) -> RuntimeResult<u8> {
    match unsafe { capacity_of(ptr) } {
        Some(capacity) => {
            let i = checked_index(index, capacity + 1)?;
            Ok(unsafe { ptr.cast::<u8>().add(i).read() })
        }
        None => unsafe { plain::byte_at(ptr.as_ptr(), index) },
    }
}

/// Write `value` at `index`. Owned strings allow `0..capacity`, plus a zero
/// written at `capacity` since that leaves the terminator intact; foreign
/// strings only reject negative indices.
///
/// # Safety
///
/// `ptr` must be a live, writable payload pointer preceded by an 8-byte
/// header, with no outstanding borrows of its bytes. For a foreign string,
/// `index` must lie inside its storage.
pub unsafe fn set_byte_at(ptr: NonNull<c_char>, index: i64, value: u8) -> RuntimeResult<()> {
    match unsafe { capacity_of(ptr) } {
        Some(capacity) => {
            let bound = if value == 0 { capacity + 1 } else { capacity };
            let i = checked_index(index, bound)?;
            unsafe { ptr.cast::<u8>().add(i).write(value) };
            Ok(())
        }
        None => unsafe { plain::set_byte_at(ptr.as_ptr(), index, value) },
    }
}

/// Register an additional owner. No-op for foreign strings.
///
/// # Safety
///
/// `ptr` must be a live payload pointer preceded by an 8-byte header.
pub unsafe fn retain(ptr: NonNull<c_char>) {
    if unsafe { capacity_of(ptr) }.is_none() {
        return;
    }
    let previous = unsafe { header(ptr) }.refcount.fetch_add(1, Ordering::Relaxed);
    tracing::trace!(refcount = previous + 1, "retained string");
}

/// Drop one owner; frees the allocation when no additional owner remains.
/// No-op for foreign strings.
///
/// # Safety
///
/// `ptr` must be a live payload pointer preceded by an 8-byte header, and the
/// caller must own the reference being released. `ptr` must not be used again
/// if this call frees it.
pub unsafe fn release(ptr: NonNull<c_char>) {
    let Some(capacity) = (unsafe { capacity_of(ptr) }) else {
        return;
    };
    let previous = unsafe { header(ptr) }.refcount.fetch_sub(1, Ordering::Release);
    if previous > 0 {
        tracing::trace!(refcount = previous - 1, "released string reference");
        return;
    }
    fence(Ordering::Acquire);
    let Ok(layout) = layout_for(capacity) else {
        return;
    };
    tracing::trace!(capacity, "freed string");
    unsafe { dealloc(ptr.cast::<u8>().as_ptr().sub(HEADER_SIZE), layout) };
}

/// Owning handle to one reference of a runtime string.
///
/// Dropping the handle releases its reference. [`into_raw`](Self::into_raw)
/// hands the reference to generated code instead.
pub struct ManagedString {
    ptr: NonNull<c_char>,
}

// The refcount is atomic and the handle is the only safe path to the bytes.
unsafe impl Send for ManagedString {}

impl ManagedString {
    /// A zero-filled string with room for `capacity` bytes.
    pub fn allocate(capacity: usize) -> RuntimeResult<Self> {
        let payload = allocate_raw(capacity, true)?;
        Ok(Self {
            ptr: payload.cast(),
        })
    }

    /// Copy `bytes` verbatim into a new string of exactly that capacity.
    pub fn from_bytes(bytes: &[u8]) -> RuntimeResult<Self> {
        let payload = allocate_raw(bytes.len(), false)?;
        unsafe {
            payload
                .as_ptr()
                .copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
            payload.as_ptr().add(bytes.len()).write(0);
        }
        Ok(Self {
            ptr: payload.cast(),
        })
    }

    pub fn from_c_str(s: &CStr) -> RuntimeResult<Self> {
        Self::from_bytes(s.to_bytes())
    }

    /// Copy a host C string. A null `ptr` yields `Ok(None)` without
    /// allocating.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a NUL-terminated byte sequence.
    pub unsafe fn from_host_ptr(ptr: *const c_char) -> RuntimeResult<Option<Self>> {
        if ptr.is_null() {
            return Ok(None);
        }
        Self::from_c_str(unsafe { CStr::from_ptr(ptr) }).map(Some)
    }

    /// Take over a reference previously given away by
    /// [`into_raw`](Self::into_raw) (or retained by generated code).
    ///
    /// # Safety
    ///
    /// `ptr` must be a live payload pointer preceded by an 8-byte header, and
    /// the caller must own the reference being transferred.
    pub unsafe fn from_raw(ptr: NonNull<c_char>) -> Self {
        Self { ptr }
    }

    /// Give the reference to the caller as a payload pointer.
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr;
        core::mem::forget(self);
        ptr.as_ptr()
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }

    /// Payload capacity, excluding the terminator.
    pub fn capacity(&self) -> usize {
        unsafe { capacity_of(self.ptr) }.unwrap_or_else(|| self.len())
    }

    /// Distance to the first NUL byte.
    pub fn len(&self) -> usize {
        self.as_c_str().count_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }

    pub fn refcount(&self) -> i32 {
        unsafe { refcount(self.ptr) }
    }

    pub fn byte_at(&self, index: usize) -> RuntimeResult<u8> {
        unsafe { byte_at(self.ptr, index_to_i64(index)) }
    }

    pub fn set_byte_at(&mut self, index: usize, value: u8) -> RuntimeResult<()> {
        unsafe { set_byte_at(self.ptr, index_to_i64(index), value) }
    }
}

fn index_to_i64(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

impl Drop for ManagedString {
    fn drop(&mut self) {
        unsafe { release(self.ptr) };
    }
}

impl fmt::Debug for ManagedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedString")
            .field("bytes", &self.as_bytes().escape_ascii().to_string())
            .field("capacity", &self.capacity())
            .field("refcount", &self.refcount())
            .finish()
    }
}

impl PartialEq<[u8]> for ManagedString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&str> for ManagedString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
