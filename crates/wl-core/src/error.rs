//! Error types for runtime operations

use derive_more::{Display, Error};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The allocator could not satisfy a request, or the request exceeds
    /// [`MAX_CAPACITY`](crate::managed::MAX_CAPACITY).
    #[display("allocation of {requested} payload bytes failed")]
    AllocationFailed { requested: usize },

    /// A byte index fell outside `0..bound`.
    #[display("byte index {index} is out of bounds (valid range 0..{bound})")]
    InvalidIndex { index: i64, bound: usize },

    #[display("string size {size} is negative")]
    NegativeSize { size: i64 },
}

impl RuntimeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RuntimeError::AllocationFailed { .. } => ErrorCode::AllocationFailed,
            RuntimeError::InvalidIndex { .. } => ErrorCode::InvalidIndex,
            RuntimeError::NegativeSize { .. } => ErrorCode::NegativeSize,
        }
    }
}

/// Numeric error code reported through the C ABI (`wl_last_error`).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    None = 0,
    AllocationFailed = 1,
    InvalidIndex = 2,
    NegativeSize = 3,
}

impl ErrorCode {
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}
