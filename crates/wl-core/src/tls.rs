//! Per-thread runtime state.
//!
//! The C ABI cannot return `Result`, so failing exports record an
//! [`ErrorCode`] here and generated code polls it through `wl_last_error`.
//! All per-thread state lives in a single [`ThreadState`].

use core::cell::Cell;

use crate::error::{ErrorCode, RuntimeError};

pub(crate) struct ThreadState {
    pub(crate) last_error: Cell<ErrorCode>,
}

impl ThreadState {
    const fn new() -> Self {
        Self {
            last_error: Cell::new(ErrorCode::None),
        }
    }
}

thread_local! {
    static THREAD_STATE: ThreadState = const { ThreadState::new() };
}

/// Record `error` as the calling thread's last error.
pub fn record_error(error: &RuntimeError) {
    THREAD_STATE.with(|ts| ts.last_error.set(error.code()));
}

/// The last error recorded on this thread. Not cleared by reading.
pub fn last_error() -> ErrorCode {
    THREAD_STATE.with(|ts| ts.last_error.get())
}

pub fn clear_error() {
    THREAD_STATE.with(|ts| ts.last_error.set(ErrorCode::None));
}

/// Unwrap `result` for a C caller: on error, record it and return `fallback`.
pub fn or_record<T>(result: Result<T, RuntimeError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            record_error(&error);
            fallback
        }
    }
}
