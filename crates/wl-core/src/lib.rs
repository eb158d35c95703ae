//! Core of the wl runtime.
//!
//! Safe Rust API behind the C-ABI libraries that wl programs and the
//! bootstrap compiler link against:
//! - [`ManagedString`]: reference-counted, NUL-terminated strings with the
//!   8-byte header generated code expects
//! - [`plain`]: terminator-bounded byte access on header-less C strings
//! - [`host`]: environment, argument vector, `remove` and `system`
//! - [`config`] and [`logging`]: process-wide settings and log output
//! - a per-thread last-error slot for C callers

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod managed;
pub mod plain;
mod tls;

pub use config::{HostPlatform, RuntimeConfig, runtime_config};
pub use error::{ErrorCode, RuntimeError, RuntimeResult};
pub use managed::{HEADER_SIZE, MAX_CAPACITY, ManagedString};
pub use tls::{clear_error, last_error, or_record, record_error};
