//! Log output for the runtime.
//!
//! Runtime code only emits `tracing` events. This module installs a stderr
//! subscriber for programs that ask for one; a subscriber already installed by
//! the host program is left in place.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install the global subscriber described by `config`.
///
/// Only the first call has an effect. Returns whether the runtime's
/// subscriber is the active one.
pub fn init(config: &RuntimeConfig) -> bool {
    *INSTALLED.get_or_init(|| {
        let (filter, rejected) = match EnvFilter::try_new(&config.log_filter) {
            Ok(filter) => (filter, None),
            Err(error) => (EnvFilter::new("warn"), Some(error)),
        };

        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(config.log_ansi)
            .try_init()
            .is_ok();

        if let Some(error) = rejected {
            tracing::warn!(%error, filter = %config.log_filter, "ignoring invalid log filter");
        }
        tracing::debug!(installed, platform = ?config.platform, "runtime logging initialized");
        installed
    })
}
