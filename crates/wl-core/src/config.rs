//! Process-wide runtime configuration.
//!
//! Resolved once from the environment on first use and immutable afterwards.

use std::sync::OnceLock;

/// Filter directive for the runtime's log output (`tracing` `EnvFilter` syntax).
pub const LOG_ENV: &str = "WL_RUNTIME_LOG";
/// Whether log output uses ANSI colors.
pub const LOG_ANSI_ENV: &str = "WL_RUNTIME_LOG_ANSI";

const DEFAULT_LOG_FILTER: &str = "warn";

/// Operating system family the runtime was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Other,
}

impl HostPlatform {
    pub const fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Other
        }
    }

    pub const fn is_windows(self) -> bool {
        matches!(self, HostPlatform::Windows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub platform: HostPlatform,
    pub log_filter: String,
    pub log_ansi: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            platform: HostPlatform::current(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_ansi: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let log_filter = lookup(LOG_ENV)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.log_filter);
        let log_ansi = lookup(LOG_ANSI_ENV)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.log_ansi);

        Self {
            platform: defaults.platform,
            log_filter,
            log_ansi,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// The process configuration, loaded from the environment on first call.
pub fn runtime_config() -> &'static RuntimeConfig {
    CONFIG.get_or_init(RuntimeConfig::from_env)
}
