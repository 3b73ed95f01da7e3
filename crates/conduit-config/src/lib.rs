//! Shared configuration for the conduit command bridge.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `CONDUIT_*` environment variables, and
//! finally command-line flags. The daemon only needs a handful of settings:
//! where to listen, how to log, and how long a caller may wait on the owner
//! context before giving up.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT, DEFAULT_LOG_CAPTURE_CAPACITY, DEFAULT_LOG_FILTER,
    default_listen_host, default_listen_port, default_log_capture_capacity, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CONDUIT")]
pub struct Config {
    /// Interface the command listener binds.
    #[serde(default = "default_listen_host")]
    #[ortho_config(default = default_listen_host())]
    pub listen_host: String,
    /// TCP port the command listener binds.
    #[serde(default = "default_listen_port")]
    #[ortho_config(default = default_listen_port())]
    pub listen_port: u16,
    /// `tracing` filter expression applied to daemon telemetry.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound, in milliseconds, on how long a connection waits for the
    /// owner context to finish a command. Absent means wait indefinitely.
    #[serde(default)]
    pub handoff_timeout_ms: Option<u64>,
    /// Number of recent log entries retained for `get_console_logs`.
    #[serde(default = "default_log_capture_capacity")]
    #[ortho_config(default = default_log_capture_capacity())]
    pub log_capture_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            handoff_timeout_ms: None,
            log_capture_capacity: default_log_capture_capacity(),
        }
    }
}

impl Config {
    /// Interface the listener binds.
    #[must_use]
    pub fn listen_host(&self) -> &str {
        &self.listen_host
    }

    /// Port the listener binds.
    #[must_use]
    pub const fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Bound on a caller blocked in the owner-context handoff.
    ///
    /// `None` means the caller waits until the command completes.
    #[must_use]
    pub fn handoff_timeout(&self) -> Option<Duration> {
        self.handoff_timeout_ms.map(Duration::from_millis)
    }

    /// Capacity of the log capture ring buffer.
    #[must_use]
    pub const fn log_capture_capacity(&self) -> usize {
        self.log_capture_capacity
    }
}
