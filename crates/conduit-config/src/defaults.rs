use crate::logging::LogFormat;

/// Default TCP port the daemon listens on.
pub const DEFAULT_LISTEN_PORT: u16 = 55555;

/// Default interface the daemon binds. The protocol is unauthenticated, so the
/// listener stays on loopback unless explicitly configured otherwise.
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Number of log entries retained for `get_console_logs`.
pub const DEFAULT_LOG_CAPTURE_CAPACITY: usize = 500;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Owned listen host value used by serde defaults.
#[must_use]
pub fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_owned()
}

/// Default listen port used by serde defaults.
#[must_use]
pub const fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default capacity of the log capture ring buffer.
#[must_use]
pub const fn default_log_capture_capacity() -> usize {
    DEFAULT_LOG_CAPTURE_CAPACITY
}
