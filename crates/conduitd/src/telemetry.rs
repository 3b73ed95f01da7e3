//! Structured telemetry initialisation for the server.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use conduit_config::{Config, LogFormat};

use crate::log_capture::LogCapture;

static TELEMETRY_GUARD: OnceCell<LogCapture> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    capture: LogCapture,
}

impl TelemetryHandle {
    /// Ring buffer receiving every event that passes the log filter.
    #[must_use]
    pub fn log_capture(&self) -> &LogCapture {
        &self.capture
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: the first invocation installs the global
/// subscriber and its log capture buffer. Later invocations return a handle
/// to that same buffer and ignore their configuration.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter expression is invalid or
/// another global subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|capture| TelemetryHandle {
            capture: capture.clone(),
        })
}

fn install_subscriber(config: &Config) -> Result<LogCapture, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let capture = LogCapture::new(config.log_capture_capacity());

    let output = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr)
        // Colour only on interactive terminals.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());
    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format() {
        LogFormat::Json => output.json().flatten_event(true).boxed(),
        LogFormat::Compact => output.compact().boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(output)
        .with(capture.layer())
        .with(filter);

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(capture)
}
