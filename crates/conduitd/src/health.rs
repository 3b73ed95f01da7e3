//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use conduit_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener is bound and accepting.
    fn server_listening(&self, address: SocketAddr);

    /// Invoked when a client connection starts being served.
    fn client_connected(&self, peer: SocketAddr);

    /// Invoked when a client's session has ended, for any reason.
    fn client_disconnected(&self, peer: SocketAddr);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_listening(&self, address: SocketAddr) {
        (**self).server_listening(address);
    }

    fn client_connected(&self, peer: SocketAddr) {
        (**self).client_connected(peer);
    }

    fn client_disconnected(&self, peer: SocketAddr) {
        (**self).client_disconnected(peer);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            host = %config.listen_host(),
            port = config.listen_port(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            handoff_timeout_ms = ?config.handoff_timeout().map(|timeout| timeout.as_millis()),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn server_listening(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_listening",
            address = %address,
            "command server listening"
        );
    }

    fn client_connected(&self, peer: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_connected",
            peer = %peer,
            "client connected"
        );
    }

    fn client_disconnected(&self, peer: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_disconnected",
            peer = %peer,
            "client disconnected"
        );
    }
}
