//! Test double for [`HealthReporter`] that records structured events for
//! assertions.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use conduit_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// Listener bound.
    ServerListening(SocketAddr),
    /// Session started.
    ClientConnected(SocketAddr),
    /// Session ended.
    ClientDisconnected(SocketAddr),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }

    /// Polls until an event matching `predicate` has been recorded.
    pub fn wait_for<F>(&self, predicate: F) -> Option<HealthEvent>
    where
        F: Fn(&HealthEvent) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(event) = self.events().into_iter().find(|event| predicate(event)) {
                return Some(event);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    /// Polls until the listener has reported its bound address.
    pub fn wait_for_listening(&self) -> SocketAddr {
        match self.wait_for(|event| matches!(event, HealthEvent::ServerListening(_))) {
            Some(HealthEvent::ServerListening(address)) => address,
            other => panic!("server never reported listening: {other:?}"),
        }
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, address: SocketAddr) {
        self.record(HealthEvent::ServerListening(address));
    }

    fn client_connected(&self, peer: SocketAddr) {
        self.record(HealthEvent::ClientConnected(peer));
    }

    fn client_disconnected(&self, peer: SocketAddr) {
        self.record(HealthEvent::ClientDisconnected(peer));
    }
}
