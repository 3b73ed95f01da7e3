//! Foreground run loop: bootstrap, serve, and shut down on a signal.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use rstest::{fixture, rstest};
use serde_json::json;

use crate::GET_CONSOLE_LOGS;
use crate::health::HealthReporter;
use crate::process::LaunchError;
use crate::process::launch::{LaunchPlan, run_daemon_with};
use crate::process::shutdown::{ShutdownError, ShutdownSignal};

use super::support::{
    FailingConfigLoader, FrameClient, HealthEvent, RecordingHealthReporter, TestConfigLoader,
};

/// Shutdown signal released by the test.
#[derive(Debug, Clone)]
struct TestShutdownSignal {
    trigger: Sender<()>,
    released: Receiver<()>,
}

impl TestShutdownSignal {
    fn new() -> Self {
        let (trigger, released) = bounded(1);
        Self { trigger, released }
    }

    fn trigger(&self) {
        // A full channel means the signal already fired.
        let _ = self.trigger.try_send(());
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        // Both ends live in `self`, so the channel never disconnects here.
        let _ = self.released.recv();
        Ok(())
    }
}

struct Launched {
    reporter: Arc<RecordingHealthReporter>,
    shutdown: TestShutdownSignal,
    handle: thread::JoinHandle<Result<(), LaunchError>>,
}

impl Launched {
    fn finish(self) -> Result<(), LaunchError> {
        self.shutdown.trigger();
        self.handle.join().expect("run loop thread panicked")
    }
}

fn launch(loader: TestConfigLoader) -> Launched {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let shutdown = TestShutdownSignal::new();
    let plan = LaunchPlan {
        loader,
        reporter: reporter.clone() as Arc<dyn HealthReporter>,
        shutdown: shutdown.clone(),
    };
    let handle = thread::Builder::new()
        .name(String::from("conduit-owner"))
        .spawn(move || run_daemon_with(plan))
        .expect("spawn run loop");
    Launched {
        reporter,
        shutdown,
        handle,
    }
}

#[fixture]
fn launched() -> Launched {
    launch(TestConfigLoader::new())
}

#[rstest]
fn serves_builtin_commands_until_shutdown(launched: Launched) {
    let address = launched.reporter.wait_for_listening();
    let mut client = FrameClient::connect(address);

    let response = client.request(&json!({
        "command": GET_CONSOLE_LOGS,
        "id": "logs",
        "params": {"count": 5}
    }));

    assert_eq!(response["success"], json!(true));
    assert_eq!(response["id"], json!("logs"));
    assert!(response["data"].is_array(), "unexpected data: {response}");
    drop(client);

    launched.finish().expect("run loop should exit cleanly");
}

#[rstest]
fn shutdown_closes_a_connected_client(launched: Launched) {
    let address = launched.reporter.wait_for_listening();
    let mut client = FrameClient::connect(address);
    client.request(&json!({"command": GET_CONSOLE_LOGS}));

    let reporter = Arc::clone(&launched.reporter);
    launched.finish().expect("run loop should exit cleanly");

    assert!(client.is_closed(), "client should see the connection close");
    let events = reporter.events();
    assert!(events.contains(&HealthEvent::BootstrapSucceeded));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::ClientDisconnected(_)))
    );
}

#[rstest]
fn bootstrap_failure_stops_the_launch() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let plan = LaunchPlan {
        loader: FailingConfigLoader,
        reporter: reporter.clone() as Arc<dyn HealthReporter>,
        shutdown: TestShutdownSignal::new(),
    };

    let error = run_daemon_with(plan).expect_err("launch should fail");

    assert!(matches!(error, LaunchError::Bootstrap { .. }));
    assert!(
        !reporter
            .events()
            .iter()
            .any(|event| matches!(event, HealthEvent::ServerListening(_)))
    );
}

#[rstest]
fn occupied_port_is_a_listener_failure() {
    let occupied = TcpListener::bind("127.0.0.1:0").expect("bind placeholder");
    let port = occupied.local_addr().expect("placeholder address").port();
    let plan = LaunchPlan {
        loader: TestConfigLoader::new().with_port(port),
        reporter: Arc::new(RecordingHealthReporter::default()) as Arc<dyn HealthReporter>,
        shutdown: TestShutdownSignal::new(),
    };

    let error = run_daemon_with(plan).expect_err("launch should fail");

    assert!(
        matches!(error, LaunchError::Listener { .. }),
        "unexpected error: {error}"
    );
}
