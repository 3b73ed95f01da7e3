//! Unit tests for the bootstrap utilities.

use std::sync::Arc;

use rstest::rstest;
use tracing::Level;

use crate::{BootstrapError, GET_CONSOLE_LOGS, LogQuery, bootstrap_with};

use conduit_config::{DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT};

use super::support::{
    DefaultConfigLoader, FailingConfigLoader, HealthEvent, RecordingHealthReporter,
    TestConfigLoader,
};

#[rstest]
fn bootstrap_reports_start_and_success() {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let daemon = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(daemon.config().listen_host(), "127.0.0.1");
    assert_eq!(
        reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[rstest]
fn bootstrap_resolves_defaults_without_overrides() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let daemon =
        bootstrap_with(&DefaultConfigLoader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(daemon.config().listen_host(), DEFAULT_LISTEN_HOST);
    assert_eq!(daemon.config().listen_port(), DEFAULT_LISTEN_PORT);
    assert_eq!(daemon.config().handoff_timeout(), None);
    assert!(reporter.events().contains(&HealthEvent::BootstrapSucceeded));
}

#[rstest]
fn bootstrap_reports_configuration_failures() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error =
        bootstrap_with(&FailingConfigLoader, reporter.clone()).expect_err("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    let events = reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, HealthEvent::BootstrapFailed(message)
                if message.starts_with("failed to load configuration"))),
        "missing failure event: {events:?}"
    );
    assert!(!events.contains(&HealthEvent::BootstrapSucceeded));
}

#[rstest]
fn builtin_registry_exposes_console_logs() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let daemon =
        bootstrap_with(&TestConfigLoader::new(), reporter).expect("bootstrap should succeed");

    let registry = daemon.builtin_registry().expect("registry should build");

    assert_eq!(registry.names(), vec![GET_CONSOLE_LOGS]);
}

#[rstest]
fn repeated_bootstrap_shares_the_log_buffer() {
    let first = bootstrap_with(
        &TestConfigLoader::new(),
        Arc::new(RecordingHealthReporter::default()),
    )
    .expect("first bootstrap");
    let second = bootstrap_with(
        &TestConfigLoader::new(),
        Arc::new(RecordingHealthReporter::default()),
    )
    .expect("second bootstrap");

    first
        .telemetry()
        .log_capture()
        .record(Level::INFO, "conduitd::tests::shared", String::from("shared"));

    let entries = second.telemetry().log_capture().entries(&LogQuery {
        count: 10,
        min_level: None,
        category: Some(String::from("conduitd::tests::shared")),
    });
    assert!(
        entries.iter().any(|entry| entry.message == "shared"),
        "entry missing from shared buffer"
    );
}
