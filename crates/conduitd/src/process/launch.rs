//! Supervises server launch sequencing and runtime orchestration.
//!
//! The calling thread becomes the owner context: it runs every command
//! handler for the lifetime of the process. The listener serves clients on
//! its own thread, and a watcher thread waits for the shutdown signal, stops
//! the listener, and then releases the owner loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::executor::OwnerContext;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::server::ServerHandle;
use crate::transport::ListenerError;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the server runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the server using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] if bootstrap, listener startup or signal handling
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the server with injected collaborators until shutdown is signalled.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal + 'static,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    info!(target: PROCESS_TARGET, "starting server runtime");
    let daemon = bootstrap_with(&loader, reporter)?;
    let registry = daemon.builtin_registry()?;
    let config = daemon.config();
    let (mut owner, handle) = OwnerContext::new(config.handoff_timeout());
    let running = daemon
        .server(registry, Arc::new(handle))
        .start(config.listen_host(), config.listen_port())?;

    let stop = Arc::new(AtomicBool::new(false));
    let watcher = {
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name(String::from("conduit-shutdown"))
            .spawn(move || watch_for_shutdown(&shutdown, running, &stop))
            .map_err(|source| LaunchError::Watcher { source })?
    };

    owner.run_until(&stop);

    let (signal, listener) = watcher.join().map_err(|_| LaunchError::WatcherPanic)?;
    signal?;
    listener?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

/// Waits for the signal, then stops the listener before releasing the owner
/// loop, so a command still in flight can finish on the owner context.
fn watch_for_shutdown<S: ShutdownSignal>(
    shutdown: &S,
    running: ServerHandle,
    stop: &AtomicBool,
) -> (Result<(), ShutdownError>, Result<(), ListenerError>) {
    let signal = shutdown.wait();
    info!(target: PROCESS_TARGET, "stopping command listener");
    running.shutdown();
    let listener = running.join();
    stop.store(true, Ordering::SeqCst);
    (signal, listener)
}
