//! Server assembly: registry, executor and listener.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::dispatch::{CommandRegistry, Dispatcher, SessionHandler};
use crate::executor::Executor;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// A command server over a fixed registry.
///
/// Handlers run through the supplied [`Executor`]; the listener serves one
/// connection at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::thread;
/// use std::time::Duration;
///
/// use conduitd::{CommandRegistry, CommandResponse, OwnerContext, Server};
/// use serde_json::{Map, Value};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry = CommandRegistry::new();
/// registry.register("ping", |_params: &Map<String, Value>| {
///     CommandResponse::success_message("pong")
/// })?;
///
/// let (mut owner, handle) = OwnerContext::new(None);
/// let running = Server::new(registry, Arc::new(handle)).start("127.0.0.1", 55555)?;
///
/// // Serve for a minute, then stop the listener and release the owner loop.
/// let stop = Arc::new(AtomicBool::new(false));
/// let watcher = {
///     let stop = Arc::clone(&stop);
///     thread::spawn(move || {
///         thread::sleep(Duration::from_secs(60));
///         running.shutdown();
///         let joined = running.join();
///         stop.store(true, Ordering::SeqCst);
///         joined
///     })
/// };
///
/// // Handlers run here, on the thread that owns the shared state.
/// owner.run_until(&stop);
/// watcher.join().map_err(|_| "watcher thread panicked")??;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    /// Builds a server that dispatches into `registry` via `executor`.
    #[must_use]
    pub fn new(registry: CommandRegistry, executor: Arc<dyn Executor>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(Arc::new(registry), executor)),
            reporter: Arc::new(StructuredHealthReporter::new()),
        }
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The dispatcher shared by every session.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Binds `host:port` and starts serving on a background thread.
    ///
    /// Port `0` binds an ephemeral port; see [`ServerHandle::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] if the address cannot be resolved or bound,
    /// or the listener thread cannot be spawned.
    pub fn start(&self, host: &str, port: u16) -> Result<ServerHandle, ListenerError> {
        let listener = SocketListener::bind(host, port)?;
        let address = listener.local_addr();
        let handler = Arc::new(SessionHandler::new(
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.reporter),
        ));
        let listener = listener.start(handler)?;
        self.reporter.server_listening(address);
        Ok(ServerHandle { listener })
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Handle to a running server. Dropping it stops the server without waiting.
pub struct ServerHandle {
    listener: ListenerHandle,
}

impl ServerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Stops accepting connections and closes the connection being served.
    ///
    /// A command already running on the owner context still completes, but
    /// its response is not delivered.
    pub fn shutdown(&self) {
        self.listener.shutdown();
    }

    /// Waits for the listener thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the listener thread panicked.
    pub fn join(self) -> Result<(), ListenerError> {
        self.listener.join()
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ServerHandle")
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}
