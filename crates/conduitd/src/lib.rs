//! Framed JSON command bridge.
//!
//! `conduitd` accepts JSON commands from a trusted local client over TCP and
//! runs each one through a registered handler. The interesting part is not
//! the handlers, which belong to whatever host embeds the server, but the
//! core that connects them to the socket:
//!
//! - a length-prefixed frame codec (4-byte big-endian length, 10 MiB cap);
//! - a name-to-handler [`CommandRegistry`] fixed before the server starts;
//! - a [`Dispatcher`] that special-cases `batch_execute` and stamps every
//!   response with its request `id`;
//! - an [`Executor`] handoff that runs every handler on a single owner
//!   context, so at most one handler executes at any time;
//! - a listener that serves one connection at a time, to completion.
//!
//! Embedders build a [`CommandRegistry`], create an [`OwnerContext`] on the
//! thread that owns their mutable state, and hand an [`OwnerHandle`] to
//! [`Server::new`]. The `conduitd` binary does the same with the built-in
//! commands only, using configuration loaded by [`conduit_config`].

mod bootstrap;
mod dispatch;
mod executor;
mod handlers;
mod health;
mod log_capture;
mod process;
mod server;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{
    BATCH_COMMAND, CommandHandler, CommandRegistry, CommandRequest, CommandResponse,
    DispatchError, Dispatcher, RegistryError,
};
pub use executor::{Executor, HandoffError, InlineExecutor, Job, OwnerContext, OwnerHandle};
pub use handlers::{ConsoleLogsHandler, GET_CONSOLE_LOGS};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use log_capture::{LogCapture, LogCaptureLayer, LogEntry, LogQuery};
pub use process::{LaunchError, ShutdownError, run_daemon};
pub use server::{Server, ServerHandle};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{FrameError, ListenerError};

#[cfg(test)]
mod tests;
