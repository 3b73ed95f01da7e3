//! Request routing to registered handlers.
//!
//! The [`Dispatcher`] resolves a request's command name, special-cases
//! `batch_execute`, and runs handlers through the configured [`Executor`]
//! so they never execute on the network thread. Every response leaves with
//! the request's `id`.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::executor::Executor;

use super::batch::execute_batch;
use super::errors::DispatchError;
use super::registry::CommandRegistry;
use super::request::CommandRequest;
use super::response::CommandResponse;

/// Target for dispatch logging.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Reserved command name handled by the dispatcher itself.
pub const BATCH_COMMAND: &str = "batch_execute";

/// Routes requests to handlers via the executor.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    executor: Arc<dyn Executor>,
}

impl Dispatcher {
    /// Creates a dispatcher over a fixed registry.
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>, executor: Arc<dyn Executor>) -> Self {
        Self { registry, executor }
    }

    /// The registry this dispatcher reads from.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatches a request and returns its response with `id` stamped.
    ///
    /// Never fails: unknown commands, batch errors and handler faults all
    /// become `success: false` responses.
    pub fn dispatch(&self, request: CommandRequest) -> CommandResponse {
        let (command, id, params) = request.into_parts();
        debug!(
            target: DISPATCH_TARGET,
            command = %command,
            id = %id,
            "dispatching request"
        );

        let mut response = if command == BATCH_COMMAND {
            self.dispatch_batch(params)
        } else {
            self.invoke(&command, params.unwrap_or_default())
        };
        response.set_id(id);
        response
    }

    fn dispatch_batch(&self, params: Option<Map<String, Value>>) -> CommandResponse {
        match execute_batch(params, |command, params| self.invoke(command, params)) {
            Ok(response) => response,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected batch request");
                CommandResponse::from(&error)
            }
        }
    }

    /// Looks up and runs a single command. Nested `batch_execute` items land
    /// here too and resolve as unknown.
    fn invoke(&self, command: &str, params: Map<String, Value>) -> CommandResponse {
        match self.try_invoke(command, params) {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    command = %command,
                    %error,
                    "command failed"
                );
                CommandResponse::from(&error)
            }
        }
    }

    fn try_invoke(
        &self,
        command: &str,
        params: Map<String, Value>,
    ) -> Result<CommandResponse, DispatchError> {
        let handler = self
            .registry
            .lookup(command)
            .ok_or_else(|| DispatchError::unknown_command(command))?;
        let response = self
            .executor
            .submit(Box::new(move || handler.execute(&params)))?;
        Ok(response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
