//! Handler abstraction consumed by the dispatcher.

use serde_json::{Map, Value};

use super::response::CommandResponse;

/// A named unit of command logic.
///
/// Handlers run on the owner context, never on the network thread. They
/// report failures through `success: false` responses; a panic is caught at
/// the executor boundary and turned into an error response.
pub trait CommandHandler: Send + Sync {
    /// Executes the command with the request's `params` object.
    fn execute(&self, params: &Map<String, Value>) -> CommandResponse;
}

impl<F> CommandHandler for F
where
    F: Fn(&Map<String, Value>) -> CommandResponse + Send + Sync,
{
    fn execute(&self, params: &Map<String, Value>) -> CommandResponse {
        self(params)
    }
}
