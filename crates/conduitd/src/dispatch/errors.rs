//! Error types for request dispatch failures.
//!
//! The display text of each [`DispatchError`] is exactly the `error` string
//! that clients see in a `success: false` response.

use thiserror::Error;

use crate::executor::HandoffError;

/// Errors surfaced while parsing and dispatching a request.
///
/// None of these end the connection; each becomes an error response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Frame payload was not a JSON object.
    #[error("Invalid json")]
    InvalidJson {
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A batch request carried no `params` object.
    #[error("Missing params")]
    MissingParams,

    /// A batch request's params lacked a `commands` array.
    #[error("Missing 'commands' array in params")]
    MissingCommands,

    /// A batch item was not an object with a string `command`.
    #[error("Invalid command object")]
    InvalidCommandObject,

    /// No handler is registered under the requested name.
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    /// The owner context could not run the handler.
    #[error(transparent)]
    Handoff(#[from] HandoffError),

    /// The encoded response does not fit in a frame.
    #[error("Response too large: {size} bytes exceeds {max} byte limit")]
    ResponseTooLarge { size: usize, max: usize },
}

impl DispatchError {
    /// Creates an invalid JSON error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::InvalidJson {
            source: Some(source),
        }
    }

    /// Creates an invalid JSON error for a payload that parsed but is not an
    /// object.
    pub fn not_an_object() -> Self {
        Self::InvalidJson { source: None }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }
}

/// Errors raised while building a command registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is handled by the dispatcher itself.
    #[error("command name '{name}' is reserved")]
    Reserved { name: String },

    /// Handlers must be registered under a non-empty name.
    #[error("command name must not be empty")]
    EmptyName,
}
