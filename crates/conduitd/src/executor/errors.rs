//! Error types for the executor handoff.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while handing a job to the owner context.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// The job panicked while running.
    #[error("command handler panicked: {message}")]
    HandlerPanicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The owner context has stopped, or dropped the job without running it.
    #[error("owner context is not running")]
    OwnerUnavailable,

    /// The owner context did not finish the job in time.
    #[error("timed out after {} ms waiting for the owner context", .timeout.as_millis())]
    TimedOut {
        /// Configured wait budget.
        timeout: Duration,
    },
}
