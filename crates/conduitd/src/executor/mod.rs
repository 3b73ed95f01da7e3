//! Serialised execution of command handlers.
//!
//! Every handler invocation is funnelled through an [`Executor`]. The
//! production implementation is the channel-backed [`OwnerContext`], which
//! runs queued jobs one at a time on whichever thread pumps it while the
//! submitting thread blocks for the result. [`InlineExecutor`] runs jobs on
//! the caller's thread behind a mutex and is intended for embedding and
//! tests.

mod context;
mod errors;
mod inline;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::dispatch::CommandResponse;

pub use self::context::{OwnerContext, OwnerHandle};
pub use self::errors::HandoffError;
pub use self::inline::InlineExecutor;

pub(crate) const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() -> CommandResponse + Send + 'static>;

/// Runs jobs with at most one job executing at any time.
pub trait Executor: Send + Sync {
    /// Runs `job` and blocks until it has produced a response.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError`] when the job panicked, the executor is no
    /// longer running, or the wait exceeded the configured timeout.
    fn submit(&self, job: Job) -> Result<CommandResponse, HandoffError>;
}

/// Runs a job, converting a panic into [`HandoffError::HandlerPanicked`].
pub(crate) fn run_guarded(job: Job) -> Result<CommandResponse, HandoffError> {
    panic::catch_unwind(AssertUnwindSafe(job)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(
            target: EXECUTOR_TARGET,
            panic = %message,
            "command handler panicked"
        );
        HandoffError::HandlerPanicked { message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
