//! Executor that runs jobs on the submitting thread.

use std::sync::{Mutex, PoisonError};

use crate::dispatch::CommandResponse;

use super::{Executor, HandoffError, Job, run_guarded};

/// Runs each job on the caller's thread, one at a time.
///
/// Jobs must not submit back into the same executor; the nested call would
/// wait on the gate held by its parent.
#[derive(Debug, Default)]
pub struct InlineExecutor {
    gate: Mutex<()>,
}

impl InlineExecutor {
    /// Builds an idle executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for InlineExecutor {
    fn submit(&self, job: Job) -> Result<CommandResponse, HandoffError> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        run_guarded(job)
    }
}
