//! Channel-backed owner context.
//!
//! [`OwnerContext`] owns the receiving end of a run queue and executes jobs
//! on the thread that pumps it. Any number of [`OwnerHandle`] clones submit
//! jobs from other threads and block on a one-shot reply channel until the
//! job has run. Because a single receiver drains the queue, at most one job
//! runs at a time no matter how many handles exist.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};
use tracing::debug;

use crate::dispatch::CommandResponse;

use super::{EXECUTOR_TARGET, Executor, HandoffError, Job, run_guarded};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

type Reply = Result<CommandResponse, HandoffError>;

struct Envelope {
    job: Job,
    reply: Sender<Reply>,
}

/// Thread currently pumping the owner context, if any.
#[derive(Debug, Default, Clone)]
struct OwnerThread(Arc<Mutex<Option<ThreadId>>>);

impl OwnerThread {
    fn claim(&self) -> OwnerClaim<'_> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        OwnerClaim(self)
    }

    fn is_current(&self) -> bool {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }
}

struct OwnerClaim<'a>(&'a OwnerThread);

impl Drop for OwnerClaim<'_> {
    fn drop(&mut self) {
        self.0.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Serialised execution context that runs submitted jobs.
///
/// The pumping methods take `&mut self`, so only one thread can drain the
/// queue at a time.
pub struct OwnerContext {
    queue: Receiver<Envelope>,
    owner: OwnerThread,
}

impl OwnerContext {
    /// Creates a context and the first handle used to submit work to it.
    ///
    /// `timeout` bounds how long a submitting thread waits for its job to
    /// finish. `None` waits indefinitely.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> (Self, OwnerHandle) {
        let (sender, queue) = unbounded();
        let owner = OwnerThread::default();
        let handle = OwnerHandle {
            queue: sender,
            owner: owner.clone(),
            timeout,
        };
        (Self { queue, owner }, handle)
    }

    /// Runs jobs until every [`OwnerHandle`] has been dropped.
    pub fn run(&mut self) {
        let _claim = self.owner.claim();
        for envelope in self.queue.iter() {
            execute(envelope);
        }
        debug!(target: EXECUTOR_TARGET, "owner context drained");
    }

    /// Runs jobs until `stop` is set or every handle has been dropped.
    ///
    /// The flag is checked between jobs and at least every few milliseconds
    /// while the queue is idle.
    pub fn run_until(&mut self, stop: &AtomicBool) {
        let _claim = self.owner.claim();
        while !stop.load(Ordering::SeqCst) {
            match self.queue.recv_timeout(POLL_INTERVAL) {
                Ok(envelope) => execute(envelope),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(target: EXECUTOR_TARGET, "owner context stopped");
    }

    /// Runs every job already queued without waiting for more.
    ///
    /// Hosts that own an update loop call this once per tick. Returns the
    /// number of jobs executed.
    pub fn run_pending(&mut self) -> usize {
        let _claim = self.owner.claim();
        let mut executed = 0;
        loop {
            match self.queue.try_recv() {
                Ok(envelope) => {
                    execute(envelope);
                    executed += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return executed,
            }
        }
    }

    /// Number of jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

fn execute(envelope: Envelope) {
    let Envelope { job, reply } = envelope;
    let outcome = run_guarded(job);
    if reply.send(outcome).is_err() {
        debug!(
            target: EXECUTOR_TARGET,
            "discarding result for a caller that stopped waiting"
        );
    }
}

/// Cloneable submitter for an [`OwnerContext`].
#[derive(Clone)]
pub struct OwnerHandle {
    queue: Sender<Envelope>,
    owner: OwnerThread,
    timeout: Option<Duration>,
}

impl OwnerHandle {
    /// Wait budget applied to each submission.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for OwnerHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OwnerHandle")
            .field("queued", &self.queue.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Executor for OwnerHandle {
    fn submit(&self, job: Job) -> Result<CommandResponse, HandoffError> {
        // A job that submits more work from the owner thread would otherwise
        // wait on itself.
        if self.owner.is_current() {
            return run_guarded(job);
        }

        let (reply, outcome) = bounded(1);
        self.queue
            .send(Envelope { job, reply })
            .map_err(|_| HandoffError::OwnerUnavailable)?;

        match self.timeout {
            Some(timeout) => match outcome.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(HandoffError::TimedOut { timeout }),
                Err(RecvTimeoutError::Disconnected) => Err(HandoffError::OwnerUnavailable),
            },
            None => outcome
                .recv()
                .unwrap_or(Err(HandoffError::OwnerUnavailable)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn context() -> (OwnerContext, OwnerHandle) {
        OwnerContext::new(None)
    }

    fn wait_for_pending(context: &OwnerContext, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while context.pending() < expected {
            assert!(Instant::now() < deadline, "jobs were never queued");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[rstest]
    fn jobs_run_on_the_owner_thread(context: (OwnerContext, OwnerHandle)) {
        let (mut context, handle) = context;
        let owner = thread::current().id();
        let submitter = thread::spawn(move || {
            handle
                .submit(Box::new(move || {
                    CommandResponse::success(json!(thread::current().id() == owner))
                }))
                .expect("job should run")
        });

        context.run();
        let response = submitter.join().expect("submitter thread");
        assert_eq!(response.data(), Some(&json!(true)));
    }

    #[rstest]
    fn run_pending_drains_queued_jobs(context: (OwnerContext, OwnerHandle)) {
        let (mut context, handle) = context;
        let submitters: Vec<_> = (0..3)
            .map(|index| {
                let handle = handle.clone();
                thread::spawn(move || {
                    handle
                        .submit(Box::new(move || CommandResponse::success(json!(index))))
                        .expect("job should run")
                })
            })
            .collect();

        wait_for_pending(&context, 3);
        assert_eq!(context.run_pending(), 3);
        assert_eq!(context.run_pending(), 0);

        let mut values: Vec<_> = submitters
            .into_iter()
            .map(|submitter| submitter.join().expect("submitter thread"))
            .filter_map(|response| response.data().and_then(serde_json::Value::as_i64))
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[rstest]
    fn panicking_job_reports_error(context: (OwnerContext, OwnerHandle)) {
        let (mut context, handle) = context;
        let submitter = thread::spawn(move || {
            handle.submit(Box::new(|| -> CommandResponse { panic!("handler exploded") }))
        });

        context.run();
        let error = submitter
            .join()
            .expect("submitter thread")
            .expect_err("panic should surface as an error");
        assert!(matches!(
            error,
            HandoffError::HandlerPanicked { ref message } if message == "handler exploded"
        ));
    }

    #[rstest]
    fn submit_times_out_when_owner_is_idle() {
        let (context, handle) = OwnerContext::new(Some(Duration::from_millis(50)));
        let started = Instant::now();
        let error = handle
            .submit(Box::new(|| CommandResponse::success_message("late")))
            .expect_err("nobody pumps the context");

        assert!(matches!(error, HandoffError::TimedOut { .. }));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(context.pending(), 1);
    }

    #[rstest]
    fn late_result_is_discarded() {
        let (mut context, handle) = OwnerContext::new(Some(Duration::from_millis(20)));
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let error = handle
            .submit(Box::new(move || {
                flag.store(true, Ordering::SeqCst);
                CommandResponse::success_message("late")
            }))
            .expect_err("nobody pumps the context");
        assert!(matches!(error, HandoffError::TimedOut { .. }));

        assert_eq!(context.run_pending(), 1);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[rstest]
    fn submit_fails_once_context_is_dropped(context: (OwnerContext, OwnerHandle)) {
        let (context, handle) = context;
        drop(context);
        let error = handle
            .submit(Box::new(|| CommandResponse::success_message("never")))
            .expect_err("context is gone");
        assert!(matches!(error, HandoffError::OwnerUnavailable));
    }

    #[rstest]
    fn nested_submit_from_owner_thread_runs_inline(context: (OwnerContext, OwnerHandle)) {
        let (mut context, handle) = context;
        let inner = handle.clone();
        let submitter = thread::spawn(move || {
            handle
                .submit(Box::new(move || {
                    inner
                        .submit(Box::new(|| CommandResponse::success_message("inner")))
                        .unwrap_or_else(|error| CommandResponse::error(error.to_string()))
                }))
                .expect("outer job should run")
        });

        wait_for_pending(&context, 1);
        assert_eq!(context.run_pending(), 1);
        let response = submitter.join().expect("submitter thread");
        assert_eq!(response.data(), Some(&json!({ "message": "inner" })));
    }

    #[rstest]
    fn run_until_stops_when_flag_is_set(context: (OwnerContext, OwnerHandle)) {
        let (mut context, _handle) = context;
        let stop = Arc::new(AtomicBool::new(false));
        let setter = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                stop.store(true, Ordering::SeqCst);
            })
        };

        context.run_until(&stop);
        setter.join().expect("setter thread");
        assert!(stop.load(Ordering::SeqCst));
    }

    #[rstest]
    fn at_most_one_job_runs_at_a_time(context: (OwnerContext, OwnerHandle)) {
        let (mut context, handle) = context;
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    handle
                        .submit(Box::new(move || {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(10));
                            active.fetch_sub(1, Ordering::SeqCst);
                            CommandResponse::success_message("done")
                        }))
                        .expect("job should run")
                })
            })
            .collect();
        drop(handle);

        context.run();
        for submitter in submitters {
            submitter.join().expect("submitter thread");
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
