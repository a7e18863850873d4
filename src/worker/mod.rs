//! Cancellable background computation with a single-slot result mailbox.
//!
//! A [`ComputationWorker`] runs one search at a time on a dedicated thread.
//! The controlling thread starts a run, polls [`ComputationWorker::is_busy`],
//! may request cancellation, and finally drains the one result the run
//! produced:
//!
//! ```text
//! Idle --start--> Running --(found | failed | canceled)--> Completed --drain--> Idle
//! ```
//!
//! The run reports back over a one-capacity channel, so a result is never
//! exposed before the run has terminated and never written twice. Failures on
//! the background thread are only ever surfaced through the mailbox.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::{DiagnosticLog, Error, Result, SecureRandomSource};

/// Candidate generator trait.
pub mod generator;

pub use generator::CandidateGenerator;

/// Variant currently held by the result mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkResultKind {
    /// Nothing to drain: idle, or a run is still going.
    None,
    /// The run found a value.
    Success,
    /// The run failed.
    Error,
    /// The run observed a cancellation request.
    Canceled,
}

impl WorkResultKind {
    /// Lower-case variant name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Success => "success",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }
}

impl core::fmt::Display for WorkResultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one run, handed over when the mailbox is drained.
#[derive(Debug)]
pub enum WorkOutcome<T> {
    /// The value the search produced.
    Success(T),
    /// Why the run failed.
    Error(Error),
    /// The run stopped at a trial boundary; any partial candidate was discarded.
    Canceled,
}

impl<T> WorkOutcome<T> {
    /// The mailbox variant this outcome corresponds to.
    #[must_use]
    pub const fn kind(&self) -> WorkResultKind {
        match self {
            Self::Success(_) => WorkResultKind::Success,
            Self::Error(_) => WorkResultKind::Error,
            Self::Canceled => WorkResultKind::Canceled,
        }
    }
}

struct Completion<T> {
    outcome: WorkOutcome<T>,
    elapsed: Duration,
}

struct ActiveRun<T> {
    receiver: Receiver<Completion<T>>,
    handle: JoinHandle<()>,
    token: CancellationToken,
    started: Instant,
}

/// Drives a [`CandidateGenerator`] on a background thread.
///
/// Every run opens its own [`SecureRandomSource`] on the background thread and
/// closes it when the run ends, so the source is never shared.
///
/// Dropping the worker cancels an active run and waits for its current trial
/// to finish.
pub struct ComputationWorker<G: CandidateGenerator> {
    generator: Arc<G>,
    log: DiagnosticLog,
    active: Option<ActiveRun<G::Output>>,
    mailbox: Option<WorkOutcome<G::Output>>,
    last_run_time: Option<Duration>,
}

impl<G: CandidateGenerator> ComputationWorker<G> {
    /// Creates an idle worker that traces into [`DiagnosticLog::global`].
    pub fn new(generator: G) -> Self {
        Self::with_log(generator, DiagnosticLog::global().clone())
    }

    /// Creates an idle worker that traces into `log`.
    pub fn with_log(generator: G, log: DiagnosticLog) -> Self {
        Self {
            generator: Arc::new(generator),
            log,
            active: None,
            mailbox: None,
            last_run_time: None,
        }
    }

    /// Starts a search for a value of `target_bits` bits.
    ///
    /// Returns `false` without changing any state if a run is in progress or
    /// the previous result has not been drained yet.
    pub fn start_worker(&mut self, target_bits: u64) -> bool {
        self.poll();

        if self.active.is_some() {
            tracing::warn!("Start refused: a computation is already running");
            return false;
        }
        if let Some(outcome) = &self.mailbox {
            tracing::warn!(
                "Start refused: previous {} result has not been drained",
                outcome.kind()
            );
            return false;
        }

        let (sender, receiver) = mpsc::sync_channel(1);
        let token = CancellationToken::new();
        let generator = Arc::clone(&self.generator);
        let log = self.log.clone();
        let run_token = token.clone();

        let spawned = thread::Builder::new()
            .name("computation-worker".to_string())
            .spawn(move || {
                let started = Instant::now();
                let outcome = run_search(&*generator, target_bits, &run_token, &log);
                let elapsed = started.elapsed();

                tracing::debug!(
                    "Run for {target_bits} bits finished as {} after {elapsed:?}",
                    outcome.kind()
                );
                // The receiver only disappears if the worker was dropped.
                let _ = sender.send(Completion { outcome, elapsed });
            });

        match spawned {
            Ok(handle) => {
                tracing::info!("Started computation for {target_bits} bits");
                self.last_run_time = None;
                self.active = Some(ActiveRun {
                    receiver,
                    handle,
                    token,
                    started: Instant::now(),
                });
                true
            }
            Err(e) => {
                tracing::error!("Failed to spawn computation thread: {e}");
                false
            }
        }
    }

    /// `true` while a run is in progress.
    pub fn is_busy(&mut self) -> bool {
        self.poll();
        self.active.is_some()
    }

    /// Asks the active run to stop at its next trial boundary.
    ///
    /// Does nothing when no run is active.
    pub fn cancel_worker(&self) {
        if let Some(run) = &self.active {
            tracing::info!("Cancellation requested");
            run.token.cancel();
        }
    }

    /// Cancellation token of the active run, for cancelling from another thread.
    #[must_use]
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.active.as_ref().map(|run| run.token.clone())
    }

    /// Variant currently in the mailbox.
    pub fn result(&mut self) -> WorkResultKind {
        self.poll();
        self.mailbox
            .as_ref()
            .map_or(WorkResultKind::None, WorkOutcome::kind)
    }

    /// Wall time of the most recently completed run.
    ///
    /// `None` before the first run completes and while a new run is active.
    pub fn run_time(&mut self) -> Option<Duration> {
        self.poll();
        self.last_run_time
    }

    /// Blocks until the active run terminates and returns the mailbox variant.
    pub fn wait(&mut self) -> WorkResultKind {
        if let Some(run) = self.active.take() {
            let completion = run.receiver.recv().ok();
            self.complete(run, completion);
        }
        self.result()
    }

    /// Drains a success result and returns its value.
    ///
    /// # Errors
    /// [`Error::ContractViolation`] if the mailbox does not hold a success; the
    /// mailbox is left untouched in that case.
    pub fn remove_success_result(&mut self) -> Result<G::Output> {
        self.poll();
        match self.mailbox.take() {
            Some(WorkOutcome::Success(value)) => Ok(value),
            other => Err(self.restore(other, WorkResultKind::Success)),
        }
    }

    /// Drains an error result and returns its cause.
    ///
    /// # Errors
    /// [`Error::ContractViolation`] if the mailbox does not hold an error; the
    /// mailbox is left untouched in that case.
    pub fn remove_error_result(&mut self) -> Result<Error> {
        self.poll();
        match self.mailbox.take() {
            Some(WorkOutcome::Error(cause)) => Ok(cause),
            other => Err(self.restore(other, WorkResultKind::Error)),
        }
    }

    /// Drains whatever terminal outcome the mailbox holds.
    ///
    /// Returns `None` while idle or while a run is still going.
    pub fn take_outcome(&mut self) -> Option<WorkOutcome<G::Output>> {
        self.poll();
        self.mailbox.take()
    }

    fn restore(
        &mut self,
        outcome: Option<WorkOutcome<G::Output>>,
        expected: WorkResultKind,
    ) -> Error {
        let found = outcome
            .as_ref()
            .map_or(WorkResultKind::None, WorkOutcome::kind);
        self.mailbox = outcome;
        tracing::error!("Mailbox drained as {expected} but holds {found}");
        Error::ContractViolation {
            expected: expected.as_str(),
            found: found.as_str(),
        }
    }

    fn poll(&mut self) {
        let Some(run) = self.active.take() else {
            return;
        };
        match run.receiver.try_recv() {
            Ok(completion) => self.complete(run, Some(completion)),
            Err(TryRecvError::Disconnected) => self.complete(run, None),
            Err(TryRecvError::Empty) => self.active = Some(run),
        }
    }

    fn complete(&mut self, run: ActiveRun<G::Output>, completion: Option<Completion<G::Output>>) {
        let completion = completion.unwrap_or_else(|| Completion {
            outcome: WorkOutcome::Error(Error::generator("worker thread terminated unexpectedly")),
            elapsed: run.started.elapsed(),
        });
        if run.handle.join().is_err() {
            tracing::error!("Computation thread panicked");
        }
        self.last_run_time = Some(completion.elapsed);
        self.mailbox = Some(completion.outcome);
    }
}

impl<G: CandidateGenerator> Drop for ComputationWorker<G> {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.token.cancel();
            let _ = run.handle.join();
        }
    }
}

impl<G: CandidateGenerator> core::fmt::Debug for ComputationWorker<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComputationWorker")
            .field("running", &self.active.is_some())
            .field(
                "result",
                &self
                    .mailbox
                    .as_ref()
                    .map_or(WorkResultKind::None, WorkOutcome::kind),
            )
            .field("last_run_time", &self.last_run_time)
            .finish_non_exhaustive()
    }
}

/// Body of one run: trial loop with a cancellation check at every boundary.
fn run_search<G: CandidateGenerator>(
    generator: &G,
    target_bits: u64,
    token: &CancellationToken,
    log: &DiagnosticLog,
) -> WorkOutcome<G::Output> {
    let _scope = log.scope("ComputationWorker::run", &[&target_bits]);

    let searched = SecureRandomSource::scoped(|rng| {
        let mut trials: u64 = 0;
        loop {
            if token.is_cancelled() {
                trace(log, || format!("canceled after {trials} trials"));
                return Ok(None);
            }
            trials += 1;
            match generator.try_candidate(target_bits, rng)? {
                Some(value) => {
                    trace(log, || format!("found after {trials} trials"));
                    return Ok(Some(value));
                }
                None => trace(log, || format!("trial {trials} rejected")),
            }
        }
    });

    match searched {
        Ok(Some(value)) => WorkOutcome::Success(value),
        Ok(None) | Err(Error::Canceled) => WorkOutcome::Canceled,
        Err(e) => {
            trace(log, || format!("failed: {e}"));
            WorkOutcome::Error(e)
        }
    }
}

fn trace(log: &DiagnosticLog, text: impl FnOnce() -> String) {
    if !log.is_enabled() {
        return;
    }
    if let Err(e) = log.message(&text()) {
        tracing::warn!("Diagnostic log write failed: {e}");
    }
}
