//! Domain availability checking
//!
//! Orchestrates concurrent checking of many domains in bounded batches:
//! within a batch every domain is probed concurrently, batches run strictly
//! one after another, so peak concurrency never exceeds the configured batch
//! size regardless of how many domains were submitted.
//!
//! A run is cancellable at any point: cancellation stops new batches from
//! starting, aborts every registered in-flight probe, discards unsettled
//! results, and leaves the pending-probe registry drained. Retrying after a
//! cancel is simply calling [`AvailabilityChecker::run`] again; every run
//! gets a fresh [`CheckSession`].

pub mod checker;
pub mod probe;
pub mod session;

pub use checker::SingleDomainChecker;
pub use session::CheckSession;

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tokio::sync::broadcast;

use crate::config::AvailabilityConfig;
use crate::error::{Error, Result};
use crate::types::{CheckResult, CheckSummary, Domain, Event, RunState};

/// Batched, cancellable availability checker
///
/// Only one run may be in progress at a time; a second [`run`] call while
/// `Running` fails with [`Error::CheckInProgress`]. Progress is reported as
/// [`Event`]s on the broadcast channel.
///
/// [`run`]: AvailabilityChecker::run
pub struct AvailabilityChecker {
    config: AvailabilityConfig,
    checker: Arc<SingleDomainChecker>,
    event_tx: broadcast::Sender<Event>,
    state: Mutex<RunState>,
    current: Mutex<Option<Arc<CheckSession>>>,
}

impl AvailabilityChecker {
    /// Create a checker with its own event channel.
    pub fn new(config: AvailabilityConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(1024);
        Self::with_events(config, event_tx)
    }

    /// Create a checker emitting on an existing event channel.
    pub fn with_events(config: AvailabilityConfig, event_tx: broadcast::Sender<Event>) -> Self {
        let checker = Arc::new(SingleDomainChecker::new(&config));
        Self {
            config,
            checker,
            event_tx,
            state: Mutex::new(RunState::Idle),
            current: Mutex::new(None),
        }
    }

    /// Replace the single-domain checker (tests inject scripted strategies
    /// or a mock-server target resolver).
    pub fn with_checker(mut self, checker: SingleDomainChecker) -> Self {
        self.checker = Arc::new(checker);
        self
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current run state; `Idle` between runs.
    pub fn state(&self) -> RunState {
        *self.lock_state()
    }

    /// Whether a run is currently in progress
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Cancel the active run, if any.
    ///
    /// Cooperative: in-flight probes are aborted via the session token and
    /// their results discarded; the run itself settles shortly after.
    pub fn cancel(&self) {
        if let Some(session) = self.lock_current().as_ref() {
            tracing::info!("Cancelling availability run");
            session.cancel();
        }
    }

    /// Check all `domains`, reporting progress via events.
    ///
    /// Returns the aggregate summary; on a completed run
    /// `accessible + blocked == total`. A cancelled run reports
    /// `cancelled: true` with only the domains that settled before the flag
    /// was raised.
    pub async fn run(&self, domains: Vec<Domain>) -> Result<CheckSummary> {
        let session = self.begin(domains.len())?;
        // Teardown must happen even if this future is dropped mid-run (e.g.
        // the caller wrapped it in a timeout); otherwise the state machine
        // would be stuck in Running forever.
        let _teardown = RunTeardown { runner: self };

        let _ = self.event_tx.send(Event::CheckStarted {
            total: session.total(),
        });

        for batch in domains.chunks(self.config.batch_size.max(1)) {
            if session.is_cancelled() {
                break;
            }
            // All domains in the batch settle before the next batch starts.
            join_all(batch.iter().map(|domain| self.check_one(domain, &session))).await;
        }

        Ok(self.finish(&session))
    }

    /// Transition `Idle -> Running`, creating the fresh per-run session.
    fn begin(&self, total: usize) -> Result<Arc<CheckSession>> {
        let mut state = self.lock_state();
        if *state == RunState::Running {
            return Err(Error::CheckInProgress);
        }
        *state = RunState::Running;
        drop(state);

        let session = Arc::new(CheckSession::new(total));
        *self.lock_current() = Some(Arc::clone(&session));
        tracing::info!(total, "Starting availability run");
        Ok(session)
    }

    /// Emit the terminal event and report the final summary.
    ///
    /// Session release and the return to `Idle` are the [`RunTeardown`]
    /// guard's job, so they also happen when `run` is dropped mid-flight.
    fn finish(&self, session: &CheckSession) -> CheckSummary {
        let summary = session.summary();
        if summary.cancelled {
            let _ = self.event_tx.send(Event::CheckCancelled);
        } else {
            let _ = self.event_tx.send(Event::CheckComplete {
                accessible: summary.accessible,
                blocked: summary.blocked,
            });
        }

        tracing::info!(
            checked = summary.checked,
            accessible = summary.accessible,
            blocked = summary.blocked,
            cancelled = summary.cancelled,
            "Availability run finished"
        );

        summary
    }

    async fn check_one(&self, domain: &Domain, session: &CheckSession) -> CheckResult {
        if session.is_cancelled() {
            return CheckResult {
                domain: domain.clone(),
                accessible: false,
                error: None,
                cancelled: true,
            };
        }

        let result = self.checker.check(domain, session).await;
        if result.cancelled {
            // Discarded: not counted, no progress event.
            return result;
        }

        let snapshot = session.record(result.accessible);
        let _ = self.event_tx.send(Event::DomainChecked {
            domain: domain.clone(),
            accessible: result.accessible,
            checked: snapshot.checked,
            total: session.total(),
            accessible_count: snapshot.accessible,
            blocked_count: snapshot.blocked,
        });

        // Deliberate throttle between settled results so subscribers are not
        // flooded and probes do not burst.
        tokio::time::sleep(self.config.settle_delay).await;
        result
    }

    /// Release the current session and settle back to `Idle`. Called from
    /// the teardown guard only.
    fn teardown(&self) {
        // Cancel so any probe still holding the session's token stops
        // promptly; harmless on a normally finished run. Completed and
        // Cancelled are transient -- both return to Idle here.
        if let Some(session) = self.lock_current().take() {
            session.cancel();
        }
        *self.lock_state() = RunState::Idle;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Arc<CheckSession>>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resets the runner to `Idle` when the `run` future ends, including when it
/// is dropped before completion.
struct RunTeardown<'a> {
    runner: &'a AvailabilityChecker,
}

impl Drop for RunTeardown<'_> {
    fn drop(&mut self) {
        self.runner.teardown();
    }
}

#[cfg(test)]
mod tests;
