use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AvailabilityConfig;
use crate::error::{Error, ProbeError};
use crate::types::{Domain, Event, RunState};

use super::probe::{ProbeStrategy, ProbeTarget};
use super::{AvailabilityChecker, SingleDomainChecker};

/// Strategy that answers from a fixed accessibility script and tracks
/// concurrency so batch bounds can be asserted.
struct FakeProbe {
    accessible: bool,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeProbe {
    fn accessible() -> Box<Self> {
        Self::with_delay(true, Duration::from_millis(5))
    }

    fn blocked() -> Box<Self> {
        Self::with_delay(false, Duration::from_millis(5))
    }

    fn with_delay(accessible: bool, delay: Duration) -> Box<Self> {
        Box::new(Self {
            accessible,
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl ProbeStrategy for FakeProbe {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(200)
    }

    async fn probe(
        &self,
        _target: &ProbeTarget,
        cancel: &CancellationToken,
    ) -> Result<(), ProbeError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {
                if self.accessible {
                    Ok(())
                } else {
                    Err(ProbeError::Failed("unreachable".into()))
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

fn fast_config() -> AvailabilityConfig {
    AvailabilityConfig {
        settle_delay: Duration::from_millis(1),
        attempt_guard: Duration::from_millis(100),
        ..Default::default()
    }
}

fn runner_with(strategies: Vec<Box<dyn ProbeStrategy>>) -> AvailabilityChecker {
    let config = fast_config();
    let checker = SingleDomainChecker::new(&config).with_strategies(strategies);
    AvailabilityChecker::new(config).with_checker(checker)
}

fn domains(names: &[&str]) -> Vec<Domain> {
    names.iter().map(|n| Domain::parse(n).unwrap()).collect()
}

#[tokio::test]
async fn completed_run_counts_add_up() {
    let runner = runner_with(vec![FakeProbe::accessible()]);
    let summary = runner
        .run(domains(&["a.com", "b.com", "c.com"]))
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.checked, 3);
    assert_eq!(summary.accessible + summary.blocked, summary.total);
    assert!(!summary.cancelled);
    assert_eq!(runner.state(), RunState::Idle);
}

#[tokio::test]
async fn blocked_domains_are_counted_not_errored() {
    let runner = runner_with(vec![FakeProbe::blocked()]);
    let summary = runner.run(domains(&["a.com", "b.com"])).await.unwrap();
    assert_eq!(summary.blocked, 2);
    assert_eq!(summary.accessible, 0);
}

#[tokio::test]
async fn progress_events_cover_every_domain() {
    let runner = runner_with(vec![FakeProbe::accessible()]);
    let mut events = runner.subscribe();

    let summary = runner.run(domains(&["a.com", "b.com"])).await.unwrap();
    assert_eq!(summary.accessible, 2);

    let mut checked_seen = Vec::new();
    let mut complete = None;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::DomainChecked { checked, total, .. } => {
                assert_eq!(total, 2);
                checked_seen.push(checked);
            }
            Event::CheckComplete {
                accessible,
                blocked,
            } => complete = Some((accessible, blocked)),
            Event::CheckStarted { total } => assert_eq!(total, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    checked_seen.sort_unstable();
    assert_eq!(checked_seen, vec![1, 2]);
    assert_eq!(complete, Some((2, 0)));
}

#[tokio::test]
async fn concurrency_is_bounded_by_batch_size() {
    let probe = FakeProbe::with_delay(true, Duration::from_millis(30));
    let max_in_flight = Arc::clone(&probe.max_in_flight);

    let config = AvailabilityConfig {
        batch_size: 2,
        settle_delay: Duration::from_millis(1),
        ..Default::default()
    };
    let checker = SingleDomainChecker::new(&config).with_strategies(vec![probe]);
    let runner = AvailabilityChecker::new(config).with_checker(checker);

    let summary = runner
        .run(domains(&["a.com", "b.com", "c.com", "d.com", "e.com"]))
        .await
        .unwrap();

    assert_eq!(summary.checked, 5);
    assert!(
        max_in_flight.load(Ordering::SeqCst) <= 2,
        "batch bound exceeded: {}",
        max_in_flight.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn second_run_while_running_is_rejected() {
    let runner = Arc::new(runner_with(vec![FakeProbe::with_delay(
        true,
        Duration::from_millis(100),
    )]));

    let background = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run(domains(&["a.com", "b.com"])).await })
    };

    // Give the first run time to enter Running
    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = runner.run(domains(&["c.com"])).await.unwrap_err();
    assert!(matches!(err, Error::CheckInProgress));

    let summary = background.await.unwrap().unwrap();
    assert_eq!(summary.total, 2);
}

#[tokio::test]
async fn cancelled_run_discards_pending_and_skips_completion_event() {
    let runner = Arc::new(runner_with(vec![FakeProbe::with_delay(
        true,
        Duration::from_millis(200),
    )]));
    let mut events = runner.subscribe();

    let background = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            runner
                .run(domains(&["a.com", "b.com", "c.com", "d.com"]))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    runner.cancel();

    let summary = background.await.unwrap().unwrap();
    assert!(summary.cancelled);
    assert!(summary.checked < summary.total);
    assert_eq!(runner.state(), RunState::Idle);

    let mut saw_cancelled = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::CheckCancelled => saw_cancelled = true,
            Event::CheckComplete { .. } => panic!("completion event after cancel"),
            _ => {}
        }
    }
    assert!(saw_cancelled);
}

#[tokio::test]
async fn retry_after_cancel_runs_the_full_set_again() {
    let list = domains(&["a.com", "b.com", "c.com"]);

    let runner = Arc::new(runner_with(vec![FakeProbe::with_delay(
        true,
        Duration::from_millis(100),
    )]));
    let background = {
        let runner = Arc::clone(&runner);
        let list = list.clone();
        tokio::spawn(async move { runner.run(list).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    runner.cancel();
    let cancelled = background.await.unwrap().unwrap();
    assert!(cancelled.cancelled);

    // Retry is just run() again with a fresh session
    let retry = runner.run(list).await.unwrap();
    assert!(!retry.cancelled);
    assert_eq!(retry.total, 3);
    assert_eq!(retry.checked, 3);
    assert_eq!(retry.accessible + retry.blocked, 3);
}

#[tokio::test]
async fn dropped_run_future_releases_the_runner() {
    let runner = runner_with(vec![FakeProbe::with_delay(
        true,
        Duration::from_millis(200),
    )]);

    // Wrapping run() in a short timeout drops the future mid-flight.
    let result = tokio::time::timeout(
        Duration::from_millis(30),
        runner.run(domains(&["a.com", "b.com", "c.com"])),
    )
    .await;
    assert!(result.is_err(), "run should still be in flight");

    // Teardown must have happened anyway: back to Idle, fresh run accepted.
    assert_eq!(runner.state(), RunState::Idle);
    let summary = runner.run(domains(&["a.com"])).await.unwrap();
    assert_eq!(summary.checked, 1);
    assert!(!summary.cancelled);
}

#[tokio::test]
async fn empty_domain_list_completes_immediately() {
    let runner = runner_with(vec![FakeProbe::accessible()]);
    let summary = runner.run(Vec::new()).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.checked, 0);
    assert!(!summary.cancelled);
}
