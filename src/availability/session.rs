//! Per-run check session state
//!
//! A [`CheckSession`] is created fresh for every availability run (including
//! retries) and owns the run's counters, cancellation token, and pending
//! probe registry. Counters are atomics because domains within a batch settle
//! concurrently; the registry guarantees every in-flight probe is accounted
//! for and drained on cancel or completion.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::types::CheckSummary;

/// Registry of in-flight probe resources
///
/// Probes register on start and deregister on drop (RAII guard), so the
/// registry is empty exactly when no probe holds a live network resource.
#[derive(Debug, Default)]
pub(crate) struct ProbeRegistry {
    next_id: AtomicU64,
    active: Mutex<HashSet<u64>>,
}

impl ProbeRegistry {
    fn register(self: &Arc<Self>) -> ProbeGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id);
        ProbeGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// RAII handle deregistering a probe resource on drop
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    registry: Arc<ProbeRegistry>,
    id: u64,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

/// Mutable aggregate state for one availability run
#[derive(Debug)]
pub struct CheckSession {
    total: usize,
    checked: AtomicUsize,
    accessible: AtomicUsize,
    blocked: AtomicUsize,
    cancel: CancellationToken,
    registry: Arc<ProbeRegistry>,
}

/// Counter snapshot after a domain settled
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProgressSnapshot {
    /// Domains settled so far
    pub checked: usize,
    /// Running accessible count
    pub accessible: usize,
    /// Running blocked count
    pub blocked: usize,
}

impl CheckSession {
    /// Create a fresh session for `total` domains.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            checked: AtomicUsize::new(0),
            accessible: AtomicUsize::new(0),
            blocked: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
            registry: Arc::new(ProbeRegistry::default()),
        }
    }

    /// Total domains in this run
    pub fn total(&self) -> usize {
        self.total
    }

    /// Flag the session cancelled and abort every registered probe.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The session's cancellation token; probes select against it
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of probe resources currently in flight.
    ///
    /// Zero after a run completes or cancels — the drain invariant.
    pub fn pending_probes(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn register_probe(&self) -> ProbeGuard {
        self.registry.register()
    }

    /// Count one settled domain and return the updated snapshot.
    pub(crate) fn record(&self, accessible: bool) -> ProgressSnapshot {
        if accessible {
            self.accessible.fetch_add(1, Ordering::Relaxed);
        } else {
            self.blocked.fetch_add(1, Ordering::Relaxed);
        }
        let checked = self.checked.fetch_add(1, Ordering::Relaxed) + 1;
        ProgressSnapshot {
            checked,
            accessible: self.accessible.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }

    /// Final summary for this run.
    pub fn summary(&self) -> CheckSummary {
        CheckSummary {
            total: self.total,
            checked: self.checked.load(Ordering::Relaxed),
            accessible: self.accessible.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            cancelled: self.is_cancelled(),
        }
    }
}
