//! Single-domain fallback chain
//!
//! Runs the probe strategies in priority order, short-circuiting on the
//! first success. Each attempt is additionally raced against the strategy's
//! timeout plus a guard margin so a hung strategy cannot block the chain,
//! and the session's cancellation flag is consulted at every boundary.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AvailabilityConfig;
use crate::error::ProbeError;
use crate::types::{CheckResult, Domain};

use super::probe::{
    DomainTargetResolver, FaviconProbe, FrameProbe, HeadProbe, ProbeStrategy, TargetResolver,
};
use super::session::CheckSession;

/// Checks one domain through the ordered strategy chain
pub struct SingleDomainChecker {
    strategies: Vec<Box<dyn ProbeStrategy>>,
    resolver: Arc<dyn TargetResolver>,
    attempt_guard: Duration,
}

impl SingleDomainChecker {
    /// Build the standard chain: HEAD, favicon, page load.
    pub fn new(config: &AvailabilityConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(HeadProbe::new(config)),
                Box::new(FaviconProbe::new(config)),
                Box::new(FrameProbe::new(config)),
            ],
            resolver: Arc::new(DomainTargetResolver),
            attempt_guard: config.attempt_guard,
        }
    }

    /// Replace the target resolver (tests point probes at a mock server).
    pub fn with_resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the strategy chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ProbeStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Check one domain against the session.
    ///
    /// Returns an accessible result on the first strategy success, a
    /// cancelled result as soon as the session flag is observed, and a
    /// blocked result only once every strategy has failed or timed out.
    pub async fn check(&self, domain: &Domain, session: &CheckSession) -> CheckResult {
        let target = self.resolver.resolve(domain);
        let mut last_error: Option<String> = None;

        for strategy in &self.strategies {
            if session.is_cancelled() {
                return cancelled_result(domain);
            }

            // Registered for the duration of the attempt so a global cancel
            // can account for every in-flight probe.
            let _guard = session.register_probe();
            let budget = strategy.timeout() + self.attempt_guard;
            let attempt = tokio::time::timeout(
                budget,
                strategy.probe(&target, session.cancel_token()),
            )
            .await;

            match attempt {
                Ok(Ok(())) => {
                    tracing::debug!(domain = %domain, strategy = strategy.name(), "Domain reachable");
                    return CheckResult {
                        domain: domain.clone(),
                        accessible: true,
                        error: None,
                        cancelled: false,
                    };
                }
                Ok(Err(ProbeError::Cancelled)) => return cancelled_result(domain),
                Ok(Err(e)) => {
                    tracing::trace!(domain = %domain, strategy = strategy.name(), error = %e, "Probe failed");
                    last_error = Some(e.to_string());
                }
                Err(_elapsed) => {
                    tracing::trace!(domain = %domain, strategy = strategy.name(), "Probe exceeded its guard budget");
                    last_error = Some(ProbeError::Timeout.to_string());
                }
            }
        }

        CheckResult {
            domain: domain.clone(),
            accessible: false,
            error: last_error,
            cancelled: false,
        }
    }
}

fn cancelled_result(domain: &Domain) -> CheckResult {
    CheckResult {
        domain: domain.clone(),
        accessible: false,
        error: None,
        cancelled: true,
    }
}
