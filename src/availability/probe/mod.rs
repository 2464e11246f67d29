//! Accessibility probe strategies
//!
//! Three independent heuristics for testing whether a remote host answers
//! from this network context, tried in priority order by the checker:
//!
//! 1. [`HeadProbe`] — HEAD request over https, retried once over plain http
//! 2. [`FaviconProbe`] — fetch of `/favicon.ico` with a cache buster
//! 3. [`FrameProbe`] — fetch of the page itself, body discarded
//!
//! Probes are heuristics, not authoritative: an actively filtering network
//! can defeat any of them. Each strategy has its own timeout and races
//! against the run's cancellation token.

mod favicon;
mod frame;
mod head;

pub use favicon::FaviconProbe;
pub use frame::FrameProbe;
pub use head::HeadProbe;

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AvailabilityConfig;
use crate::error::ProbeError;
use crate::types::Domain;

/// Build the HTTP client shared by the probe strategies.
///
/// Per-request timeouts are enforced by [`race`], so the client itself
/// carries none. Falls back to the default client if the builder fails
/// (only possible with a broken TLS backend).
pub(crate) fn probe_client(config: &AvailabilityConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build probe client, using defaults");
            reqwest::Client::new()
        })
}

/// Prebuilt request targets for one domain
///
/// URLs are kept as strings; a malformed one simply fails the probe at
/// request time, which the fallback chain absorbs.
#[derive(Clone, Debug)]
pub struct ProbeTarget {
    /// `https://{domain}`
    pub https_url: String,
    /// `http://{domain}` (HEAD probe fallback)
    pub http_url: String,
    /// `https://{domain}/favicon.ico` (cache buster appended per attempt)
    pub favicon_url: String,
    /// `https://{domain}/` (page-load probe)
    pub page_url: String,
}

impl ProbeTarget {
    /// Build the standard https/http targets for a domain.
    pub fn for_domain(domain: &Domain) -> Self {
        Self {
            https_url: format!("https://{domain}"),
            http_url: format!("http://{domain}"),
            favicon_url: format!("https://{domain}/favicon.ico"),
            page_url: format!("https://{domain}/"),
        }
    }

    /// Point every probe at the same base URL. Used by tests to direct
    /// probes at a local mock server.
    pub fn for_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            https_url: base.to_string(),
            http_url: base.to_string(),
            favicon_url: format!("{base}/favicon.ico"),
            page_url: format!("{base}/"),
        }
    }
}

/// Maps a domain to the URLs its probes should hit
///
/// The default resolver builds real `https://{domain}` targets; tests inject
/// a resolver pointing at a mock server.
pub trait TargetResolver: Send + Sync {
    /// Resolve probe targets for a domain.
    fn resolve(&self, domain: &Domain) -> ProbeTarget;
}

/// Default resolver: probes go to the domain itself
#[derive(Clone, Copy, Debug, Default)]
pub struct DomainTargetResolver;

impl TargetResolver for DomainTargetResolver {
    fn resolve(&self, domain: &Domain) -> ProbeTarget {
        ProbeTarget::for_domain(domain)
    }
}

/// One accessibility-probing technique
///
/// `probe` resolves `Ok(())` when the host answered, `Err` on failure,
/// timeout, or cancellation. Implementations must return promptly once the
/// token fires; the in-flight request is dropped (aborted) at that point.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// This strategy's timeout budget
    fn timeout(&self) -> Duration;

    /// Probe the target once.
    async fn probe(&self, target: &ProbeTarget, cancel: &CancellationToken)
        -> Result<(), ProbeError>;
}

/// Race a request future against its timeout and the cancellation token.
///
/// Shared plumbing for all strategies: cancellation wins over timeout, and a
/// dropped future aborts the underlying connection.
pub(crate) async fn race<F>(
    timeout: Duration,
    cancel: &CancellationToken,
    request: F,
) -> Result<(), ProbeError>
where
    F: std::future::Future<Output = Result<(), ProbeError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        outcome = tokio::time::timeout(timeout, request) => match outcome {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout),
        },
    }
}
