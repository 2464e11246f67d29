//! HEAD-request probe: https first, one retry over plain http

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AvailabilityConfig;
use crate::error::ProbeError;

use super::{probe_client, race, ProbeStrategy, ProbeTarget};

/// Highest-priority strategy: a HEAD request to `https://{domain}`.
///
/// Any response counts as success regardless of status — the goal is
/// reachability, not content validation. On a network-level failure (not
/// cancellation) the probe retries once against `http://{domain}` before
/// giving up, catching hosts without TLS.
pub struct HeadProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HeadProbe {
    /// Build the probe from availability settings.
    pub fn new(config: &AvailabilityConfig) -> Self {
        Self {
            client: probe_client(config),
            timeout: config.head_timeout,
        }
    }

    async fn attempt(&self, url: &str, cancel: &CancellationToken) -> Result<(), ProbeError> {
        race(self.timeout, cancel, async {
            match self.client.head(url).send().await {
                Ok(_response) => Ok(()),
                Err(e) => Err(ProbeError::Failed(e.to_string())),
            }
        })
        .await
    }
}

#[async_trait]
impl ProbeStrategy for HeadProbe {
    fn name(&self) -> &'static str {
        "head"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(
        &self,
        target: &ProbeTarget,
        cancel: &CancellationToken,
    ) -> Result<(), ProbeError> {
        match self.attempt(&target.https_url, cancel).await {
            Ok(()) => Ok(()),
            Err(ProbeError::Cancelled) => Err(ProbeError::Cancelled),
            Err(e) => {
                tracing::trace!(url = %target.https_url, error = %e, "HEAD over https failed, retrying over http");
                self.attempt(&target.http_url, cancel).await
            }
        }
    }
}
