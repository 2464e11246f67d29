//! Favicon probe: fetch `/favicon.ico` with a cache buster

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AvailabilityConfig;
use crate::error::ProbeError;

use super::{probe_client, race, ProbeStrategy, ProbeTarget};

/// Second-priority strategy: request the site's favicon. Any response below
/// 500 counts as success, unlike a browser image load where a missing
/// favicon fires the error path: a 404 still proves the host answers, while
/// a 5xx or transport failure does not.
///
/// A per-attempt `?t=<millis>` cache buster forces the request onto the wire
/// instead of any intermediate cache.
pub struct FaviconProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl FaviconProbe {
    /// Build the probe from availability settings.
    pub fn new(config: &AvailabilityConfig) -> Self {
        Self {
            client: probe_client(config),
            timeout: config.favicon_timeout,
        }
    }
}

#[async_trait]
impl ProbeStrategy for FaviconProbe {
    fn name(&self) -> &'static str {
        "favicon"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(
        &self,
        target: &ProbeTarget,
        cancel: &CancellationToken,
    ) -> Result<(), ProbeError> {
        let url = format!(
            "{}?t={}",
            target.favicon_url,
            chrono::Utc::now().timestamp_millis()
        );
        race(self.timeout, cancel, async {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().as_u16() < 500 => Ok(()),
                Ok(response) => Err(ProbeError::Failed(format!(
                    "favicon returned {}",
                    response.status()
                ))),
                Err(e) => Err(ProbeError::Failed(e.to_string())),
            }
        })
        .await
    }
}
