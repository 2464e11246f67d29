//! Page-load probe: fetch the page itself, discard the body

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::AvailabilityConfig;
use crate::error::ProbeError;

use super::{probe_client, race, ProbeStrategy, ProbeTarget};

/// Last-resort strategy: load `https://{domain}/` like a hidden frame would.
///
/// Success is the arrival of response headers; the body is never read and
/// the response is dropped immediately, closing the connection (the frame
/// detach). Any status counts — a 403 or 500 page still proves the host is
/// reachable from this network.
pub struct FrameProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl FrameProbe {
    /// Build the probe from availability settings.
    pub fn new(config: &AvailabilityConfig) -> Self {
        Self {
            client: probe_client(config),
            timeout: config.frame_timeout,
        }
    }
}

#[async_trait]
impl ProbeStrategy for FrameProbe {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(
        &self,
        target: &ProbeTarget,
        cancel: &CancellationToken,
    ) -> Result<(), ProbeError> {
        race(self.timeout, cancel, async {
            match self.client.get(&target.page_url).send().await {
                Ok(response) => {
                    // Headers arrived; drop without reading the body.
                    drop(response);
                    Ok(())
                }
                Err(e) => Err(ProbeError::Failed(e.to_string())),
            }
        })
        .await
    }
}
