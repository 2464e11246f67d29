//! Version parsing and update checking

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::UpdateConfig;
use crate::error::{Error, Result};

/// A semantic version, parsed from tags like `1.4.2` or `v1.4.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

impl Version {
    /// Construct a version from its components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        let mut parts = trimmed.split('.');

        let mut component = |name: &str| -> Result<u32> {
            parts
                .next()
                .ok_or_else(|| Error::InvalidVersion(s.to_string()))?
                .parse()
                .map_err(|_| {
                    tracing::debug!(input = s, component = name, "Unparseable version component");
                    Error::InvalidVersion(s.to_string())
                })
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;
        if parts.next().is_some() {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: String,
}

/// Checks a release feed for a version newer than the installed one.
pub struct UpdateChecker {
    config: UpdateConfig,
    client: reqwest::Client,
}

impl UpdateChecker {
    /// Build an update checker; fails only if the HTTP client cannot be
    /// constructed.
    pub fn new(config: UpdateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Fetch the latest published version from the release feed.
    pub async fn latest(&self) -> Result<Version> {
        let release: ReleaseInfo = self
            .client
            .get(&self.config.release_api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        release.tag_name.parse()
    }

    /// Return the latest version if it is newer than `current`.
    ///
    /// Returns `Ok(None)` when update checking is disabled or the installed
    /// version is already up to date. Feed or parse failures propagate so
    /// callers can decide whether to surface or swallow them.
    pub async fn check(&self, current: Version) -> Result<Option<Version>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let latest = self.latest().await?;
        if latest > current {
            tracing::info!(%current, %latest, "Update available");
            Ok(Some(latest))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_plain_and_v_prefixed_tags() {
        assert_eq!("1.4.2".parse::<Version>().unwrap(), Version::new(1, 4, 2));
        assert_eq!("v2.0.11".parse::<Version>().unwrap(), Version::new(2, 0, 11));
        assert_eq!(" v0.9.1 ".parse::<Version>().unwrap(), Version::new(0, 9, 1));
    }

    #[test]
    fn rejects_malformed_tags() {
        for bad in ["", "1.2", "1.2.3.4", "1.x.3", "abc"] {
            assert!(bad.parse::<Version>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn ordering_is_component_wise() {
        assert!(Version::new(1, 4, 2) < Version::new(1, 4, 10));
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
    }

    #[test]
    fn displays_without_prefix() {
        assert_eq!(Version::new(1, 4, 2).to_string(), "1.4.2");
    }

    async fn checker_against(server: &MockServer, enabled: bool) -> UpdateChecker {
        UpdateChecker::new(UpdateConfig {
            enabled,
            release_api_url: format!("{}/releases/latest", server.uri()),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn reports_newer_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "v1.5.0"
            })))
            .mount(&server)
            .await;

        let checker = checker_against(&server, true).await;
        let latest = checker.check(Version::new(1, 4, 2)).await.unwrap();
        assert_eq!(latest, Some(Version::new(1, 5, 0)));
    }

    #[tokio::test]
    async fn up_to_date_reports_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "1.4.2"
            })))
            .mount(&server)
            .await;

        let checker = checker_against(&server, true).await;
        let latest = checker.check(Version::new(1, 4, 2)).await.unwrap();
        assert_eq!(latest, None);
    }

    #[tokio::test]
    async fn disabled_checker_skips_the_feed() {
        let server = MockServer::start().await;
        // No mock mounted: a request would 404 and error.
        let checker = checker_against(&server, false).await;
        let latest = checker.check(Version::new(1, 0, 0)).await.unwrap();
        assert_eq!(latest, None);
    }
}
