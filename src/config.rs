//! Configuration types for listkeeper

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
///
/// Works out of the box with `Config::default()` pointed at a storage
/// endpoint; every knob below has a sensible default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote file storage API settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Domain availability checker settings
    #[serde(default)]
    pub availability: AvailabilityConfig,

    /// Duplicate detection settings
    #[serde(default)]
    pub duplicates: DuplicateConfig,

    /// Version update check settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// Retry behavior for transient storage failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Validate the configuration, returning a descriptive error for the
    /// first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        if self.storage.endpoint.is_empty() {
            return Err(Error::Config {
                message: "storage endpoint must not be empty".into(),
                key: Some("storage.endpoint".into()),
            });
        }
        if self.availability.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be greater than zero".into(),
                key: Some("availability.batch_size".into()),
            });
        }
        for (timeout, key) in [
            (self.availability.head_timeout, "availability.head_timeout"),
            (
                self.availability.favicon_timeout,
                "availability.favicon_timeout",
            ),
            (
                self.availability.frame_timeout,
                "availability.frame_timeout",
            ),
        ] {
            if timeout.is_zero() {
                return Err(Error::Config {
                    message: "probe timeout must be greater than zero".into(),
                    key: Some(key.into()),
                });
            }
        }
        if self.duplicates.list_extensions.is_empty() {
            return Err(Error::Config {
                message: "at least one list extension is required".into(),
                key: Some("duplicates.list_extensions".into()),
            });
        }
        Ok(())
    }
}

/// Remote file storage API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage command endpoint (e.g., "http://192.168.1.1/editor/index.php")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout for storage API calls (default: 10 seconds)
    #[serde(default = "default_storage_timeout", with = "duration_ms")]
    pub timeout: Duration,

    /// Filenames that must never be deleted or overwritten by a create
    #[serde(default = "default_protected_files")]
    pub protected_files: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_storage_timeout(),
            protected_files: default_protected_files(),
        }
    }
}

/// Domain availability checker configuration
///
/// Timeouts mirror the probing heuristics: each strategy has its own budget,
/// and `attempt_guard` is an extra margin on the outer race so a hung
/// strategy cannot block the fallback chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Number of domains checked concurrently per batch (default: 10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout for the HEAD probe, per scheme attempt (default: 1500 ms)
    #[serde(default = "default_head_timeout", with = "duration_ms")]
    pub head_timeout: Duration,

    /// Timeout for the favicon probe (default: 2000 ms)
    #[serde(default = "default_favicon_timeout", with = "duration_ms")]
    pub favicon_timeout: Duration,

    /// Timeout for the page-load probe (default: 1500 ms)
    #[serde(default = "default_frame_timeout", with = "duration_ms")]
    pub frame_timeout: Duration,

    /// Extra margin added to the outer per-strategy race (default: 500 ms)
    #[serde(default = "default_attempt_guard", with = "duration_ms")]
    pub attempt_guard: Duration,

    /// Pause after each settled domain before the result is counted,
    /// throttling progress events (default: 50 ms)
    #[serde(default = "default_settle_delay", with = "duration_ms")]
    pub settle_delay: Duration,

    /// User-Agent header sent with probe requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            head_timeout: default_head_timeout(),
            favicon_timeout: default_favicon_timeout(),
            frame_timeout: default_frame_timeout(),
            attempt_guard: default_attempt_guard(),
            settle_delay: default_settle_delay(),
            user_agent: default_user_agent(),
        }
    }
}

/// Duplicate detection configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Quiet period after the last edit before in-file duplicate markers are
    /// recomputed (default: 600 ms)
    #[serde(default = "default_debounce", with = "duration_ms")]
    pub debounce: Duration,

    /// File extensions treated as list files (default: ["list"])
    #[serde(default = "default_list_extensions")]
    pub list_extensions: Vec<String>,

    /// Line prefixes treated as comments (default: ["#", "//"])
    #[serde(default = "default_comment_prefixes")]
    pub comment_prefixes: Vec<String>,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            list_extensions: default_list_extensions(),
            comment_prefixes: default_comment_prefixes(),
        }
    }
}

/// Version update check configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Whether to check for newer releases (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Releases API URL returning `{ "tag_name": "vX.Y.Z" }`
    #[serde(default = "default_release_url")]
    pub release_api_url: String,

    /// Request timeout for the release check (default: 10 seconds)
    #[serde(default = "default_storage_timeout", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            release_api_url: default_release_url(),
            timeout: default_storage_timeout(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 500 ms)
    #[serde(default = "default_initial_delay", with = "duration_ms")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1/index.php".to_string()
}

fn default_storage_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_protected_files() -> Vec<String> {
    Vec::new()
}

fn default_batch_size() -> usize {
    10
}

fn default_head_timeout() -> Duration {
    Duration::from_millis(1500)
}

fn default_favicon_timeout() -> Duration {
    Duration::from_millis(2000)
}

fn default_frame_timeout() -> Duration {
    Duration::from_millis(1500)
}

fn default_attempt_guard() -> Duration {
    Duration::from_millis(500)
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_debounce() -> Duration {
    Duration::from_millis(600)
}

fn default_list_extensions() -> Vec<String> {
    vec!["list".into()]
}

fn default_comment_prefixes() -> Vec<String> {
    vec!["#".into(), "//".into()]
}

fn default_release_url() -> String {
    "https://api.github.com/repos/listkeeper/listkeeper/releases/latest".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (milliseconds; probe timeouts are sub-second)
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = Config::default();
        config.availability.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn zero_probe_timeout_is_rejected() {
        let mut config = Config::default();
        config.availability.favicon_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let mut config = Config::default();
        config.storage.endpoint = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_round_trip_as_millis() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.availability.head_timeout, Duration::from_millis(1500));
        assert_eq!(parsed.availability.settle_delay, Duration::from_millis(50));
        assert_eq!(parsed.duplicates.debounce, Duration::from_millis(600));
    }

    #[test]
    fn partial_json_uses_field_defaults() {
        let parsed: Config =
            serde_json::from_str(r#"{"availability": {"batch_size": 4}}"#).unwrap();
        assert_eq!(parsed.availability.batch_size, 4);
        assert_eq!(
            parsed.availability.favicon_timeout,
            Duration::from_millis(2000)
        );
        assert_eq!(parsed.duplicates.list_extensions, vec!["list".to_string()]);
    }
}
