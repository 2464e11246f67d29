//! Core types for listkeeper

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A normalized domain name
///
/// Lowercase host string with scheme, path, port, and query already stripped;
/// guaranteed to match the `label(.label)+.tld` shape enforced by
/// [`crate::extract`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Wrap an already-normalized host string.
    ///
    /// Callers outside the extractor should prefer [`Domain::parse`], which
    /// validates the shape.
    pub(crate) fn new_unchecked(host: String) -> Self {
        Self(host)
    }

    /// Parse and validate a single domain string.
    ///
    /// Applies the same normalization as the extractor (scheme/`www.`/path
    /// stripping, lowercasing) and fails if the result does not look like a
    /// domain.
    pub fn parse(input: &str) -> Result<Self, Error> {
        crate::extract::normalize_line(input)
            .ok_or_else(|| Error::Other(format!("not a valid domain: {input}")))
    }

    /// The host string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of checking a single domain; immutable once produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The domain that was checked
    pub domain: Domain,
    /// Whether any probe strategy reached the host
    pub accessible: bool,
    /// Error message from the last failed strategy, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True if the run was cancelled before this domain settled; such a
    /// result is not counted as accessible or blocked
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

/// Aggregate outcome of one availability run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Total number of domains submitted
    pub total: usize,
    /// Domains that settled (counted accessible or blocked)
    pub checked: usize,
    /// Domains reached by at least one probe
    pub accessible: usize,
    /// Domains every probe failed to reach
    pub blocked: usize,
    /// Whether the run was cancelled before completion
    pub cancelled: bool,
}

/// Availability run state machine
///
/// `Idle -> Running -> {Completed, Cancelled}`; both terminal states return
/// to `Idle` on teardown. Only one run may be `Running` at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run active
    #[default]
    Idle,
    /// A run is in progress
    Running,
    /// Last run finished normally
    Completed,
    /// Last run was cancelled
    Cancelled,
}

/// One normalized line from a list file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Trimmed line content
    pub value: String,
    /// 1-based line number in the source file
    pub line_number: usize,
}

/// A sibling-file location sharing an entry value with the active file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Sibling filename
    pub file: String,
    /// 1-based line number within the sibling file
    pub line_number: usize,
}

/// An active-file entry found in at least one sibling file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateResult {
    /// The duplicated entry value
    pub value: String,
    /// 1-based line number in the active file
    pub line_number: usize,
    /// Sibling locations, in sibling scan order
    pub matches: Vec<DuplicateMatch>,
}

/// Outcome of a cross-file duplicate scan
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Sibling files whose entire entry set matches the active file
    pub full_duplicates: Vec<String>,
    /// Line-level duplicates, in active-file line order
    pub partial_duplicates: Vec<DuplicateResult>,
    /// Number of entries parsed from the active file
    pub entries_scanned: usize,
    /// Number of sibling list files considered
    pub files_scanned: usize,
}

/// Service control actions understood by the storage backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    /// Start the service
    Start,
    /// Stop the service
    Stop,
    /// Restart the service
    Restart,
    /// Reload configuration without a full restart
    Reload,
    /// Upgrade the service to the latest package
    Upgrade,
}

impl ServiceAction {
    /// The command string sent to the storage API
    pub fn as_command(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Reload => "reload",
            ServiceAction::Upgrade => "upgrade",
        }
    }
}

impl std::fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_command())
    }
}

/// Event emitted during checker and editor lifecycle
///
/// Consumers subscribe via [`crate::manager::ListManager::subscribe`] (or the
/// availability checker directly); rendering is entirely up to the consumer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An availability run started
    CheckStarted {
        /// Number of domains to check
        total: usize,
    },

    /// A single domain settled
    DomainChecked {
        /// The domain that settled
        domain: Domain,
        /// Whether it was reachable
        accessible: bool,
        /// Domains settled so far (including this one)
        checked: usize,
        /// Total domains in the run
        total: usize,
        /// Running accessible count
        accessible_count: usize,
        /// Running blocked count
        blocked_count: usize,
    },

    /// The run finished normally
    CheckComplete {
        /// Final accessible count
        accessible: usize,
        /// Final blocked count
        blocked: usize,
    },

    /// The run was cancelled; counts are discarded
    CheckCancelled,

    /// In-file duplicate lines changed for the active buffer; an empty
    /// `lines` clears all markers
    DuplicateMarkers {
        /// File the markers belong to
        file: String,
        /// 1-based line numbers to mark, ascending
        lines: Vec<usize>,
    },

    /// A file was written to storage
    FileSaved {
        /// Saved filename
        file: String,
    },

    /// A file was removed from storage
    FileDeleted {
        /// Deleted filename
        file: String,
    },

    /// The managed service reported a new running state
    ServiceStateChanged {
        /// Whether the service is running
        running: bool,
    },

    /// A newer release is available
    UpdateAvailable {
        /// Installed version
        current: crate::version::Version,
        /// Latest published version
        latest: crate::version::Version,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parse_normalizes() {
        let domain = Domain::parse("https://www.Example.com/path").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn domain_parse_rejects_garbage() {
        assert!(Domain::parse("not a domain").is_err());
        assert!(Domain::parse("").is_err());
        assert!(Domain::parse("# comment").is_err());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::CheckComplete {
            accessible: 3,
            blocked: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "check_complete");
        assert_eq!(json["accessible"], 3);
    }

    #[test]
    fn service_action_commands() {
        assert_eq!(ServiceAction::Restart.as_command(), "restart");
        assert_eq!(ServiceAction::Upgrade.to_string(), "upgrade");
    }
}
