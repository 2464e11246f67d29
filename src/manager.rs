//! High-level list editing facade
//!
//! [`ListManager`] wires the collaborators together behind one API: file
//! storage, cross-file duplicate scanning, live in-buffer annotation, and the
//! batched availability checker, all sharing a single event channel.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::sync::broadcast;

use crate::annotator::LiveDuplicateAnnotator;
use crate::api::ApiClient;
use crate::availability::AvailabilityChecker;
use crate::config::Config;
use crate::duplicates::DuplicateScanner;
use crate::error::{Error, Result};
use crate::extract::extract_domains;
use crate::listfile::is_list_file;
use crate::storage::FileStorage;
use crate::types::{CheckSummary, DuplicateReport, Event, RunState, ServiceAction};
use crate::version::{UpdateChecker, Version};

/// `name.ext` with at least one character on each side of the final dot
const EXTENSION_PATTERN: &str = r"[^.]+\.[^.]+$";

fn extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(EXTENSION_PATTERN).expect("extension pattern is a valid regex")
    })
}

fn filename_charset_ok(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// Facade over storage, duplicate detection, and availability checking
///
/// Create one per storage endpoint; all collaborators broadcast on the same
/// event channel, so a single [`subscribe`] covers save/delete notifications,
/// duplicate markers, and check progress.
///
/// [`subscribe`]: ListManager::subscribe
pub struct ListManager {
    config: Config,
    storage: Arc<dyn FileStorage>,
    api: Option<Arc<ApiClient>>,
    checker: AvailabilityChecker,
    annotator: LiveDuplicateAnnotator,
    scanner: DuplicateScanner,
    event_tx: broadcast::Sender<Event>,
}

impl ListManager {
    /// Build a manager over the given storage backend.
    ///
    /// Fails if the configuration does not validate. Service control and
    /// update checks are only available via [`ListManager::with_api`].
    pub fn new(config: Config, storage: Arc<dyn FileStorage>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(1024);
        let checker =
            AvailabilityChecker::with_events(config.availability.clone(), event_tx.clone());
        let annotator =
            LiveDuplicateAnnotator::new(config.duplicates.clone(), event_tx.clone());
        let scanner = DuplicateScanner::new(config.duplicates.clone(), Arc::clone(&storage));

        Ok(Self {
            config,
            storage,
            api: None,
            checker,
            annotator,
            scanner,
            event_tx,
        })
    }

    /// Build a manager backed by the remote storage API.
    ///
    /// The client doubles as the file storage and additionally enables
    /// [`service_action`] and [`check_for_update`].
    ///
    /// [`service_action`]: ListManager::service_action
    /// [`check_for_update`]: ListManager::check_for_update
    pub fn with_api(config: Config, api: Arc<ApiClient>) -> Result<Self> {
        let mut manager = Self::new(config, Arc::clone(&api) as Arc<dyn FileStorage>)?;
        manager.api = Some(api);
        Ok(manager)
    }

    /// Subscribe to all lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// List stored filenames.
    pub async fn files(&self) -> Result<Vec<String>> {
        self.storage.list_files().await
    }

    /// Read a file's content.
    pub async fn read_file(&self, filename: &str) -> Result<String> {
        self.storage.read_file(filename).await
    }

    /// Save a file, emitting [`Event::FileSaved`] on success.
    ///
    /// Protected files stay editable; protection only guards against
    /// deletion and against a create shadowing them.
    pub async fn save_file(&self, filename: &str, content: &str) -> Result<()> {
        if !filename_charset_ok(filename) || filename.contains("..") {
            return Err(Error::InvalidFilename(filename.to_string()));
        }
        self.storage.write_file(filename, content).await?;
        tracing::info!(file = %filename, bytes = content.len(), "Saved file");
        let _ = self.event_tx.send(Event::FileSaved {
            file: filename.to_string(),
        });
        Ok(())
    }

    /// Delete a file, emitting [`Event::FileDeleted`] on success.
    pub async fn delete_file(&self, filename: &str) -> Result<()> {
        if self.is_protected(filename) {
            return Err(Error::ProtectedFile(filename.to_string()));
        }
        self.storage.delete_file(filename).await?;
        tracing::info!(file = %filename, "Deleted file");
        let _ = self.event_tx.send(Event::FileDeleted {
            file: filename.to_string(),
        });
        Ok(())
    }

    /// Validate a proposed new filename against the naming rules.
    ///
    /// Rejects names outside `[A-Za-z0-9._-]`, names containing `..`, names
    /// without an extension, protected names, and names already present in
    /// `existing`.
    pub fn validate_new_filename(&self, filename: &str, existing: &[String]) -> Result<()> {
        if !filename_charset_ok(filename) || filename.contains("..") {
            return Err(Error::InvalidFilename(filename.to_string()));
        }
        if !extension_regex().is_match(filename) {
            return Err(Error::InvalidFilename(filename.to_string()));
        }
        if self.is_protected(filename) {
            return Err(Error::ProtectedFile(filename.to_string()));
        }
        if existing.iter().any(|f| f == filename) {
            return Err(Error::InvalidFilename(format!(
                "{filename} already exists"
            )));
        }
        Ok(())
    }

    /// Create a new empty file after validating its name.
    pub async fn create_file(&self, filename: &str) -> Result<()> {
        let existing = self.storage.list_files().await?;
        self.validate_new_filename(filename, &existing)?;
        self.save_file(filename, "").await
    }

    /// Run an availability check over every domain in a stored list file.
    ///
    /// Fails with [`Error::NotListFile`] for non-list files and
    /// [`Error::NoDomainsFound`] when the file parses to zero domains.
    /// Progress arrives as events; the returned summary is the final tally.
    pub async fn check_file_domains(&self, filename: &str) -> Result<CheckSummary> {
        if !is_list_file(filename, &self.config.duplicates) {
            return Err(Error::NotListFile(filename.to_string()));
        }
        let content = self.storage.read_file(filename).await?;
        self.check_content_domains(&content).await
    }

    /// Run an availability check over every domain extracted from `content`.
    pub async fn check_content_domains(&self, content: &str) -> Result<CheckSummary> {
        let domains = extract_domains(content);
        if domains.is_empty() {
            return Err(Error::NoDomainsFound);
        }
        self.checker.run(domains).await
    }

    /// Cancel the active availability run, if any.
    pub fn cancel_check(&self) {
        self.checker.cancel();
    }

    /// Current availability run state
    pub fn check_state(&self) -> RunState {
        self.checker.state()
    }

    /// Scan a stored file against its siblings for duplicates.
    pub async fn scan_duplicates(&self, filename: &str) -> Result<DuplicateReport> {
        let content = self.storage.read_file(filename).await?;
        self.scan_duplicates_in(filename, &content).await
    }

    /// Scan unsaved buffer content against the named file's siblings.
    pub async fn scan_duplicates_in(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<DuplicateReport> {
        if !is_list_file(filename, &self.config.duplicates) {
            return Err(Error::NotListFile(filename.to_string()));
        }
        self.scanner.scan(filename, content).await
    }

    /// Notify the live annotator that the active buffer changed.
    ///
    /// Marker updates arrive as [`Event::DuplicateMarkers`] after the
    /// debounce window.
    pub fn notify_edit(&self, filename: &str, content: &str) {
        self.annotator.notify_edit(filename, content);
    }

    /// Execute a service control action, emitting
    /// [`Event::ServiceStateChanged`] with the resulting state.
    ///
    /// Requires an API-backed manager ([`ListManager::with_api`]).
    pub async fn service_action(&self, action: ServiceAction) -> Result<bool> {
        let api = self.require_api()?;
        let running = api.service_action(action).await?;
        tracing::info!(%action, running, "Service action applied");
        let _ = self.event_tx.send(Event::ServiceStateChanged { running });
        Ok(running)
    }

    /// Compare the installed service version against the latest release.
    ///
    /// Emits [`Event::UpdateAvailable`] and returns the latest version when
    /// an update exists. Requires an API-backed manager.
    pub async fn check_for_update(&self) -> Result<Option<Version>> {
        let api = self.require_api()?;
        let current = api.fetch_version().await?;
        let checker = UpdateChecker::new(self.config.update.clone())?;
        match checker.check(current).await? {
            Some(latest) => {
                let _ = self.event_tx.send(Event::UpdateAvailable { current, latest });
                Ok(Some(latest))
            }
            None => Ok(None),
        }
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn require_api(&self) -> Result<&Arc<ApiClient>> {
        self.api
            .as_ref()
            .ok_or_else(|| Error::Other("service control requires the remote API backend".into()))
    }

    fn is_protected(&self, filename: &str) -> bool {
        self.config
            .storage
            .protected_files
            .iter()
            .any(|f| f == filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::Event;

    fn manager_with(files: &[(&str, &str)]) -> ListManager {
        let storage = Arc::new(MemoryStorage::with_files(
            files.iter().map(|&(n, c)| (n, c)),
        ));
        let mut config = Config::default();
        config.storage.protected_files = vec!["nfqws.conf".to_string()];
        ListManager::new(config, storage).unwrap()
    }

    #[tokio::test]
    async fn save_emits_event_and_persists() {
        let manager = manager_with(&[]);
        let mut events = manager.subscribe();

        manager.save_file("user.list", "a.com\n").await.unwrap();
        assert_eq!(manager.read_file("user.list").await.unwrap(), "a.com\n");

        match events.try_recv().unwrap() {
            Event::FileSaved { file } => assert_eq!(file, "user.list"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_refuses_protected_files() {
        let manager = manager_with(&[("nfqws.conf", "x"), ("user.list", "a.com")]);

        let err = manager.delete_file("nfqws.conf").await.unwrap_err();
        assert!(matches!(err, Error::ProtectedFile(_)));

        manager.delete_file("user.list").await.unwrap();
        assert_eq!(manager.files().await.unwrap(), vec!["nfqws.conf"]);
    }

    #[tokio::test]
    async fn protected_files_stay_editable() {
        let manager = manager_with(&[("nfqws.conf", "old")]);
        manager.save_file("nfqws.conf", "new").await.unwrap();
        assert_eq!(manager.read_file("nfqws.conf").await.unwrap(), "new");
    }

    #[test]
    fn new_filename_rules() {
        let manager = manager_with(&[]);
        let existing = vec!["user.list".to_string()];

        assert!(manager.validate_new_filename("auto.list", &existing).is_ok());
        assert!(manager
            .validate_new_filename("my-hosts_2.list", &existing)
            .is_ok());

        for bad in [
            "",
            "no_extension",
            "trailing.",
            ".hidden",
            "has space.list",
            "path/file.list",
            "up..list",
            "../etc.list",
            "ünïcode.list",
        ] {
            assert!(
                manager.validate_new_filename(bad, &existing).is_err(),
                "accepted {bad:?}"
            );
        }

        assert!(matches!(
            manager.validate_new_filename("user.list", &existing),
            Err(Error::InvalidFilename(_))
        ));
        assert!(matches!(
            manager.validate_new_filename("nfqws.conf", &existing),
            Err(Error::ProtectedFile(_))
        ));
    }

    #[tokio::test]
    async fn create_file_validates_then_writes_empty() {
        let manager = manager_with(&[("user.list", "a.com")]);

        manager.create_file("auto.list").await.unwrap();
        assert_eq!(manager.read_file("auto.list").await.unwrap(), "");

        assert!(manager.create_file("user.list").await.is_err());
        assert!(manager.create_file("bad name.list").await.is_err());
    }

    #[tokio::test]
    async fn check_rejects_non_list_files() {
        let manager = manager_with(&[("nfqws.conf", "a.com")]);
        let err = manager.check_file_domains("nfqws.conf").await.unwrap_err();
        assert!(matches!(err, Error::NotListFile(_)));
    }

    #[tokio::test]
    async fn check_rejects_domainless_content() {
        let manager = manager_with(&[("user.list", "# only comments\n\n")]);
        let err = manager.check_file_domains("user.list").await.unwrap_err();
        assert!(matches!(err, Error::NoDomainsFound));
    }

    #[tokio::test]
    async fn scan_duplicates_reads_the_stored_file() {
        let manager = manager_with(&[
            ("user.list", "a.com\nb.com\n"),
            ("auto.list", "b.com\nc.com\n"),
        ]);

        let report = manager.scan_duplicates("user.list").await.unwrap();
        assert_eq!(report.entries_scanned, 2);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.partial_duplicates.len(), 1);
        assert_eq!(report.partial_duplicates[0].value, "b.com");
    }

    #[tokio::test]
    async fn scan_duplicates_rejects_non_list_files() {
        let manager = manager_with(&[("nfqws.conf", "a.com")]);
        let err = manager.scan_duplicates("nfqws.conf").await.unwrap_err();
        assert!(matches!(err, Error::NotListFile(_)));
    }

    #[tokio::test]
    async fn service_control_needs_the_api_backend() {
        let manager = manager_with(&[]);
        assert!(manager
            .service_action(crate::types::ServiceAction::Restart)
            .await
            .is_err());
        assert!(manager.check_for_update().await.is_err());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let storage = Arc::new(MemoryStorage::new());
        let mut config = Config::default();
        config.availability.batch_size = 0;
        assert!(matches!(
            ListManager::new(config, storage),
            Err(Error::Config { .. })
        ));
    }
}
