//! Live in-file duplicate annotation
//!
//! Recomputes duplicate-line markers for the active buffer after every edit,
//! debounced so fast typing produces one scan instead of dozens. In-file
//! only; cross-file scanning is the [`crate::duplicates::DuplicateScanner`]'s
//! job. Each recompute broadcasts the *complete* marker set, so consumers
//! clear previous markers before applying the new ones (idempotent
//! re-annotation).

use std::sync::Mutex;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::DuplicateConfig;
use crate::duplicates::duplicate_line_groups;
use crate::listfile::is_list_file;
use crate::types::Event;

/// Debounced duplicate-line annotator for the active buffer
pub struct LiveDuplicateAnnotator {
    config: DuplicateConfig,
    event_tx: broadcast::Sender<Event>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl LiveDuplicateAnnotator {
    /// Create an annotator emitting on the given event channel.
    pub fn new(config: DuplicateConfig, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            config,
            event_tx,
            pending: Mutex::new(None),
        }
    }

    /// Notify the annotator that the buffer changed.
    ///
    /// For list files, schedules a recompute after the debounce window; an
    /// edit arriving before the window closes replaces the scheduled scan.
    /// For non-list files the annotator is disabled: it emits an immediate
    /// clear and schedules nothing.
    pub fn notify_edit(&self, filename: &str, content: &str) {
        let mut pending = self.lock_pending();
        if let Some(task) = pending.take() {
            task.abort();
        }

        if !is_list_file(filename, &self.config) {
            let _ = self.event_tx.send(Event::DuplicateMarkers {
                file: filename.to_string(),
                lines: Vec::new(),
            });
            return;
        }

        let config = self.config.clone();
        let event_tx = self.event_tx.clone();
        let filename = filename.to_string();
        let content = content.to_string();
        let debounce = self.config.debounce;

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let lines = duplicate_line_groups(&content, &config);
            tracing::trace!(file = %filename, markers = lines.len(), "Recomputed duplicate markers");
            let _ = event_tx.send(Event::DuplicateMarkers {
                file: filename,
                lines,
            });
        }));
    }

    /// Cancel any scheduled recompute (e.g., the buffer was closed).
    pub fn reset(&self) {
        if let Some(task) = self.lock_pending().take() {
            task.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for LiveDuplicateAnnotator {
    fn drop(&mut self) {
        self.reset();
    }
}
