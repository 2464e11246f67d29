//! Cross-file duplicate detection
//!
//! Compares the active file's parsed entries against every sibling list file
//! from storage, classifying whole-file duplicates and line-level matches.
//! Also provides the in-file grouping shared with the live annotator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::DuplicateConfig;
use crate::error::Result;
use crate::listfile::{self, parse_entries};
use crate::storage::FileStorage;
use crate::types::{DuplicateMatch, DuplicateReport, DuplicateResult, ListEntry};

/// Cross-file duplicate scanner
///
/// Stateless apart from its configuration; every scan re-reads and re-parses
/// sibling files.
pub struct DuplicateScanner {
    config: DuplicateConfig,
    storage: Arc<dyn FileStorage>,
}

impl DuplicateScanner {
    /// Create a scanner over the given storage.
    pub fn new(config: DuplicateConfig, storage: Arc<dyn FileStorage>) -> Self {
        Self { config, storage }
    }

    /// Scan the active file's content against all sibling list files.
    ///
    /// A sibling is a full duplicate when its entry count, value-set size and
    /// value set all match the active file's; such a sibling contributes no
    /// line-level matches. Note this is an approximation: a sibling with
    /// internal duplicate lines of its own can pass the size checks without
    /// being a line-for-line copy. The behavior is kept intentionally.
    ///
    /// Siblings that fail to load are logged and skipped; a single unreadable
    /// file never aborts the scan.
    pub async fn scan(&self, active_file: &str, active_content: &str) -> Result<DuplicateReport> {
        let active_entries = parse_entries(active_content, &self.config);
        let active_set: HashSet<&str> =
            active_entries.iter().map(|e| e.value.as_str()).collect();

        let siblings = self.sibling_list_files(active_file).await?;

        let mut report = DuplicateReport {
            entries_scanned: active_entries.len(),
            files_scanned: siblings.len(),
            ..Default::default()
        };

        if active_entries.is_empty() || siblings.is_empty() {
            return Ok(report);
        }

        // value -> sibling locations, filled in sibling order
        let mut matches_by_value: HashMap<String, Vec<DuplicateMatch>> = HashMap::new();

        for sibling in &siblings {
            let content = match self.storage.read_file(sibling).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(file = %sibling, error = %e, "Skipping unreadable sibling during duplicate scan");
                    continue;
                }
            };

            let entries = parse_entries(&content, &self.config);
            if self.is_full_duplicate(&entries, &active_entries, &active_set) {
                report.full_duplicates.push(sibling.clone());
                continue;
            }

            for entry in entries {
                if !active_set.contains(entry.value.as_str()) {
                    continue;
                }
                matches_by_value
                    .entry(entry.value)
                    .or_default()
                    .push(DuplicateMatch {
                        file: sibling.clone(),
                        line_number: entry.line_number,
                    });
            }
        }

        // Emit results in active-file line order. An entry value repeated in
        // the active file yields one result per occurrence, same matches.
        for entry in &active_entries {
            if let Some(matches) = matches_by_value.get(entry.value.as_str()) {
                report.partial_duplicates.push(DuplicateResult {
                    value: entry.value.clone(),
                    line_number: entry.line_number,
                    matches: matches.clone(),
                });
            }
        }

        tracing::debug!(
            file = %active_file,
            siblings = report.files_scanned,
            full = report.full_duplicates.len(),
            partial = report.partial_duplicates.len(),
            "Duplicate scan complete"
        );

        Ok(report)
    }

    fn is_full_duplicate(
        &self,
        sibling_entries: &[ListEntry],
        active_entries: &[ListEntry],
        active_set: &HashSet<&str>,
    ) -> bool {
        if sibling_entries.len() != active_entries.len() {
            return false;
        }
        let sibling_set: HashSet<&str> =
            sibling_entries.iter().map(|e| e.value.as_str()).collect();
        if sibling_set.len() != active_set.len() {
            return false;
        }
        sibling_set.iter().all(|value| active_set.contains(value))
    }

    async fn sibling_list_files(&self, active_file: &str) -> Result<Vec<String>> {
        let files = self.storage.list_files().await?;
        Ok(files
            .into_iter()
            .filter(|f| f != active_file && listfile::is_list_file(f, &self.config))
            .collect())
    }
}

/// Group in-file duplicate lines by normalized value.
///
/// Returns the 1-based line numbers of every line whose trimmed value occurs
/// at least twice, ascending. Comment lines and blanks never participate.
pub fn duplicate_line_groups(content: &str, config: &DuplicateConfig) -> Vec<usize> {
    let mut by_value: HashMap<String, Vec<usize>> = HashMap::new();
    for entry in parse_entries(content, config) {
        by_value.entry(entry.value).or_default().push(entry.line_number);
    }

    let mut lines: Vec<usize> = by_value
        .into_values()
        .filter(|group| group.len() >= 2)
        .flatten()
        .collect();
    lines.sort_unstable();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn scanner(files: Vec<(&str, &str)>) -> DuplicateScanner {
        DuplicateScanner::new(
            DuplicateConfig::default(),
            Arc::new(MemoryStorage::with_files(files)),
        )
    }

    #[tokio::test]
    async fn same_set_same_count_is_full_duplicate() {
        let scanner = scanner(vec![
            ("active.list", "x.com\ny.com"),
            ("mirror.list", "y.com\nx.com"),
        ]);
        let report = scanner.scan("active.list", "x.com\ny.com").await.unwrap();
        assert_eq!(report.full_duplicates, vec!["mirror.list"]);
        assert!(report.partial_duplicates.is_empty());
    }

    #[tokio::test]
    async fn overlapping_sibling_yields_partial_matches() {
        let scanner = scanner(vec![
            ("active.list", "x.com\ny.com"),
            ("other.list", "x.com\nz.com"),
        ]);
        let report = scanner.scan("active.list", "x.com\ny.com").await.unwrap();
        assert!(report.full_duplicates.is_empty());
        assert_eq!(report.partial_duplicates.len(), 1);
        let dup = &report.partial_duplicates[0];
        assert_eq!(dup.value, "x.com");
        assert_eq!(dup.line_number, 1);
        assert_eq!(
            dup.matches,
            vec![DuplicateMatch {
                file: "other.list".into(),
                line_number: 1
            }]
        );
    }

    #[tokio::test]
    async fn results_preserve_active_file_line_order() {
        let scanner = scanner(vec![
            ("active.list", ""),
            ("s1.list", "c.com\na.com"),
            ("s2.list", "a.com\nd.com"),
        ]);
        let report = scanner
            .scan("active.list", "a.com\nb.com\nc.com")
            .await
            .unwrap();
        let values: Vec<&str> = report
            .partial_duplicates
            .iter()
            .map(|r| r.value.as_str())
            .collect();
        assert_eq!(values, vec!["a.com", "c.com"]);
        // a.com matched in both siblings, in sibling scan order
        assert_eq!(report.partial_duplicates[0].matches.len(), 2);
    }

    #[tokio::test]
    async fn non_list_siblings_and_self_are_excluded() {
        let scanner = scanner(vec![
            ("active.list", "x.com"),
            ("notes.conf", "x.com"),
        ]);
        let report = scanner.scan("active.list", "x.com").await.unwrap();
        assert_eq!(report.files_scanned, 0);
        assert!(report.partial_duplicates.is_empty());
    }

    #[tokio::test]
    async fn comment_lines_never_match() {
        let scanner = scanner(vec![
            ("active.list", ""),
            ("other.list", "# x.com\nx.com"),
        ]);
        let report = scanner.scan("active.list", "# x.com\nx.com").await.unwrap();
        assert_eq!(report.partial_duplicates.len(), 1);
        assert_eq!(report.partial_duplicates[0].matches[0].line_number, 2);
    }

    #[tokio::test]
    async fn sibling_with_internal_duplicates_can_classify_as_full() {
        // Documented approximation: same entry count, same set size, subset
        // holds even though line-for-line content differs.
        let scanner = scanner(vec![
            ("active.list", ""),
            ("weird.list", "x.com\nx.com\ny.com\nz.com"),
        ]);
        let report = scanner
            .scan("active.list", "x.com\ny.com\nz.com\nz.com")
            .await
            .unwrap();
        assert_eq!(report.full_duplicates, vec!["weird.list"]);
    }

    #[tokio::test]
    async fn empty_active_file_short_circuits() {
        let scanner = scanner(vec![("active.list", ""), ("other.list", "x.com")]);
        let report = scanner.scan("active.list", "# only comments").await.unwrap();
        assert_eq!(report.entries_scanned, 0);
        assert!(report.partial_duplicates.is_empty());
        assert!(report.full_duplicates.is_empty());
    }

    #[test]
    fn in_file_duplicate_lines_are_grouped() {
        let config = DuplicateConfig::default();
        let lines = duplicate_line_groups("a.com\nb.com\na.com\n\n# a.com\nb.com", &config);
        assert_eq!(lines, vec![1, 2, 3, 6]);
    }

    #[test]
    fn in_file_groups_empty_when_unique() {
        let config = DuplicateConfig::default();
        assert!(duplicate_line_groups("a.com\nb.com", &config).is_empty());
    }
}
