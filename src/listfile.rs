//! List-file parsing and filename classification
//!
//! A list file is a newline-delimited set of entries (typically domains) with
//! `#`/`//` comment lines. Parsing is pure and recomputed on demand; entries
//! are never cached across scans.

use crate::config::DuplicateConfig;
use crate::types::ListEntry;

/// Parse file content into ordered entries with 1-based line numbers.
///
/// Splits on `\n` (tolerating `\r\n`), trims each line, and skips blanks and
/// comment lines. Line numbers count source lines, including skipped ones.
pub fn parse_entries(content: &str, config: &DuplicateConfig) -> Vec<ListEntry> {
    let mut entries = Vec::new();

    for (idx, line) in content.split('\n').enumerate() {
        let trimmed = line.trim_end_matches('\r').trim();
        if trimmed.is_empty() || is_comment(trimmed, config) {
            continue;
        }
        entries.push(ListEntry {
            value: trimmed.to_string(),
            line_number: idx + 1,
        });
    }

    entries
}

fn is_comment(line: &str, config: &DuplicateConfig) -> bool {
    config
        .comment_prefixes
        .iter()
        .any(|prefix| line.starts_with(prefix.as_str()))
}

/// Whether the filename is list-typed per the configured extensions.
pub fn is_list_file(filename: &str, config: &DuplicateConfig) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    config
        .list_extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(ext))
}
