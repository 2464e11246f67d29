//! Domain extraction from list-file content
//!
//! Pure text processing: no network access, fully deterministic. Each line is
//! normalized (scheme/`www.` stripped, truncated at the first `#`, `/`, or
//! `:`, lowercased) and kept only if it matches the domain shape
//! `label(.label)+.tld`. Comment lines (`#`, `//`) and blanks are skipped.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::Domain;

/// Domain shape accepted by the extractor
const DOMAIN_PATTERN: &str = r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(DOMAIN_PATTERN).expect("domain pattern is a valid regex")
    })
}

/// Normalize one line into a domain, or `None` if the line is blank, a
/// comment, or does not survive normalization as a valid domain.
pub(crate) fn normalize_line(line: &str) -> Option<Domain> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return None;
    }

    let mut candidate = trimmed;
    candidate = candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"))
        .unwrap_or(candidate);
    candidate = candidate.strip_prefix("www.").unwrap_or(candidate);

    // Drop inline comments, paths, and ports
    candidate = candidate.split('#').next().unwrap_or("").trim();
    candidate = candidate.split('/').next().unwrap_or("");
    candidate = candidate.split(':').next().unwrap_or("");
    let candidate = candidate.trim();

    if candidate.is_empty() || !domain_regex().is_match(candidate) {
        return None;
    }

    Some(Domain::new_unchecked(candidate.to_ascii_lowercase()))
}

/// Extract a deduplicated, insertion-ordered list of domains from raw text.
///
/// Malformed lines are silently filtered rather than reported; the caller
/// only learns that the result is empty.
pub fn extract_domains(content: &str) -> Vec<Domain> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();

    for line in content.lines() {
        if let Some(domain) = normalize_line(line) {
            if seen.insert(domain.clone()) {
                domains.push(domain);
            }
        }
    }

    domains
}
