//! Record filtering: name patterns and identifier allow-lists.

use std::collections::HashSet;

use regex::RegexBuilder;
use tracing::debug;

use healthpull_shared::{HealthPullError, RawRecord, Result};

/// A case-insensitive pattern set matched against a designated text field,
/// e.g. disease names (`mpox`, `cholera`, `covid`) against data element names.
#[derive(Debug, Clone)]
pub struct NameFilter {
    regex: regex::Regex,
}

impl NameFilter {
    /// Compile a pattern set into one alternation. Each pattern is a regex;
    /// plain substrings work as-is. An invalid pattern is a config error.
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(HealthPullError::config("empty name filter pattern set"));
        }

        let regex = RegexBuilder::new(&patterns.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| HealthPullError::config(format!("invalid filter pattern: {e}")))?;

        Ok(Self { regex })
    }

    /// Whether a field value matches the pattern set.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Keep only records whose `field` text matches the filter.
///
/// Records without the field (or with a non-string value) never match.
/// Applying the same filter twice yields the same result as applying it once.
pub fn filter_by_name(records: Vec<RawRecord>, field: &str, filter: &NameFilter) -> Vec<RawRecord> {
    let before = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| {
            r.get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|s| filter.matches(s))
        })
        .collect();

    debug!(before, after = kept.len(), field, "name filter applied");
    kept
}

/// Keep only records whose `field` identifier is in the allow-list.
pub fn filter_by_ids(
    records: Vec<RawRecord>,
    field: &str,
    allow_list: &HashSet<String>,
) -> Vec<RawRecord> {
    records
        .into_iter()
        .filter(|r| {
            r.get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|id| allow_list.contains(id))
        })
        .collect()
}
