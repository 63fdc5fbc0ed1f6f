//! Classification of suppression entries as appropriate or inappropriate.
//!
//! An entry is appropriate if it carries a false-positive justification in
//! its notes, or if it expires within the allowed horizon. Everything else
//! is flagged so it gets re-evaluated instead of silently suppressing a
//! finding forever.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;

use crate::error::GateError;
use crate::model::SuppressionEntry;

/// Default horizon: a suppression may expire at most one year out.
pub const DEFAULT_MAX_SUPPRESS_DAYS: i64 = 365;

/// Default justification marker: "false positive" with any separator,
/// case-insensitive.
pub const DEFAULT_FALSE_POSITIVE_PATTERN: &str = r"(?i)false[\s_-]positive";

/// One inappropriate suppression entry, with enough detail to locate and
/// fix it without re-running the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressionViolation {
    pub package_url: String,
    pub vulnerability_names: Vec<String>,
}

impl std::fmt::Display for SuppressionViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "the suppression entry for {} ({}) contains neither a false-positive note nor an appropriate expiration date",
            self.package_url,
            self.vulnerability_names.join(", ")
        )
    }
}

/// Policy applied to a parsed suppression set.
#[derive(Debug, Clone)]
pub struct SuppressionPolicy {
    /// Entries must expire strictly before this cutoff.
    pub max_suppress_until: DateTime<Utc>,
    /// Notes matching this pattern mark an entry as a false positive.
    pub false_positive_pattern: Regex,
}

impl SuppressionPolicy {
    /// Policy with the default cutoff (now + 365 days) and the default
    /// false-positive pattern.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            max_suppress_until: now + Duration::days(DEFAULT_MAX_SUPPRESS_DAYS),
            false_positive_pattern: default_false_positive_pattern(),
        }
    }

    pub fn with_max_suppress_until(mut self, cutoff: DateTime<Utc>) -> Self {
        self.max_suppress_until = cutoff;
        self
    }

    pub fn with_false_positive_pattern(mut self, pattern: &str) -> Result<Self, GateError> {
        self.false_positive_pattern =
            Regex::new(pattern).map_err(|source| GateError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(self)
    }

    /// Returns the inappropriate entries as violations.
    ///
    /// An entry is inappropriate iff its notes do not match the
    /// false-positive pattern and its expiry is absent or not strictly
    /// before `max_suppress_until`. An empty result means the set passes.
    pub fn check(&self, entries: &[SuppressionEntry]) -> Vec<SuppressionViolation> {
        entries
            .iter()
            .filter(|entry| !self.is_appropriate(entry))
            .map(|entry| SuppressionViolation {
                package_url: entry.package_url.clone(),
                vulnerability_names: entry
                    .vulnerabilities
                    .iter()
                    .map(|v| v.name.clone())
                    .collect(),
            })
            .collect()
    }

    fn is_appropriate(&self, entry: &SuppressionEntry) -> bool {
        let false_positive = entry
            .notes
            .as_deref()
            .is_some_and(|notes| self.false_positive_pattern.is_match(notes));
        let bounded_expiry = entry
            .suppress_until
            .is_some_and(|until| until < self.max_suppress_until);
        false_positive || bounded_expiry
    }
}

fn default_false_positive_pattern() -> Regex {
    // The pattern is a compile-time constant; a panic here would be a bug
    // in the constant itself, caught by the tests below.
    #[allow(clippy::unwrap_used)]
    Regex::new(DEFAULT_FALSE_POSITIVE_PATTERN).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Vulnerability, VulnerabilityType};
    use chrono::TimeZone;

    fn entry(notes: Option<&str>, until: Option<DateTime<Utc>>) -> SuppressionEntry {
        let mut entry = SuppressionEntry::new(
            "pkg:maven/org.example/widget@1.0",
            vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-2024-0001")],
        )
        .with_suppress_until(until);
        if let Some(notes) = notes {
            entry = entry.with_notes(notes);
        }
        entry
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_false_positive_note_passes_without_expiry() {
        let policy = SuppressionPolicy::new(now());
        let entries = vec![entry(Some("False Positive: not reachable"), None)];
        assert!(policy.check(&entries).is_empty());
    }

    #[test]
    fn test_false_positive_pattern_accepts_separator_variants() {
        let policy = SuppressionPolicy::new(now());
        for notes in ["false positive", "FALSE-POSITIVE", "false_positive here"] {
            assert!(policy.check(&[entry(Some(notes), None)]).is_empty(), "{notes}");
        }
    }

    #[test]
    fn test_expiry_beyond_cutoff_is_flagged() {
        let policy = SuppressionPolicy::new(now());
        let entries = vec![entry(Some("fix later"), Some(now() + Duration::days(400)))];
        let violations = policy.check(&entries);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].package_url, "pkg:maven/org.example/widget@1.0");
        assert_eq!(violations[0].vulnerability_names, ["CVE-2024-0001"]);
    }

    #[test]
    fn test_bounded_expiry_passes() {
        let policy = SuppressionPolicy::new(now());
        let entries = vec![entry(Some("fix later"), Some(now() + Duration::days(30)))];
        assert!(policy.check(&entries).is_empty());
    }

    #[test]
    fn test_expiry_equal_to_cutoff_is_flagged() {
        let cutoff = now() + Duration::days(365);
        let policy = SuppressionPolicy::new(now());
        // strictly before, not equal
        let entries = vec![entry(Some("fix later"), Some(cutoff))];
        assert_eq!(policy.check(&entries).len(), 1);
    }

    #[test]
    fn test_entry_without_notes_or_expiry_is_flagged() {
        let policy = SuppressionPolicy::new(now());
        assert_eq!(policy.check(&[entry(None, None)]).len(), 1);
    }

    #[test]
    fn test_violation_display_names_package_and_vulnerabilities() {
        let violation = SuppressionViolation {
            package_url: "pkg:maven/a/b@1.0".to_string(),
            vulnerability_names: vec!["CVE-1".to_string(), "CVE-2".to_string()],
        };
        let rendered = violation.to_string();
        assert!(rendered.contains("pkg:maven/a/b@1.0"));
        assert!(rendered.contains("CVE-1, CVE-2"));
    }

    #[test]
    fn test_custom_pattern_rejected_when_invalid() {
        assert!(SuppressionPolicy::new(now())
            .with_false_positive_pattern("([unclosed")
            .is_err());
    }
}
