//! Generation of suppression sets from scan reports.
//!
//! Every failing test case in the report becomes a new suppression entry;
//! entries from a previous suppression set whose vulnerabilities the report
//! still marks as skipped are carried forward, narrowed to the still-relevant
//! subset. Carried-forward and newly generated entries address disjoint
//! vulnerability/test-case pairs, so the merge never duplicates a pair.

use chrono::{DateTime, Utc};

use crate::model::{SuppressionEntry, Vulnerability, VulnerabilityType};
use crate::scan_report::ScanReport;

/// Builds a suppression set from a scan report, optionally merging a
/// previous set and applying a new expiry cutoff.
///
/// The cutoff is applied to newly generated entries as-is, and to
/// carried-forward entries only when they were not originally indefinite:
/// an entry a human marked as "never expires" stays that way.
pub fn generate(
    report: &ScanReport,
    previous: Option<&[SuppressionEntry]>,
    suppress_until: Option<DateTime<Utc>>,
) -> Vec<SuppressionEntry> {
    let skipped = report.skipped_vulnerabilities();

    let carried_forward = previous.unwrap_or_default().iter().filter_map(|entry| {
        let still_suppressed: Vec<Vulnerability> = entry
            .vulnerabilities
            .iter()
            .filter(|v| skipped.contains(v.name.as_str()))
            .cloned()
            .collect();
        if still_suppressed.is_empty() {
            return None;
        }
        let until = entry
            .suppress_until
            .map(|original| suppress_until.unwrap_or(original));
        Some(
            entry
                .clone()
                .with_vulnerabilities(still_suppressed)
                .with_suppress_until(until),
        )
    });

    let new_entries = report.failing_cases().map(|case| {
        let notes = case
            .skip_message
            .clone()
            .unwrap_or_else(|| placeholder_note(&case.classname));
        SuppressionEntry::new(
            &case.name,
            vec![Vulnerability::new(
                VulnerabilityType::VulnerabilityName,
                &case.classname,
            )],
        )
        .with_notes(notes)
        .with_suppress_until(suppress_until)
    });

    carried_forward.chain(new_entries).collect()
}

/// Rewrites the expiry of every entry to the given cutoff, preserving
/// indefinite entries.
pub fn update(
    entries: &[SuppressionEntry],
    suppress_until: Option<DateTime<Utc>>,
) -> Vec<SuppressionEntry> {
    entries
        .iter()
        .map(|entry| {
            let until = entry
                .suppress_until
                .map(|original| suppress_until.unwrap_or(original));
            entry.clone().with_suppress_until(until)
        })
        .collect()
}

fn placeholder_note(vulnerability: &str) -> String {
    format!(
        "TODO enter reason why this can be suppressed or otherwise fix it!\n\
         see details on http://web.nvd.nist.gov/view/vuln/detail?vulnId={vulnerability}"
    )
}
