use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// The kind of identifier a suppression entry uses to name a finding.
///
/// Mirrors the child tags of the DependencyCheck suppression schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VulnerabilityType {
    VulnerabilityName,
    Cve,
    Cpe,
    Gav,
}

impl VulnerabilityType {
    /// The XML tag name used for this identifier kind.
    pub fn node_name(&self) -> &'static str {
        match self {
            VulnerabilityType::VulnerabilityName => "vulnerabilityName",
            VulnerabilityType::Cve => "cve",
            VulnerabilityType::Cpe => "cpe",
            VulnerabilityType::Gav => "gav",
        }
    }

    pub fn from_node_name(name: &str) -> Option<Self> {
        match name {
            "vulnerabilityName" => Some(VulnerabilityType::VulnerabilityName),
            "cve" => Some(VulnerabilityType::Cve),
            "cpe" => Some(VulnerabilityType::Cpe),
            "gav" => Some(VulnerabilityType::Gav),
            _ => None,
        }
    }
}

/// One reported finding identified by a suppression entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub kind: VulnerabilityType,
    pub name: String,
}

impl Vulnerability {
    pub fn new(kind: VulnerabilityType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A policy record stating that specific findings for a specific package are
/// accepted, optionally until a given date.
///
/// Entries are never mutated in place; policy changes go through the
/// `with_*` constructors so the original record stays intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionEntry {
    pub package_url: String,
    /// Whether `package_url` is a regex pattern rather than a literal purl.
    pub package_url_is_pattern: bool,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Expiry of the suppression; `None` means it never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_until: Option<DateTime<Utc>>,
}

impl SuppressionEntry {
    pub fn new(package_url: impl Into<String>, vulnerabilities: Vec<Vulnerability>) -> Self {
        Self {
            package_url: package_url.into(),
            package_url_is_pattern: false,
            vulnerabilities,
            notes: None,
            suppress_until: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_suppress_until(mut self, until: Option<DateTime<Utc>>) -> Self {
        self.suppress_until = until;
        self
    }

    pub fn as_pattern(mut self) -> Self {
        self.package_url_is_pattern = true;
        self
    }

    /// Copy with the vulnerability list replaced.
    pub fn with_vulnerabilities(mut self, vulnerabilities: Vec<Vulnerability>) -> Self {
        self.vulnerabilities = vulnerabilities;
        self
    }

    pub fn vulnerability_names(&self) -> Vec<&str> {
        self.vulnerabilities.iter().map(|v| v.name.as_str()).collect()
    }
}

/// The zone suppression expiry dates default to when the document carries no
/// offset, and the default target zone for serialization.
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parses a suppression expiry attribute.
///
/// Accepts an ISO-8601 calendar date, optionally followed by a time-of-day
/// and a zone offset. A missing time-of-day means midnight; a missing offset
/// means UTC.
pub fn parse_suppress_until(value: &str) -> Result<DateTime<Utc>, GateError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(GateError::InvalidTimestamp {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_date_only_defaults_to_midnight_utc() {
        let parsed = parse_suppress_until("2024-06-07").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_time_without_offset_defaults_to_utc() {
        let parsed = parse_suppress_until("2024-06-07T13:45:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 7, 13, 45, 30).unwrap());
    }

    #[test]
    fn test_parse_date_time_with_offset() {
        let parsed = parse_suppress_until("2024-06-07T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap());
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_suppress_until("next tuesday").is_err());
        assert!(parse_suppress_until("").is_err());
    }

    #[test]
    fn test_vulnerability_type_node_names_round_trip() {
        for kind in [
            VulnerabilityType::VulnerabilityName,
            VulnerabilityType::Cve,
            VulnerabilityType::Cpe,
            VulnerabilityType::Gav,
        ] {
            assert_eq!(VulnerabilityType::from_node_name(kind.node_name()), Some(kind));
        }
        assert_eq!(VulnerabilityType::from_node_name("notes"), None);
    }

    #[test]
    fn test_copy_on_write_leaves_original_untouched() {
        let original = SuppressionEntry::new(
            "pkg:maven/commons-fileupload/commons-fileupload@1.4",
            vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-2023-1234")],
        );
        let updated = original
            .clone()
            .with_suppress_until(Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));

        assert!(original.suppress_until.is_none());
        assert!(updated.suppress_until.is_some());
        assert_eq!(original.package_url, updated.package_url);
    }
}
