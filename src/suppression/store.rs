//! Parsing and serialization of DependencyCheck suppression documents.
//!
//! The document is a `<suppressions>` root wrapping `<suppress>` entries.
//! Each entry optionally carries an `until` attribute (ISO-8601 date with
//! optional time and zone offset), a `<notes>` child, exactly one
//! `<packageUrl>` child with a boolean `regex` attribute, and one or more
//! vulnerability-identifier children tagged by type.
//!
//! Malformed entries (no package URL, no identifiable vulnerability) are
//! dropped; a document that is not well-formed XML is a hard error.

use chrono::{DateTime, FixedOffset, Utc};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::GateError;
use crate::model::{parse_suppress_until, SuppressionEntry, Vulnerability, VulnerabilityType};

const SUPPRESSIONS_XMLNS: &str =
    "https://jeremylong.github.io/DependencyCheck/dependency-suppression.1.3.xsd";

#[derive(Default)]
struct PendingEntry {
    suppress_until: Option<DateTime<Utc>>,
    notes: Option<String>,
    package_url: Option<String>,
    package_url_is_pattern: bool,
    vulnerabilities: Vec<Vulnerability>,
}

impl PendingEntry {
    fn into_entry(self) -> Option<SuppressionEntry> {
        let package_url = self.package_url.filter(|url| !url.is_empty())?;
        if self.vulnerabilities.is_empty() {
            return None;
        }
        Some(SuppressionEntry {
            package_url,
            package_url_is_pattern: self.package_url_is_pattern,
            vulnerabilities: self.vulnerabilities,
            notes: self.notes,
            suppress_until: self.suppress_until,
        })
    }
}

enum Child {
    Notes,
    PackageUrl,
    Vulnerability(VulnerabilityType),
}

/// Parses a suppression document into an ordered sequence of entries.
pub fn parse_suppressions(document: &str) -> Result<Vec<SuppressionEntry>, GateError> {
    let mut reader = Reader::from_str(document);
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut current_child: Option<Child> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "suppress" {
                    let mut entry = PendingEntry::default();
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"until" {
                            let value = attr.unescape_value()?;
                            entry.suppress_until = Some(parse_suppress_until(&value)?);
                        }
                    }
                    pending = Some(entry);
                    current_child = None;
                } else if let Some(entry) = pending.as_mut() {
                    text.clear();
                    current_child = match name.as_str() {
                        "notes" => Some(Child::Notes),
                        "packageUrl" => {
                            entry.package_url_is_pattern = false;
                            for attr in e.attributes() {
                                let attr = attr?;
                                if attr.key.as_ref() == b"regex" {
                                    entry.package_url_is_pattern =
                                        attr.unescape_value()?.as_ref() == "true";
                                }
                            }
                            Some(Child::PackageUrl)
                        }
                        other => VulnerabilityType::from_node_name(other).map(Child::Vulnerability),
                    };
                }
            }
            Event::Text(t) => {
                if current_child.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if current_child.is_some() {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"suppress" {
                    if let Some(entry) = pending.take().and_then(PendingEntry::into_entry) {
                        entries.push(entry);
                    }
                } else if let (Some(child), Some(entry)) = (current_child.take(), pending.as_mut())
                {
                    match child {
                        Child::Notes => entry.notes = Some(normalize_notes(&text)),
                        Child::PackageUrl => entry.package_url = Some(text.trim().to_string()),
                        Child::Vulnerability(kind) => {
                            let name = text.trim();
                            if !name.is_empty() {
                                entry.vulnerabilities.push(Vulnerability::new(kind, name));
                            }
                        }
                    }
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Serializes entries back into a suppression document.
///
/// Entries are written in ascending order of expiry; entries without an
/// expiry sort last (indefinite). The expiry is rendered as the calendar
/// date in the target zone.
pub fn serialize_suppressions(entries: &[SuppressionEntry], zone: FixedOffset) -> String {
    let mut ordered: Vec<&SuppressionEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.suppress_until.unwrap_or(DateTime::<Utc>::MAX_UTC));

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<suppressions xmlns=\"{SUPPRESSIONS_XMLNS}\">\n"));
    for entry in ordered {
        write_entry(&mut out, entry, zone);
        out.push('\n');
    }
    out.push_str("</suppressions>\n");
    out
}

fn write_entry(out: &mut String, entry: &SuppressionEntry, zone: FixedOffset) {
    match entry.suppress_until {
        Some(until) => {
            let local = until.with_timezone(&zone);
            out.push_str(&format!("    <suppress until=\"{}\">\n", local.format("%Y-%m-%d")));
        }
        None => out.push_str("    <suppress>\n"),
    }

    if let Some(notes) = &entry.notes {
        out.push_str("        <notes><![CDATA[\n");
        for line in normalize_notes(notes).lines() {
            out.push_str("            ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("        ]]></notes>\n");
    }

    let url = escape(entry.package_url.as_str());
    if entry.package_url_is_pattern {
        out.push_str(&format!("        <packageUrl regex=\"true\">{url}</packageUrl>\n"));
    } else {
        out.push_str(&format!("        <packageUrl>{url}</packageUrl>\n"));
    }

    for vulnerability in &entry.vulnerabilities {
        let tag = vulnerability.kind.node_name();
        out.push_str(&format!("        <{tag}>{}</{tag}>\n", escape(vulnerability.name.as_str())));
    }

    out.push_str("    </suppress>\n");
}

/// Collapses per-line indentation so notes survive re-indentation on
/// round-trips through the document format.
fn normalize_notes(notes: &str) -> String {
    notes
        .trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::utc_offset;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<suppressions xmlns="https://jeremylong.github.io/DependencyCheck/dependency-suppression.1.3.xsd">
    <suppress until="2024-06-07">
        <notes><![CDATA[
            False positive: parser is never fed untrusted input
        ]]></notes>
        <packageUrl regex="true">^pkg:maven/org\.example/.*$</packageUrl>
        <cve>CVE-2023-1234</cve>
        <vulnerabilityName>GHSA-aaaa-bbbb-cccc</vulnerabilityName>
    </suppress>
    <suppress>
        <packageUrl>pkg:maven/commons-fileupload/commons-fileupload@1.4</packageUrl>
        <cve>CVE-2023-24998</cve>
    </suppress>
</suppressions>
"#;

    #[test]
    fn test_parse_sample_document() {
        let entries = parse_suppressions(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert!(first.package_url_is_pattern);
        assert_eq!(first.package_url, r"^pkg:maven/org\.example/.*$");
        assert_eq!(
            first.suppress_until,
            Some(Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap())
        );
        assert_eq!(
            first.notes.as_deref(),
            Some("False positive: parser is never fed untrusted input")
        );
        assert_eq!(first.vulnerabilities.len(), 2);
        assert_eq!(first.vulnerabilities[0].kind, VulnerabilityType::Cve);
        assert_eq!(first.vulnerabilities[1].name, "GHSA-aaaa-bbbb-cccc");

        let second = &entries[1];
        assert!(!second.package_url_is_pattern);
        assert!(second.suppress_until.is_none());
        assert!(second.notes.is_none());
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<suppressions xmlns="https://jeremylong.github.io/DependencyCheck/dependency-suppression.1.3.xsd">
</suppressions>"#;
        assert!(parse_suppressions(doc).unwrap().is_empty());
    }

    #[test]
    fn test_parse_drops_entry_without_package_url() {
        let doc = r#"<suppressions>
    <suppress>
        <notes>orphaned</notes>
        <cve>CVE-2020-0001</cve>
    </suppress>
    <suppress>
        <packageUrl>pkg:maven/a/b@1.0</packageUrl>
        <cve>CVE-2020-0002</cve>
    </suppress>
</suppressions>"#;
        let entries = parse_suppressions(doc).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vulnerabilities[0].name, "CVE-2020-0002");
    }

    #[test]
    fn test_parse_drops_entry_without_vulnerability() {
        let doc = r#"<suppressions>
    <suppress>
        <packageUrl>pkg:maven/a/b@1.0</packageUrl>
    </suppress>
</suppressions>"#;
        assert!(parse_suppressions(doc).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_well_formed_document() {
        assert!(parse_suppressions("<suppressions><suppress>").is_err());
    }

    #[test]
    fn test_serialize_orders_indefinite_entries_last() {
        let later = SuppressionEntry::new(
            "pkg:maven/a/later@1.0",
            vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-1")],
        )
        .with_suppress_until(Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let sooner = SuppressionEntry::new(
            "pkg:maven/a/sooner@1.0",
            vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-2")],
        )
        .with_suppress_until(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let indefinite = SuppressionEntry::new(
            "pkg:maven/a/indefinite@1.0",
            vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-3")],
        );

        let doc = serialize_suppressions(&[indefinite, later, sooner], utc_offset());
        let parsed = parse_suppressions(&doc).unwrap();
        let urls: Vec<&str> = parsed.iter().map(|e| e.package_url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "pkg:maven/a/sooner@1.0",
                "pkg:maven/a/later@1.0",
                "pkg:maven/a/indefinite@1.0"
            ]
        );
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let entries = vec![
            SuppressionEntry::new(
                r"^pkg:maven/org\.example/.*$",
                vec![
                    Vulnerability::new(VulnerabilityType::Cve, "CVE-2023-1234"),
                    Vulnerability::new(VulnerabilityType::VulnerabilityName, "GHSA-xxxx"),
                ],
            )
            .as_pattern()
            .with_notes("False positive: not reachable\nsecond line")
            .with_suppress_until(Some(Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap())),
            SuppressionEntry::new(
                "pkg:maven/commons-fileupload/commons-fileupload@1.4",
                vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-2023-24998")],
            ),
        ];

        let doc = serialize_suppressions(&entries, utc_offset());
        let parsed = parse_suppressions(&doc).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_serialize_escapes_markup_in_values() {
        let entries = vec![SuppressionEntry::new(
            "pkg:maven/a/b@1.0",
            vec![Vulnerability::new(
                VulnerabilityType::VulnerabilityName,
                "uses <script> & friends",
            )],
        )];
        let doc = serialize_suppressions(&entries, utc_offset());
        assert!(doc.contains("uses &lt;script&gt; &amp; friends"));
        let parsed = parse_suppressions(&doc).unwrap();
        assert_eq!(parsed, entries);
    }
}
