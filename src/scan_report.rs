//! Parsing of the JUnit-style scan report produced by the vulnerability
//! scanner.
//!
//! The report is a `<testsuites>` log: one `<testsuite>` per scanned unit,
//! with `<testcase>` children. Each test case carries the vulnerability
//! identifier as `classname` and the package URL as `name`; a `<failure>`
//! child marks a finding that failed the scan, a `<skipped>` child marks a
//! finding that is already suppressed (its `message` attribute carries the
//! existing justification).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;

use crate::error::GateError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    /// Vulnerability identifier (e.g. a CVE or GHSA id).
    pub classname: String,
    /// Package URL of the affected dependency.
    pub name: String,
    pub failed: bool,
    pub failure_message: Option<String>,
    pub skipped: bool,
    pub skip_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSuite {
    pub name: String,
    pub tests: u32,
    pub failures: u32,
    pub skipped: u32,
    pub cases: Vec<TestCase>,
}

/// A parsed scan report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub suites: Vec<TestSuite>,
}

impl ScanReport {
    /// Test cases the scanner marked as failing.
    pub fn failing_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.suites
            .iter()
            .flat_map(|suite| suite.cases.iter())
            .filter(|case| case.failed)
    }

    /// Vulnerability identifiers the scanner marked as skipped, i.e.
    /// already suppressed and still present.
    pub fn skipped_vulnerabilities(&self) -> BTreeSet<&str> {
        self.suites
            .iter()
            .flat_map(|suite| suite.cases.iter())
            .filter(|case| case.skipped)
            .map(|case| case.classname.as_str())
            .collect()
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, GateError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn counter(element: &BytesStart<'_>, key: &[u8]) -> Result<u32, GateError> {
    Ok(attribute(element, key)?
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0))
}

fn start_suite(element: &BytesStart<'_>) -> Result<TestSuite, GateError> {
    Ok(TestSuite {
        name: attribute(element, b"name")?.unwrap_or_default(),
        tests: counter(element, b"tests")?,
        failures: counter(element, b"failures")?,
        skipped: counter(element, b"skipped")?,
        cases: Vec::new(),
    })
}

fn start_case(element: &BytesStart<'_>) -> Result<TestCase, GateError> {
    Ok(TestCase {
        classname: attribute(element, b"classname")?.unwrap_or_default(),
        name: attribute(element, b"name")?.unwrap_or_default(),
        ..TestCase::default()
    })
}

/// Parses a JUnit-style scan report.
pub fn parse_scan_report(document: &str) -> Result<ScanReport, GateError> {
    let mut reader = Reader::from_str(document);
    let mut report = ScanReport::default();
    let mut suite: Option<TestSuite> = None;
    let mut case: Option<TestCase> = None;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let self_closing = matches!(&event, Event::Empty(_));
                match e.name().as_ref() {
                    b"testsuite" => {
                        let parsed = start_suite(e)?;
                        if self_closing {
                            report.suites.push(parsed);
                        } else {
                            suite = Some(parsed);
                        }
                    }
                    b"testcase" => {
                        let parsed = start_case(e)?;
                        if self_closing {
                            if let Some(suite) = suite.as_mut() {
                                suite.cases.push(parsed);
                            }
                        } else {
                            case = Some(parsed);
                        }
                    }
                    b"failure" => {
                        if let Some(case) = case.as_mut() {
                            case.failed = true;
                            case.failure_message = attribute(e, b"message")?;
                        }
                    }
                    b"skipped" => {
                        if let Some(case) = case.as_mut() {
                            case.skipped = true;
                            case.skip_message = attribute(e, b"message")?;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"testcase" => {
                    if let (Some(finished), Some(suite)) = (case.take(), suite.as_mut()) {
                        suite.cases.push(finished);
                    }
                }
                b"testsuite" => {
                    if let Some(finished) = suite.take() {
                        report.suites.push(finished);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
    <testsuite name="pkg:maven/commons-fileupload/commons-fileupload@1.4" tests="2" failures="1" skipped="1">
        <testcase classname="CVE-2023-24998" name="pkg:maven/commons-fileupload/commons-fileupload@1.4">
            <failure message="CVSS 7.5"/>
        </testcase>
        <testcase classname="CVE-2016-1000031" name="pkg:maven/commons-fileupload/commons-fileupload@1.4">
            <skipped message="False positive: DiskFileItem is not used"/>
        </testcase>
    </testsuite>
    <testsuite name="pkg:maven/org.example/clean@2.0" tests="1" failures="0" skipped="0">
        <testcase classname="CVE-2020-0001" name="pkg:maven/org.example/clean@2.0"/>
    </testsuite>
</testsuites>
"#;

    #[test]
    fn test_parse_sample_report() {
        let report = parse_scan_report(SAMPLE).unwrap();
        assert_eq!(report.suites.len(), 2);
        assert_eq!(report.suites[0].failures, 1);
        assert_eq!(report.suites[0].skipped, 1);
        assert_eq!(report.suites[0].cases.len(), 2);
        assert_eq!(report.suites[1].cases.len(), 1);
        assert!(!report.suites[1].cases[0].failed);
    }

    #[test]
    fn test_failing_cases() {
        let report = parse_scan_report(SAMPLE).unwrap();
        let failing: Vec<&TestCase> = report.failing_cases().collect();
        assert_eq!(failing.len(), 1);
        assert_eq!(failing[0].classname, "CVE-2023-24998");
        assert_eq!(failing[0].failure_message.as_deref(), Some("CVSS 7.5"));
    }

    #[test]
    fn test_skipped_vulnerabilities() {
        let report = parse_scan_report(SAMPLE).unwrap();
        let skipped = report.skipped_vulnerabilities();
        assert_eq!(skipped.len(), 1);
        assert!(skipped.contains("CVE-2016-1000031"));
    }

    #[test]
    fn test_parse_rejects_non_well_formed_report() {
        assert!(parse_scan_report("<testsuites><testsuite>").is_err());
    }

    #[test]
    fn test_empty_report() {
        let report = parse_scan_report("<testsuites></testsuites>").unwrap();
        assert!(report.suites.is_empty());
        assert_eq!(report.failing_cases().count(), 0);
    }
}
