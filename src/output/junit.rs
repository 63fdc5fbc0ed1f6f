//! JUnit XML rendition of the license check, one test suite per failing
//! module, for CI servers that ingest JUnit reports.

use quick_xml::escape::escape;

use crate::license::LicenseEvaluation;

pub fn license_junit_report(evaluation: &LicenseEvaluation) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<testsuites>\n");

    for (module, licenses) in evaluation.failures_by_module() {
        let module = escape(module.as_str());
        let message = if licenses.is_empty() {
            "no license data was reported for this module".to_string()
        } else {
            format!("none of the following licenses is allowed: {}", licenses.join(", "))
        };
        out.push_str(&format!(
            "    <testsuite name=\"{module}\" tests=\"1\" skipped=\"0\" failures=\"1\">\n"
        ));
        out.push_str(&format!(
            "        <testcase name=\"{module}\" classname=\"license-check\">\n"
        ));
        out.push_str(&format!(
            "            <failure message=\"{}\"/>\n",
            escape(message.as_str())
        ));
        out.push_str("        </testcase>\n");
        out.push_str("    </testsuite>\n");
    }

    out.push_str("</testsuites>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::FailedDependency;
    use crate::model::{DependencyOrigin, DependencyRecord};
    use crate::scan_report::parse_scan_report;

    fn evaluation_with_failure(licenses: &[&str]) -> LicenseEvaluation {
        LicenseEvaluation {
            failed: vec![FailedDependency {
                record: DependencyRecord::new("org.example", "widget", "1.0", DependencyOrigin::Direct),
                licenses: licenses.iter().map(|l| l.to_string()).collect(),
            }],
            ..LicenseEvaluation::default()
        }
    }

    #[test]
    fn test_report_is_well_formed_and_carries_failure() {
        let rendered = license_junit_report(&evaluation_with_failure(&["SSPL & friends"]));
        let parsed = parse_scan_report(&rendered).unwrap();
        assert_eq!(parsed.suites.len(), 1);
        assert_eq!(parsed.suites[0].name, "org.example:widget");
        assert_eq!(parsed.suites[0].failures, 1);
        let case = &parsed.suites[0].cases[0];
        assert!(case.failed);
        assert!(case.failure_message.as_deref().unwrap().contains("SSPL & friends"));
    }

    #[test]
    fn test_missing_license_data_message() {
        let rendered = license_junit_report(&evaluation_with_failure(&[]));
        assert!(rendered.contains("no license data was reported"));
    }

    #[test]
    fn test_clean_evaluation_renders_empty_suites() {
        let rendered = license_junit_report(&LicenseEvaluation::default());
        let parsed = parse_scan_report(&rendered).unwrap();
        assert!(parsed.suites.is_empty());
    }
}
