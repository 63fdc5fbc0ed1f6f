mod cli;
mod junit;

pub use cli::{print_license_failures, print_stale_whitelist, print_suppression_violations};
pub use junit::license_junit_report;

use crate::license::LicenseEvaluation;
use crate::suppression::SuppressionViolation;
use anyhow::Result;
use serde_json::json;

/// Output format for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

/// JSON rendition of a license evaluation for programmatic use.
pub fn license_json_report(evaluation: &LicenseEvaluation) -> Result<String> {
    let failed: Vec<_> = evaluation
        .failures_by_module()
        .into_iter()
        .map(|(module, licenses)| json!({ "module": module, "licenses": licenses }))
        .collect();
    let stale: Vec<String> = evaluation
        .stale_whitelist
        .iter()
        .map(|entry| entry.module_name_pattern.as_str().to_string())
        .collect();
    let value = json!({
        "passed": evaluation.passed.len(),
        "failed": failed,
        "staleWhitelist": stale,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// JSON rendition of suppression violations for programmatic use.
pub fn suppression_json_report(violations: &[SuppressionViolation]) -> Result<String> {
    Ok(serde_json::to_string_pretty(violations)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("table"), Ok(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("JSON"), Ok(OutputFormat::Json));
        assert!(OutputFormat::from_str("yaml").is_err());
    }

    #[test]
    fn test_suppression_json_report() {
        let violations = vec![SuppressionViolation {
            package_url: "pkg:maven/a/b@1.0".to_string(),
            vulnerability_names: vec!["CVE-1".to_string()],
        }];
        let rendered = suppression_json_report(&violations).unwrap();
        assert!(rendered.contains("pkg:maven/a/b@1.0"));
        assert!(rendered.contains("CVE-1"));
    }
}
