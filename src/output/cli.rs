use crate::license::LicenseEvaluation;
use crate::suppression::SuppressionViolation;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Package URL")]
    package_url: String,
    #[tabled(rename = "Vulnerabilities")]
    vulnerabilities: String,
}

#[derive(Tabled)]
struct LicenseFailureRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Reported licenses")]
    licenses: String,
}

#[derive(Tabled)]
struct StaleWhitelistRow {
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Expired")]
    expired: String,
}

pub fn print_suppression_violations(violations: &[SuppressionViolation]) {
    if violations.is_empty() {
        println!("All suppression entries are appropriate.");
        return;
    }

    println!();
    println!("Found {} inappropriate suppression entries:", violations.len());
    println!();

    let rows: Vec<ViolationRow> = violations
        .iter()
        .map(|v| ViolationRow {
            package_url: v.package_url.clone(),
            vulnerabilities: v.vulnerability_names.join(", "),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_license_failures(evaluation: &LicenseEvaluation) {
    println!();
    println!(
        "{} dependencies passed, {} failed the license check.",
        evaluation.passed.len(),
        evaluation.failed.len()
    );

    if evaluation.is_clean() {
        return;
    }

    println!();
    let rows: Vec<LicenseFailureRow> = evaluation
        .failures_by_module()
        .into_iter()
        .map(|(module, licenses)| LicenseFailureRow {
            module,
            licenses: if licenses.is_empty() {
                "<no license data>".to_string()
            } else {
                licenses.join(", ")
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_stale_whitelist(evaluation: &LicenseEvaluation) {
    if evaluation.stale_whitelist.is_empty() {
        return;
    }

    println!();
    println!(
        "{} whitelisted dependencies have expired:",
        evaluation.stale_whitelist.len()
    );
    println!();

    let rows: Vec<StaleWhitelistRow> = evaluation
        .stale_whitelist
        .iter()
        .map(|entry| StaleWhitelistRow {
            pattern: entry.module_name_pattern.as_str().to_string(),
            expired: entry.valid_until.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}
