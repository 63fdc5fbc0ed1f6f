//! License policy evaluation.
//!
//! Each reported dependency runs through a fixed filter order:
//!
//! 1. ownership exclusion — modules produced by the organization itself are
//!    not evaluated at all;
//! 2. whitelist exemption — modules matching a non-expired whitelist entry
//!    pass without license inspection;
//! 3. allow-list check — every reported license name, normalized, must be a
//!    member of the allowed set. No license data at all is a failure
//!    (fail-closed).
//!
//! The order is deliberate and not commutative: a module matching both an
//! ownership pattern and a whitelist entry is excluded, not exempted.
//! Evaluation returns structured results; deciding whether a non-empty
//! failure list fails the build is the caller's job.

mod normalize;
mod report;

pub use normalize::{NormalizationRule, NormalizerBundle};
pub use report::parse_license_report;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::GateError;
use crate::model::{DependencyRecord, WhiteListedDependency};

/// A coordinate-to-license patch for modules that ship no license metadata
/// even though their license is well known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePatch {
    pub group: String,
    pub name: String,
    /// Restrict the patch to one version; `None` applies to all versions.
    #[serde(default)]
    pub version: Option<String>,
    pub licenses: Vec<String>,
}

impl LicensePatch {
    fn applies_to(&self, record: &DependencyRecord) -> bool {
        record.group == self.group
            && record.name == self.name
            && self.version.as_deref().is_none_or(|v| record.version == v)
    }
}

/// One failing dependency with the unnormalized license names it reported.
/// An empty license list means the module carried no license data at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDependency {
    pub record: DependencyRecord,
    pub licenses: Vec<String>,
}

/// The outcome of a license policy evaluation.
#[derive(Debug, Clone, Default)]
pub struct LicenseEvaluation {
    pub passed: Vec<DependencyRecord>,
    pub failed: Vec<FailedDependency>,
    /// Whitelist entries whose expiry has already passed. They cause no
    /// failures by themselves, but the matched dependency may have been
    /// silently un-excluded, so they are surfaced as warnings.
    pub stale_whitelist: Vec<WhiteListedDependency>,
}

impl LicenseEvaluation {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failing license names grouped by module coordinate, one row per
    /// distinct failing module.
    pub fn failures_by_module(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for failure in &self.failed {
            grouped
                .entry(failure.record.module_name())
                .or_default()
                .extend(failure.licenses.iter().cloned());
        }
        grouped
    }
}

/// The organization's license policy, fully resolved before evaluation.
#[derive(Debug, Clone)]
pub struct LicensePolicy {
    pub allowed_licenses: BTreeSet<String>,
    /// Modules matching any of these patterns are owned by the organization
    /// and excluded from checking entirely.
    pub owned_dependency_patterns: Vec<Regex>,
    pub white_listed_dependencies: Vec<WhiteListedDependency>,
    pub normalizer: NormalizerBundle,
    pub patches: Vec<LicensePatch>,
}

impl Default for LicensePolicy {
    fn default() -> Self {
        Self {
            allowed_licenses: default_allowed_licenses(),
            owned_dependency_patterns: Vec::new(),
            white_listed_dependencies: Vec::new(),
            normalizer: NormalizerBundle::builtin(),
            patches: default_license_patches(),
        }
    }
}

impl LicensePolicy {
    /// Default policy with the ownership pattern derived from the
    /// organization's group identifier.
    pub fn for_group(group: &str) -> Result<Self, GateError> {
        Ok(Self {
            owned_dependency_patterns: vec![owned_pattern_for_group(group)?],
            ..Self::default()
        })
    }

    pub fn evaluate(&self, dependencies: &[DependencyRecord], now: DateTime<Utc>) -> LicenseEvaluation {
        let active_whitelist: Vec<&WhiteListedDependency> = self
            .white_listed_dependencies
            .iter()
            .filter(|entry| entry.is_valid(now))
            .collect();

        let mut evaluation = LicenseEvaluation {
            stale_whitelist: self
                .white_listed_dependencies
                .iter()
                .filter(|entry| entry.is_expired(now))
                .cloned()
                .collect(),
            ..LicenseEvaluation::default()
        };

        for record in dependencies {
            // Ownership is checked before the whitelist: a module matching
            // both is excluded, not exempted.
            if self.is_owned(record) {
                continue;
            }

            let module_name = record.module_name();
            if active_whitelist.iter().any(|entry| entry.matches(&module_name)) {
                evaluation.passed.push(record.clone());
                continue;
            }

            let licenses = self.effective_licenses(record);
            let all_allowed = !licenses.is_empty()
                && licenses
                    .iter()
                    .all(|license| self.allowed_licenses.contains(self.normalizer.normalize(license)));

            if all_allowed {
                evaluation.passed.push(record.clone());
            } else {
                evaluation.failed.push(FailedDependency {
                    record: record.clone(),
                    licenses,
                });
            }
        }

        evaluation
    }

    fn is_owned(&self, record: &DependencyRecord) -> bool {
        let module_name = record.module_name();
        self.owned_dependency_patterns
            .iter()
            .any(|pattern| pattern.is_match(&record.group) || pattern.is_match(&module_name))
    }

    fn effective_licenses(&self, record: &DependencyRecord) -> Vec<String> {
        if record.licenses.is_empty() {
            if let Some(patch) = self.patches.iter().find(|patch| patch.applies_to(record)) {
                return patch.licenses.clone();
            }
        }
        record.licenses.clone()
    }
}

/// Derives the default ownership pattern from a group identifier: the first
/// two dot-separated segments, anchored. `com.example.sub.item` becomes
/// `^com\.example(\.)?.*`.
pub fn owned_pattern_for_group(group: &str) -> Result<Regex, GateError> {
    let prefix: String = group.split('.').take(2).collect::<Vec<_>>().join(".");
    let pattern = format!("^{}(\\.)?.*", regex::escape(&prefix));
    Regex::new(&pattern).map_err(|source| GateError::InvalidPattern { pattern, source })
}

/// The default allow-list of license names.
pub fn default_allowed_licenses() -> BTreeSet<String> {
    [
        "MIT License",
        "MIT-0",
        "Apache License, Version 2.0",
        "BSD Zero Clause License",
        "The 2-Clause BSD License",
        "The 3-Clause BSD License",
        "GNU GENERAL PUBLIC LICENSE, Version 2 + Classpath Exception",
        "GNU LESSER GENERAL PUBLIC LICENSE, Version 2.1",
        "GNU Lesser General Public License v3.0",
        "Go License",
        "Indiana University Extreme! Lab Software License",
        "COMMON DEVELOPMENT AND DISTRIBUTION LICENSE (CDDL) Version 1.0",
        "Eclipse Public License - v 1.0",
        "Eclipse Public License - v 2.0",
        "PUBLIC DOMAIN",
        // essentially the MIT License
        "Bouncy Castle Licence",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Built-in patches for modules known to ship without license metadata.
pub fn default_license_patches() -> Vec<LicensePatch> {
    vec![
        LicensePatch {
            group: "org.antlr".to_string(),
            name: "antlr-runtime".to_string(),
            version: None,
            licenses: vec!["BSD licence".to_string()],
        },
        LicensePatch {
            group: "org.jetbrains.kotlinx".to_string(),
            name: "kotlinx-coroutines-core".to_string(),
            version: Some("1.6.4".to_string()),
            licenses: vec!["Apache License, Version 2.0".to_string()],
        },
        LicensePatch {
            group: "org.jetbrains.kotlin".to_string(),
            name: "kotlin-stdlib-common".to_string(),
            version: Some("1.9.20".to_string()),
            licenses: vec!["Apache License, Version 2.0".to_string()],
        },
    ]
}
