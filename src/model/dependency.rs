use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Where a dependency record came from in the license report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyOrigin {
    /// Resolved directly from the build's own dependency graph.
    Direct,
    /// Pulled in through an imported module bundle (transitive data source).
    Imported,
}

/// One dependency as reported by the external license-report generator.
///
/// Read-only input to the license policy evaluator; the evaluator never
/// mutates these, it only classifies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub group: String,
    pub name: String,
    pub version: String,
    /// All license names reported for this module, unnormalized. May be
    /// empty when the upstream metadata carries no license at all.
    pub licenses: Vec<String>,
    pub origin: DependencyOrigin,
}

impl DependencyRecord {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        origin: DependencyOrigin,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            licenses: Vec::new(),
            origin,
        }
    }

    pub fn with_licenses(mut self, licenses: Vec<String>) -> Self {
        self.licenses = licenses;
        self
    }

    /// The `group:name` coordinate used for pattern matching and reporting.
    pub fn module_name(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.group, self.name)
        }
    }

    /// Full `group:name:version` coordinate.
    pub fn module_coordinate(&self) -> String {
        format!("{}:{}", self.module_name(), self.version)
    }
}

/// Converts a Maven package URL into a `group:name:version` coordinate.
///
/// Returns `None` for anything that is not a `pkg:maven/...` purl.
pub fn purl_to_module_coordinate(purl: &str) -> Option<String> {
    let rest = purl.strip_prefix("pkg:maven/")?;
    let (group, rest) = rest.split_once('/')?;
    let (name, version) = rest.split_once('@')?;
    if group.is_empty() || name.is_empty() || version.is_empty() {
        return None;
    }
    Some(format!("{group}:{name}:{version}"))
}

/// A module temporarily exempted from license checking.
///
/// The default expiry is the distant-future sentinel, meaning the exemption
/// never expires. An entry is expired iff `valid_until < now`.
#[derive(Debug, Clone)]
pub struct WhiteListedDependency {
    pub module_name_pattern: Regex,
    pub valid_until: DateTime<Utc>,
}

impl WhiteListedDependency {
    pub fn new(module_name_pattern: Regex) -> Self {
        Self {
            module_name_pattern,
            valid_until: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = valid_until;
        self
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.valid_until >= now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_valid(now)
    }

    pub fn matches(&self, module_name: &str) -> bool {
        self.module_name_pattern.is_match(module_name)
    }
}
