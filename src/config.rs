//! Configuration file handling.
//!
//! This module provides loading and saving of quality-gate configuration
//! from a project-local TOML file (default: `quality-gate.toml` next to the
//! build files it gates).
//!
//! # Example Configuration
//!
//! ```toml
//! group = "com.example.product"
//!
//! [suppression_check]
//! skip = false
//! max_suppress_days = 365
//!
//! [license_check]
//! skip = false
//! additional_allowed_licenses = ["Unicode-DFS-2016"]
//! owned_dependencies = ['^com\.example(\.)?.*']
//!
//! [[license_check.white_listed_dependencies]]
//! pattern = '^org\.special:widget$'
//! valid_until = "2026-12-31"
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GateError;
use crate::license::{LicensePatch, LicensePolicy, NormalizerBundle};
use crate::model::{parse_suppress_until, WhiteListedDependency};
use crate::suppression::{SuppressionPolicy, DEFAULT_MAX_SUPPRESS_DAYS};

pub const DEFAULT_CONFIG_FILE: &str = "quality-gate.toml";

/// Application configuration.
///
/// All policy knobs resolve to immutable policy values
/// ([`SuppressionPolicy`], [`LicensePolicy`]) before any evaluator runs;
/// the evaluators never read configuration themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The organization's group identifier. The default ownership pattern
    /// for the license check is derived from its first two dot-separated
    /// segments.
    pub group: String,

    pub suppression_check: SuppressionCheckConfig,

    pub license_check: LicenseCheckConfig,
}

/// Settings for the suppression-file checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionCheckConfig {
    /// Skips the suppression check entirely when true.
    pub skip: bool,

    /// Location of the suppression file.
    pub suppression_file: PathBuf,

    /// How far out a suppression entry may expire, in days from now.
    pub max_suppress_days: i64,

    /// Pattern marking a suppression note as a false-positive
    /// justification. Default: case-insensitive "false positive" with any
    /// separator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub false_positive_pattern: Option<String>,
}

impl Default for SuppressionCheckConfig {
    fn default() -> Self {
        Self {
            skip: false,
            suppression_file: PathBuf::from("dependency-check-suppression.xml"),
            max_suppress_days: DEFAULT_MAX_SUPPRESS_DAYS,
            false_positive_pattern: None,
        }
    }
}

/// Settings for the license check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseCheckConfig {
    /// Skips the license check entirely when true.
    pub skip: bool,

    /// Replaces the default allow-list when non-empty.
    pub allowed_licenses: Vec<String>,

    /// Extends the allow-list without replacing it.
    pub additional_allowed_licenses: Vec<String>,

    /// Ownership patterns, matched against the module group or the
    /// `group:name` coordinate. When empty, one pattern is derived from
    /// `group`.
    pub owned_dependencies: Vec<String>,

    /// Time-bounded license-check exemptions.
    pub white_listed_dependencies: Vec<WhiteListEntry>,

    /// Additional license-name normalization rules file (JSON), merged
    /// over the built-in bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalizer_bundle: Option<PathBuf>,

    /// Coordinate-to-license patches for modules without license metadata,
    /// merged over the built-in patch table.
    pub patches: Vec<LicensePatch>,
}

/// One whitelist entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhiteListEntry {
    /// Anchored regex matched against the `group:name` coordinate.
    pub pattern: String,

    /// Expiry date (ISO-8601, midnight/UTC defaults apply). Absent means
    /// the exemption never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

impl WhiteListEntry {
    fn resolve(&self) -> Result<WhiteListedDependency, GateError> {
        let pattern = Regex::new(&self.pattern).map_err(|source| GateError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })?;
        let mut entry = WhiteListedDependency::new(pattern);
        if let Some(valid_until) = &self.valid_until {
            entry = entry.until(parse_suppress_until(valid_until)?);
        }
        Ok(entry)
    }
}

impl Config {
    /// Loads configuration from the given path, or from
    /// `quality-gate.toml` in the working directory.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }

    /// Resolves the suppression policy for a given reference time.
    pub fn suppression_policy(&self, now: DateTime<Utc>) -> Result<SuppressionPolicy, GateError> {
        let mut policy = SuppressionPolicy::new(now).with_max_suppress_until(
            now + chrono::Duration::days(self.suppression_check.max_suppress_days),
        );
        if let Some(pattern) = &self.suppression_check.false_positive_pattern {
            policy = policy.with_false_positive_pattern(pattern)?;
        }
        Ok(policy)
    }

    /// Resolves the license policy, reading the optional normalizer bundle
    /// file if configured.
    pub fn license_policy(&self) -> Result<LicensePolicy, GateError> {
        let mut policy = if self.license_check.owned_dependencies.is_empty() && !self.group.is_empty()
        {
            LicensePolicy::for_group(&self.group)?
        } else {
            LicensePolicy::default()
        };

        for pattern in &self.license_check.owned_dependencies {
            let compiled = Regex::new(pattern).map_err(|source| GateError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            policy.owned_dependency_patterns.push(compiled);
        }

        if !self.license_check.allowed_licenses.is_empty() {
            policy.allowed_licenses = self.license_check.allowed_licenses.iter().cloned().collect();
        }
        policy
            .allowed_licenses
            .extend(self.license_check.additional_allowed_licenses.iter().cloned());

        for entry in &self.license_check.white_listed_dependencies {
            policy.white_listed_dependencies.push(entry.resolve()?);
        }

        if let Some(bundle_path) = &self.license_check.normalizer_bundle {
            let content = fs::read_to_string(bundle_path).map_err(|source| GateError::ReadFile {
                path: bundle_path.clone(),
                source,
            })?;
            policy.normalizer = policy.normalizer.extend(NormalizerBundle::from_json(&content)?);
        }

        policy.patches.extend(self.license_check.patches.iter().cloned());

        Ok(policy)
    }
}
