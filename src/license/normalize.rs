//! License-name normalization.
//!
//! Upstream POM/manifest metadata reports license names inconsistently
//! ("Apache-2.0", "The Apache Software License, Version 2.0", ...), so
//! reported names are collapsed to a canonical spelling before the
//! allow-list comparison. The rules live in a bundle that can be extended
//! or replaced from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// One equivalence rule: any alias (case-insensitive) maps to `canonical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl NormalizationRule {
    pub fn new(canonical: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.into(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
        }
    }

    fn matches(&self, license: &str) -> bool {
        self.canonical.eq_ignore_ascii_case(license)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(license))
    }
}

/// An ordered bundle of normalization rules; the first matching rule wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerBundle {
    #[serde(default)]
    pub rules: Vec<NormalizationRule>,
}

impl NormalizerBundle {
    /// The built-in rules covering the common SPDX/common-name variants of
    /// the default allow-list.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                NormalizationRule::new(
                    "MIT License",
                    &["MIT", "The MIT License", "The MIT License (MIT)"],
                ),
                NormalizationRule::new("MIT-0", &["MIT No Attribution"]),
                NormalizationRule::new(
                    "Apache License, Version 2.0",
                    &[
                        "Apache-2.0",
                        "Apache 2.0",
                        "Apache License 2.0",
                        "The Apache License, Version 2.0",
                        "The Apache Software License, Version 2.0",
                        "ASL 2.0",
                    ],
                ),
                NormalizationRule::new("BSD Zero Clause License", &["0BSD", "BSD-0-Clause"]),
                NormalizationRule::new(
                    "The 2-Clause BSD License",
                    &[
                        "BSD-2-Clause",
                        "The BSD 2-Clause License",
                        "BSD 2-Clause \"Simplified\" License",
                    ],
                ),
                NormalizationRule::new(
                    "The 3-Clause BSD License",
                    &[
                        "BSD-3-Clause",
                        "BSD License 3",
                        "The BSD 3-Clause License",
                        "New BSD License",
                        // ANTLR publishes its BSD-3 text under this name
                        "BSD licence",
                    ],
                ),
                NormalizationRule::new(
                    "GNU GENERAL PUBLIC LICENSE, Version 2 + Classpath Exception",
                    &[
                        "GPL-2.0-with-classpath-exception",
                        "GPLv2 with classpath exception",
                        "GNU General Public License, version 2, with the Classpath Exception",
                    ],
                ),
                NormalizationRule::new(
                    "GNU LESSER GENERAL PUBLIC LICENSE, Version 2.1",
                    &["LGPL-2.1", "LGPL 2.1", "GNU Lesser General Public License, Version 2.1"],
                ),
                NormalizationRule::new(
                    "GNU Lesser General Public License v3.0",
                    &["LGPL-3.0", "LGPL 3.0", "GNU Lesser General Public License, Version 3.0"],
                ),
                NormalizationRule::new(
                    "COMMON DEVELOPMENT AND DISTRIBUTION LICENSE (CDDL) Version 1.0",
                    &["CDDL-1.0", "CDDL 1.0", "Common Development and Distribution License (CDDL) v1.0"],
                ),
                NormalizationRule::new(
                    "Eclipse Public License - v 1.0",
                    &["EPL-1.0", "Eclipse Public License 1.0", "Eclipse Public License v1.0"],
                ),
                NormalizationRule::new(
                    "Eclipse Public License - v 2.0",
                    &[
                        "EPL-2.0",
                        "Eclipse Public License 2.0",
                        "Eclipse Public License v2.0",
                        "Eclipse Public License v. 2.0",
                    ],
                ),
                NormalizationRule::new("PUBLIC DOMAIN", &["Public Domain", "CC0", "CC0-1.0"]),
                NormalizationRule::new("Bouncy Castle Licence", &["Bouncy Castle License"]),
            ],
        }
    }

    /// Loads a bundle from its JSON representation:
    /// `{"rules": [{"canonical": "...", "aliases": ["..."]}]}`.
    pub fn from_json(document: &str) -> Result<Self, GateError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Extends this bundle with additional rules, which take precedence.
    pub fn extend(mut self, additional: NormalizerBundle) -> Self {
        let mut rules = additional.rules;
        rules.append(&mut self.rules);
        Self { rules }
    }

    /// Collapses a reported license name to its canonical spelling; names
    /// no rule covers pass through trimmed but otherwise untouched.
    pub fn normalize<'a>(&'a self, license: &'a str) -> &'a str {
        let license = license.trim();
        self.rules
            .iter()
            .find(|rule| rule.matches(license))
            .map(|rule| rule.canonical.as_str())
            .unwrap_or(license)
    }
}
