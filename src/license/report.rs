//! Parsing of the license report produced by the external license-report
//! generator.
//!
//! The report is JSON with two bundles: `dependencies` resolved directly
//! from the build's dependency graph, and `importedModules` contributed by
//! imported module bundles. Both are flattened into [`DependencyRecord`]s
//! so the evaluator applies the same policy to both sources.

use serde::Deserialize;

use crate::error::GateError;
use crate::model::{DependencyOrigin, DependencyRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(default)]
    dependencies: Vec<RawDependency>,
    #[serde(default)]
    imported_modules: Vec<RawImportedBundle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependency {
    #[serde(default)]
    module_name: String,
    #[serde(default)]
    module_version: String,
    #[serde(default)]
    module_licenses: Vec<RawLicense>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLicense {
    #[serde(default)]
    module_license: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImportedBundle {
    #[serde(default)]
    dependencies: Vec<RawImportedModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImportedModule {
    #[serde(default)]
    module_name: String,
    #[serde(default)]
    module_version: String,
    #[serde(default)]
    module_license: Option<String>,
}

fn split_module_name(module_name: &str) -> (String, String) {
    match module_name.split_once(':') {
        Some((group, name)) => (group.to_string(), name.to_string()),
        None => (String::new(), module_name.to_string()),
    }
}

/// Parses a license report into a flat list of dependency records.
pub fn parse_license_report(document: &str) -> Result<Vec<DependencyRecord>, GateError> {
    let raw: RawReport = serde_json::from_str(document)?;
    let mut records = Vec::new();

    for dependency in raw.dependencies {
        let (group, name) = split_module_name(&dependency.module_name);
        let licenses = dependency
            .module_licenses
            .into_iter()
            .filter_map(|license| license.module_license)
            .filter(|license| !license.trim().is_empty())
            .collect();
        records.push(
            DependencyRecord::new(group, name, dependency.module_version, DependencyOrigin::Direct)
                .with_licenses(licenses),
        );
    }

    for bundle in raw.imported_modules {
        for module in bundle.dependencies {
            let (group, name) = split_module_name(&module.module_name);
            let licenses = module
                .module_license
                .into_iter()
                .filter(|license| !license.trim().is_empty())
                .collect();
            records.push(
                DependencyRecord::new(group, name, module.module_version, DependencyOrigin::Imported)
                    .with_licenses(licenses),
            );
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "dependencies": [
            {
                "moduleName": "com.fasterxml.jackson.core:jackson-core",
                "moduleVersion": "2.15.1",
                "moduleLicenses": [
                    {"moduleLicense": "Apache License, Version 2.0", "moduleLicenseUrl": "https://www.apache.org/licenses/LICENSE-2.0"},
                    {"moduleLicense": "The Apache Software License, Version 2.0"}
                ]
            },
            {
                "moduleName": "org.mystery:no-license",
                "moduleVersion": "0.1",
                "moduleLicenses": []
            }
        ],
        "importedModules": [
            {
                "moduleName": "bundle",
                "dependencies": [
                    {"moduleName": "org.example:widget", "moduleVersion": "1.0", "moduleLicense": "MIT License"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample_report() {
        let records = parse_license_report(SAMPLE).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].group, "com.fasterxml.jackson.core");
        assert_eq!(records[0].name, "jackson-core");
        assert_eq!(records[0].version, "2.15.1");
        assert_eq!(records[0].origin, DependencyOrigin::Direct);
        assert_eq!(records[0].licenses.len(), 2);

        assert!(records[1].licenses.is_empty());

        assert_eq!(records[2].origin, DependencyOrigin::Imported);
        assert_eq!(records[2].module_name(), "org.example:widget");
        assert_eq!(records[2].licenses, ["MIT License"]);
    }

    #[test]
    fn test_null_license_entries_are_ignored() {
        let doc = r#"{"dependencies": [{"moduleName": "a:b", "moduleVersion": "1", "moduleLicenses": [{"moduleLicense": null}, {"moduleLicense": "  "}]}]}"#;
        let records = parse_license_report(doc).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].licenses.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_license_report("{not json").is_err());
    }

    #[test]
    fn test_empty_report_is_empty_input() {
        assert!(parse_license_report("{}").unwrap().is_empty());
    }
}
