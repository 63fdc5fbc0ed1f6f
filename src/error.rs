//! Error types for the quality-gate library.
//!
//! Policy violations are *not* errors: the evaluators return them as data and
//! the caller decides whether to fail the build. `GateError` only covers
//! genuinely broken input (non-well-formed documents, unparseable dates,
//! invalid patterns) and I/O at the edges.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("malformed XML document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("unparseable timestamp {value:?} (expected ISO-8601 date, optionally with time and offset)")]
    InvalidTimestamp { value: String },

    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed license report: {0}")]
    LicenseReport(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
