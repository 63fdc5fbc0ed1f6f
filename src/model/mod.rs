//! Core data types for suppressions, dependencies, and policy results.
//!
//! This module contains the fundamental types used throughout quality-gate:
//!
//! - [`SuppressionEntry`] - An accepted-finding record with optional expiry
//! - [`Vulnerability`] - One identified finding on a suppression entry
//! - [`DependencyRecord`] - A dependency as reported by the license report
//! - [`WhiteListedDependency`] - A time-bounded license-check exemption
//!
//! # Example
//!
//! ```
//! use quality_gate::model::{SuppressionEntry, Vulnerability, VulnerabilityType};
//!
//! let entry = SuppressionEntry::new(
//!     "pkg:maven/commons-fileupload/commons-fileupload@1.4",
//!     vec![Vulnerability::new(VulnerabilityType::Cve, "CVE-2023-24998")],
//! )
//! .with_notes("False positive: multipart parsing is never reachable");
//!
//! assert!(entry.suppress_until.is_none());
//! ```

mod dependency;
mod suppression;

pub use dependency::*;
pub use suppression::*;
