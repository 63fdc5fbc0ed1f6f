pub mod config;
pub mod error;
pub mod license;
pub mod model;
pub mod output;
pub mod scan_report;
pub mod suppression;

pub use config::Config;
pub use error::GateError;
pub use license::{LicenseEvaluation, LicensePolicy};
pub use model::{DependencyRecord, SuppressionEntry, Vulnerability, WhiteListedDependency};
pub use scan_report::ScanReport;
pub use suppression::{SuppressionPolicy, SuppressionViolation};
