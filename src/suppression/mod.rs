//! Suppression lifecycle: store, policy check, and generation.
//!
//! - [`parse_suppressions`] / [`serialize_suppressions`] move entry sets in
//!   and out of the XML document format.
//! - [`SuppressionPolicy::check`] flags entries that lack both a
//!   false-positive justification and a bounded expiry.
//! - [`generate`] builds a fresh suppression set from a scan report,
//!   merging still-relevant entries of a previous set; [`update`] rewrites
//!   expiries across an existing set.

mod generate;
mod policy;
mod store;

pub use generate::{generate, update};
pub use policy::{
    SuppressionPolicy, SuppressionViolation, DEFAULT_FALSE_POSITIVE_PATTERN,
    DEFAULT_MAX_SUPPRESS_DAYS,
};
pub use store::{parse_suppressions, serialize_suppressions};
