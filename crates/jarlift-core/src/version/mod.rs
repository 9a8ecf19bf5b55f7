//! Ordering of installed artifact versions.

pub mod order;

pub use order::{VersionOrder, compare_versions, parse_lenient};
