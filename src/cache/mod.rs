// Cache module for release metadata.
// Keeps the latest release per repository in memory for the life of the process.

pub mod store;

pub use store::{Asset, DEFAULT_TTL, ReleaseCache, ReleaseRecord, is_fresh};
