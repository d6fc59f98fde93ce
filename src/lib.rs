// release-redirect library.
// Resolves /owner/repo/query to an asset of the repository's latest GitHub release.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod resolver;
pub mod server;

#[cfg(test)]
mod testing;

pub use error::{RedirectError, Result};
