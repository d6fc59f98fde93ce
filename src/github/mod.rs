// GitHub API module.
// Provides the release client and the source abstraction the resolver fetches through.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{GITHUB_API_BASE, GitHubClient};
pub use types::{Release, ReleaseAsset};

use crate::error::Result;

/// Upstream collaborator that knows the latest release of a repository.
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the latest published release for `owner/repo`.
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release>;
}
