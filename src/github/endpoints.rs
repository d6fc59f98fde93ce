// GitHub API endpoint functions.
// Provides typed methods for fetching release data from the GitHub REST API.

use crate::error::Result;

use super::ReleaseSource;
use super::client::GitHubClient;
use super::types::Release;

impl GitHubClient {
    /// Get the latest published release for a repository.
    pub async fn get_latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        let response = self
            .get(&format!("/repos/{}/{}/releases/latest", owner, repo))
            .await?;
        let body = response.bytes().await?;
        let release: Release = serde_json::from_slice(&body)?;
        Ok(release)
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubClient {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        self.get_latest_release(owner, repo).await
    }
}
