// Request resolution.
// Turns /owner/repo/query into a download URL via the release cache and upstream source.

use std::sync::Arc;

use chrono::Utc;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::cache::{Asset, ReleaseCache, ReleaseRecord, is_fresh};
use crate::config::ResolvePolicy;
use crate::error::{RedirectError, Result};
use crate::github::ReleaseSource;

/// A parsed `/owner/repo/query` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub owner: String,
    pub repo: String,
    pub query: String,
}

/// Split a request path into owner, repo, and asset query.
///
/// The path is percent-decoded before splitting, so an encoded `/` counts as a
/// separator. Leading and trailing slashes are ignored; anything other than
/// exactly three non-empty segments is rejected.
pub fn parse_path(path: &str) -> Result<AssetRequest> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| RedirectError::InvalidPath(path.to_string()))?;
    let segments: Vec<&str> = decoded.trim_matches('/').split('/').collect();

    match segments.as_slice() {
        [owner, repo, query] if !owner.is_empty() && !repo.is_empty() && !query.is_empty() => {
            Ok(AssetRequest {
                owner: owner.to_string(),
                repo: repo.to_string(),
                query: query.to_string(),
            })
        }
        _ => Err(RedirectError::InvalidPath(path.to_string())),
    }
}

/// Pick the first asset, in listing order, whose name contains `query`.
pub fn select_asset<'a>(
    assets: &'a [Asset],
    query: &str,
    case_insensitive: bool,
) -> Option<&'a Asset> {
    if case_insensitive {
        let query = query.to_lowercase();
        assets.iter().find(|a| a.name.to_lowercase().contains(&query))
    } else {
        assets.iter().find(|a| a.name.contains(query))
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub asset: Asset,
    pub url: Url,
    pub tag_name: String,
}

/// Resolves asset requests against cached or freshly fetched releases.
pub struct Resolver {
    cache: Arc<ReleaseCache>,
    source: Arc<dyn ReleaseSource>,
    policy: ResolvePolicy,
}

impl Resolver {
    pub fn new(
        cache: Arc<ReleaseCache>,
        source: Arc<dyn ReleaseSource>,
        policy: ResolvePolicy,
    ) -> Self {
        Self {
            cache,
            source,
            policy,
        }
    }

    pub fn cache(&self) -> &ReleaseCache {
        &self.cache
    }

    /// Resolve a request to the download URL of its matching asset.
    pub async fn resolve(&self, request: &AssetRequest) -> Result<ResolvedAsset> {
        let record = self.release_for(&request.owner, &request.repo).await?;

        let asset = select_asset(&record.assets, &request.query, self.policy.case_insensitive)
            .ok_or_else(|| RedirectError::NoMatchingAsset {
                repo: format!("{}/{}", request.owner, request.repo),
                query: request.query.clone(),
            })?;

        let url = Url::parse(&asset.download_url)
            .map_err(|_| RedirectError::InvalidDownloadUrl(asset.download_url.clone()))?;

        Ok(ResolvedAsset {
            asset: asset.clone(),
            url,
            tag_name: record.tag_name.clone(),
        })
    }

    /// Return the cached release if fresh, otherwise fetch and cache a new one.
    async fn release_for(&self, owner: &str, repo: &str) -> Result<Arc<ReleaseRecord>> {
        let cached = self.cache.get(owner, repo);

        if let Some(record) = &cached {
            if is_fresh(record, Utc::now(), self.policy.ttl) {
                debug!(%owner, %repo, tag = %record.tag_name, "release cache hit");
                return Ok(Arc::clone(record));
            }
            debug!(%owner, %repo, fetched_at = %record.fetched_at, "release cache entry stale");
        } else {
            debug!(%owner, %repo, "release cache miss");
        }

        match self.source.latest_release(owner, repo).await {
            Ok(release) => {
                let record = Arc::new(ReleaseRecord::from_release(release, Utc::now()));
                self.cache.set(owner, repo, Arc::clone(&record));
                info!(
                    %owner,
                    %repo,
                    tag = %record.tag_name,
                    assets = record.assets.len(),
                    cached_repos = self.cache.len(),
                    "fetched latest release"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(%owner, %repo, error = %e, "failed to fetch latest release");
                match cached {
                    Some(stale) if self.policy.stale_fallback => {
                        warn!(%owner, %repo, tag = %stale.tag_name, "serving stale release");
                        Ok(stale)
                    }
                    _ => Err(e),
                }
            }
        }
    }
}
