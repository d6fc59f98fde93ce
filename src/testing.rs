// Test helpers shared by resolver and server tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::Asset;
use crate::error::{RedirectError, Result};
use crate::github::{Release, ReleaseAsset, ReleaseSource};

pub fn asset(name: &str) -> Asset {
    Asset {
        name: name.to_string(),
        download_url: format!("https://example.com/{}", name),
    }
}

/// A release whose assets download from `https://example.com/{tag}/{name}`.
pub fn release(tag: &str, names: &[&str]) -> Release {
    Release {
        id: 1,
        tag_name: tag.to_string(),
        name: Some(tag.to_string()),
        draft: false,
        prerelease: false,
        published_at: None,
        assets: names
            .iter()
            .map(|name| ReleaseAsset {
                name: name.to_string(),
                browser_download_url: format!("https://example.com/{}/{}", tag, name),
                size: 0,
                content_type: None,
            })
            .collect(),
    }
}

/// In-memory release source that counts how often it is asked.
pub struct StubSource {
    release: Option<Release>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn returning(release: Release) -> Self {
        Self {
            release: Some(release),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            release: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReleaseSource for StubSource {
    async fn latest_release(&self, _owner: &str, _repo: &str) -> Result<Release> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release
            .clone()
            .ok_or_else(|| RedirectError::Other("upstream unavailable".to_string()))
    }
}
