// In-memory release cache.
// Maps owner/repo to the last fetched release snapshot and checks it against a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::github::Release;

/// Default TTL for cached releases: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Asset as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub download_url: String,
}

/// Snapshot of a repository's latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Release tag, kept for logging.
    pub tag_name: String,
    /// Assets in the order GitHub listed them.
    pub assets: Vec<Asset>,
    /// When the release was fetched from upstream.
    pub fetched_at: DateTime<Utc>,
}

impl ReleaseRecord {
    /// Build a record from an upstream release fetched at `fetched_at`.
    pub fn from_release(release: Release, fetched_at: DateTime<Utc>) -> Self {
        Self {
            tag_name: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| Asset {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
            fetched_at,
        }
    }
}

/// True iff `now - record.fetched_at < ttl`.
///
/// A record stamped in the future counts as fresh.
pub fn is_fresh(record: &ReleaseRecord, now: DateTime<Utc>, ttl: Duration) -> bool {
    match now.signed_duration_since(record.fetched_at).to_std() {
        Ok(age) => age < ttl,
        Err(_) => true,
    }
}

/// Cache key for a repository.
fn key(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner, repo)
}

/// Process-lifetime cache holding one release record per repository.
///
/// Records are replaced wholesale and never removed; stale entries stay until
/// the next successful fetch overwrites them.
#[derive(Debug, Default)]
pub struct ReleaseCache {
    entries: RwLock<HashMap<String, Arc<ReleaseRecord>>>,
}

impl ReleaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current record for a repository, fresh or not.
    pub fn get(&self, owner: &str, repo: &str) -> Option<Arc<ReleaseRecord>> {
        self.entries.read().get(&key(owner, repo)).cloned()
    }

    /// Install `record` for a repository, replacing any previous one.
    pub fn set(&self, owner: &str, repo: &str, record: Arc<ReleaseRecord>) {
        self.entries.write().insert(key(owner, repo), record);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(tag: &str, fetched_at: DateTime<Utc>) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: tag.to_string(),
            assets: vec![Asset {
                name: format!("app-{}.zip", tag),
                download_url: format!("https://example.com/{}/app.zip", tag),
            }],
            fetched_at,
        }
    }

    #[test]
    fn test_get_missing() {
        let cache = ReleaseCache::new();
        assert!(cache.get("cli", "gh").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_replaces() {
        let cache = ReleaseCache::new();
        cache.set("o", "r", Arc::new(record("v1", Utc::now())));
        cache.set("o", "r", Arc::new(record("v2", Utc::now())));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("o", "r").unwrap().tag_name, "v2");
    }

    #[test]
    fn test_keys_are_per_repository() {
        let cache = ReleaseCache::new();
        cache.set("o", "a", Arc::new(record("v1", Utc::now())));
        cache.set("o", "b", Arc::new(record("v2", Utc::now())));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("o", "a").unwrap().tag_name, "v1");
        assert!(cache.get("a", "o").is_none());
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let ttl = Duration::from_secs(300);

        assert!(is_fresh(&record("v1", now), now, ttl));
        assert!(is_fresh(&record("v1", now - chrono::Duration::seconds(299)), now, ttl));
        // Age equal to the TTL is already stale.
        assert!(!is_fresh(&record("v1", now - chrono::Duration::seconds(300)), now, ttl));
        assert!(!is_fresh(&record("v1", now - chrono::Duration::seconds(600)), now, ttl));
    }

    #[test]
    fn test_future_record_is_fresh() {
        let now = Utc::now();
        let rec = record("v1", now + chrono::Duration::seconds(5));
        assert!(is_fresh(&rec, now, DEFAULT_TTL));
    }

    #[test]
    fn test_stale_entry_is_kept() {
        let cache = ReleaseCache::new();
        let old = Utc::now() - chrono::Duration::hours(1);
        cache.set("o", "r", Arc::new(record("v1", old)));

        let got = cache.get("o", "r").unwrap();
        assert!(!is_fresh(&got, Utc::now(), DEFAULT_TTL));
    }

    #[test]
    fn test_concurrent_writers_last_write_wins() {
        let cache = Arc::new(ReleaseCache::new());
        let base = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        let tag = format!("v{}.{}", i, j);
                        let rec = record(&tag, base + chrono::Duration::milliseconds(j));
                        cache.set("o", "r", Arc::new(rec));
                        // Every read sees a whole record, never a mix.
                        let seen = cache.get("o", "r").unwrap();
                        assert_eq!(seen.assets[0].name, format!("app-{}.zip", seen.tag_name));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        cache.set("o", "r", Arc::new(record("final", base)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("o", "r").unwrap().tag_name, "final");
    }
}
