//! Short-lived per-category item cache with stale fallback.
//!
//! The cache never fails: when a refresh errors it serves whatever it last
//! stored for the key (however old), or nothing at all.

use sitemap_kit_core::{ContentItem, DEFAULT_CACHE_TTL, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Where the items returned by [`CategoryCache::get_or_fetch`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Unexpired cached value; no fetch was made.
    Hit,
    /// Fresh result of the fetch, now cached.
    Fetched,
    /// Fetch failed; previously cached value served past its TTL.
    Stale,
    /// Fetch failed and nothing was cached.
    Empty,
}

impl LookupSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupSource::Hit => "cached",
            LookupSource::Fetched => "fetched",
            LookupSource::Stale => "stale",
            LookupSource::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub items: Vec<ContentItem>,
    pub source: LookupSource,
}

struct CacheEntry {
    items: Vec<ContentItem>,
    stored_at: Instant,
}

/// Category cache shared by every generation run of a process.
pub struct CategoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl CategoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return cached items for `key`, refreshing through `fetch` when expired.
    ///
    /// A successful fetch is stored even when it is empty. A failed fetch is
    /// absorbed: the last stored value is served regardless of age, else an
    /// empty list. The lock is never held across the fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> CacheLookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ContentItem>>>,
    {
        if let Some(items) = self.fresh(key) {
            return CacheLookup {
                items,
                source: LookupSource::Hit,
            };
        }

        match fetch().await {
            Ok(items) => {
                self.store(key, items.clone());
                CacheLookup {
                    items,
                    source: LookupSource::Fetched,
                }
            }
            Err(err) => match self.last_known(key) {
                Some(items) => {
                    tracing::warn!(category = key, error = %err, cached = items.len(), "serving stale cache entry");
                    CacheLookup {
                        items,
                        source: LookupSource::Stale,
                    }
                }
                None => {
                    tracing::warn!(category = key, error = %err, "no cached entry, category will be empty");
                    CacheLookup {
                        items: Vec::new(),
                        source: LookupSource::Empty,
                    }
                }
            },
        }
    }

    /// Drop the entry for `key` so the next lookup refetches.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn fresh(&self, key: &str) -> Option<Vec<ContentItem>> {
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.items.clone())
    }

    fn last_known(&self, key: &str) -> Option<Vec<ContentItem>> {
        self.lock().get(key).map(|entry| entry.items.clone())
    }

    fn store(&self, key: &str, items: Vec<ContentItem>) {
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                items,
                stored_at: Instant::now(),
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are replaced wholesale, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitemap_kit_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items(slugs: &[&str]) -> Vec<ContentItem> {
        slugs.iter().map(|s| ContentItem::new(*s)).collect()
    }

    fn failure() -> Error {
        Error::Fetch {
            category: "games".to_string(),
            status: 500,
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let cache = CategoryCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch("games", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(items(&["a", "b"]))
            })
            .await;
        assert_eq!(first.source, LookupSource::Fetched);

        let second = cache
            .get_or_fetch("games", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(items(&["c"]))
            })
            .await;

        assert_eq!(second.source, LookupSource::Hit);
        assert_eq!(second.items, items(&["a", "b"]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache = CategoryCache::new(Duration::ZERO);

        cache.get_or_fetch("games", || async { Ok(items(&["old"])) }).await;
        let lookup = cache.get_or_fetch("games", || async { Ok(items(&["new"])) }).await;

        assert_eq!(lookup.source, LookupSource::Fetched);
        assert_eq!(lookup.items, items(&["new"]));
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_value() {
        let cache = CategoryCache::new(Duration::ZERO);

        cache.get_or_fetch("games", || async { Ok(items(&["kept"])) }).await;
        let lookup = cache.get_or_fetch("games", || async { Err(failure()) }).await;

        assert_eq!(lookup.source, LookupSource::Stale);
        assert_eq!(lookup.items, items(&["kept"]));
    }

    #[tokio::test]
    async fn test_failure_without_prior_value_is_empty() {
        let cache = CategoryCache::default();
        let lookup = cache.get_or_fetch("academy", || async { Err(failure()) }).await;

        assert_eq!(lookup.source, LookupSource::Empty);
        assert!(lookup.items.is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_state() {
        let cache = CategoryCache::new(Duration::from_secs(300));
        cache.get_or_fetch("academy", || async { Ok(Vec::new()) }).await;

        let lookup = cache
            .get_or_fetch("academy", || async { Ok(items(&["unexpected"])) })
            .await;
        assert_eq!(lookup.source, LookupSource::Hit);
        assert!(lookup.items.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = CategoryCache::new(Duration::ZERO);
        cache.get_or_fetch("games", || async { Ok(items(&["g"])) }).await;

        let lookup = cache.get_or_fetch("airdrops", || async { Err(failure()) }).await;
        assert_eq!(lookup.source, LookupSource::Empty);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = CategoryCache::default();
        cache.get_or_fetch("games", || async { Ok(items(&["g"])) }).await;
        cache.get_or_fetch("academy", || async { Ok(items(&["a"])) }).await;
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate("games"));
        assert!(!cache.invalidate("games"));
        let lookup = cache.get_or_fetch("games", || async { Err(failure()) }).await;
        assert_eq!(lookup.source, LookupSource::Empty);

        cache.clear();
        assert!(cache.is_empty());
    }
}
