use crate::{CacheConfig, CacheEntry, CacheKey, CacheStats, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use formlens_core::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Process-local key/value cache with per-entry TTL.
///
/// Expired entries are evicted lazily when read, or in bulk through
/// [`TtlCache::cleanup_expired`]. There is no size bound. Concurrent writers to
/// the same key simply overwrite each other (last write wins).
pub struct TtlCache<V> {
    entries: Arc<DashMap<String, CacheEntry<V>>>,
    config: CacheConfig,
    stats: Arc<Mutex<CacheStats>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Synchronous lookup; see [`CacheStore::get`].
    pub fn lookup(&self, key: &CacheKey) -> Option<V> {
        if !self.config.enabled {
            return None;
        }

        let storage_key = key.storage_key();
        let mut expired = false;
        let found = match self.entries.get(&storage_key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                expired = true;
                None
            }
            None => None,
        };

        if expired {
            self.entries
                .remove_if(&storage_key, |_, entry| entry.is_expired());
            debug!(namespace = %key.namespace, form_id = %key.form_id, "cache entry expired");
        }

        self.record(|stats| match (&found, expired) {
            (Some(_), _) => stats.hits += 1,
            (None, true) => {
                stats.misses += 1;
                stats.expirations += 1;
            }
            (None, false) => stats.misses += 1,
        });

        found
    }

    /// Synchronous store; see [`CacheStore::insert`].
    pub fn store(&self, key: CacheKey, value: V, ttl: Option<Duration>) {
        if !self.config.enabled {
            return;
        }

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let storage_key = key.storage_key();
        self.entries
            .insert(storage_key, CacheEntry::new(key, value, ttl));
    }

    /// Remove every entry whose key matches. No entry matching the predicate
    /// survives the call.
    pub fn retain_unless(
        &self,
        predicate: &(dyn for<'k> Fn(&'k CacheKey) -> bool + Send + Sync),
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.key));
        let removed = before.saturating_sub(self.entries.len());

        self.record(|stats| stats.invalidations += removed as u64);
        removed
    }

    /// Drop all expired entries at once.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!("Removed {} expired cache entries", removed);
            self.record(|stats| stats.expirations += removed as u64);
        }
        removed
    }

    pub fn snapshot_stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.entries = self.entries.len();
        stats.hit_rate = stats.hit_rate();
        stats
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut self.stats.lock());
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl<V> CacheStore<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<V>> {
        Ok(self.lookup(key))
    }

    async fn insert(&self, key: CacheKey, value: V, ttl: Option<Duration>) -> Result<()> {
        self.store(key, value, ttl);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<()> {
        self.entries.remove(&key.storage_key());
        Ok(())
    }

    async fn invalidate_where(
        &self,
        predicate: &(dyn for<'k> Fn(&'k CacheKey) -> bool + Send + Sync),
    ) -> Result<usize> {
        Ok(self.retain_unless(predicate))
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(self.snapshot_stats())
    }

    async fn size(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn key(form: &str, field: &str) -> CacheKey {
        CacheKey::new("field_analytics", form, field, "NUMBER")
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache: TtlCache<String> = TtlCache::default();
        cache
            .insert(key("form-1", "f1"), "value".to_string(), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get(&key("form-1", "f1")).await.unwrap(),
            Some("value".to_string())
        );
        assert_eq!(cache.get(&key("form-1", "f2")).await.unwrap(), None);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_relative_eq!(stats.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.store(key("form-1", "f1"), 7, Some(Duration::from_millis(10)));
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get(&key("form-1", "f1")).await.unwrap(), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.snapshot_stats().expirations, 1);
    }

    #[tokio::test]
    async fn test_invalidate_form_removes_every_namespace() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.store(key("form-1", "f1"), 1, None);
        cache.store(key("form-1", "f2"), 2, None);
        cache.store(CacheKey::new("responses", "form-1", "", "all"), 3, None);
        cache.store(key("form-2", "f1"), 4, None);

        let removed = cache.invalidate_form("form-1").await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(cache.size().await.unwrap(), 1);
        assert_eq!(cache.get(&key("form-2", "f1")).await.unwrap(), Some(4));
        assert_eq!(cache.snapshot_stats().invalidations, 3);
    }

    #[tokio::test]
    async fn test_invalidate_where_through_trait_object() {
        let cache: Arc<dyn CacheStore<u32>> = Arc::new(TtlCache::default());
        cache.insert(key("form-1", "f1"), 1, None).await.unwrap();
        cache
            .insert(CacheKey::new("responses", "form-1", "", "all"), 2, None)
            .await
            .unwrap();

        let response_lists = |k: &CacheKey| k.namespace == "responses";
        assert_eq!(cache.invalidate_where(&response_lists).await.unwrap(), 1);
        assert_eq!(cache.size().await.unwrap(), 1);
        assert_eq!(cache.get(&key("form-1", "f1")).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.store(key("form-1", "short"), 1, Some(Duration::from_millis(5)));
        cache.store(key("form-1", "long"), 2, Some(Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_never_stores() {
        let cache: TtlCache<u32> = TtlCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        cache.store(key("form-1", "f1"), 1, None);
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(&key("form-1", "f1")), None);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_last_value() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.store(key("form-1", "f1"), 1, None);
        cache.store(key("form-1", "f1"), 2, None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&key("form-1", "f1")), Some(2));
    }
}
