use async_trait::async_trait;
use formlens_core::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime};

/// Default lifetime of cached aggregates and response lists.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Identity of a cached value.
///
/// The storage key is a digest of all four parts, so identical inputs always
/// address the same slot. The parts are kept alongside the entry so bulk
/// invalidation can match on the form id without reversing the digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: String,
    pub form_id: String,
    pub field_id: String,
    /// Field type for per-field aggregates, or an aggregate name
    pub kind: String,
}

impl CacheKey {
    pub fn new(
        namespace: impl Into<String>,
        form_id: impl Into<String>,
        field_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            form_id: form_id.into(),
            field_id: field_id.into(),
            kind: kind.into(),
        }
    }

    /// Hex SHA-256 of the key parts. Parts are NUL-separated so that
    /// ("ab", "c") and ("a", "bc") never collide.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.namespace, &self.form_id, &self.field_id, &self.kind] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.namespace, self.digest())
    }
}

/// Cache entry metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub key: CacheKey,
    pub created_at: SystemTime,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(key: CacheKey, value: T, ttl: Duration) -> Self {
        Self {
            value,
            key,
            created_at: SystemTime::now(),
            ttl,
        }
    }

    pub fn expires_at(&self) -> SystemTime {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at()
    }
}

/// Get/set/invalidate contract shared by cache backends.
#[async_trait]
pub trait CacheStore<V>: Send + Sync {
    /// Returns the live value for `key`; an expired entry is removed and reported absent.
    async fn get(&self, key: &CacheKey) -> Result<Option<V>>;

    /// Store `value`, using the backend's default TTL when `ttl` is `None`.
    async fn insert(&self, key: CacheKey, value: V, ttl: Option<Duration>) -> Result<()>;

    async fn remove(&self, key: &CacheKey) -> Result<()>;

    /// Remove every entry whose key satisfies `predicate`. Returns the number removed.
    async fn invalidate_where(
        &self,
        predicate: &(dyn for<'k> Fn(&'k CacheKey) -> bool + Send + Sync),
    ) -> Result<usize>;

    /// Remove every entry derived from `form_id`, across all namespaces, fields and kinds.
    async fn invalidate_form(&self, form_id: &str) -> Result<usize> {
        let form_id = form_id.to_string();
        let belongs_to_form = move |key: &CacheKey| key.form_id == form_id;
        self.invalidate_where(&belongs_to_form).await
    }

    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> Result<CacheStats>;

    async fn size(&self) -> Result<usize>;

    async fn is_empty(&self) -> bool {
        self.size().await.unwrap_or(0) == 0
    }
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub entries: usize,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

/// Cache configuration options
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl From<&formlens_core::CacheSettings> for CacheConfig {
    fn from(settings: &formlens_core::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.analytics_ttl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_digest_is_deterministic() {
        let a = CacheKey::new("field_analytics", "form-1", "f1", "NUMBER");
        let b = CacheKey::new("field_analytics", "form-1", "f1", "NUMBER");
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.storage_key(), b.storage_key());
        assert!(a.storage_key().starts_with("field_analytics_"));
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_key_parts_do_not_run_together() {
        let a = CacheKey::new("ns", "ab", "c", "k");
        let b = CacheKey::new("ns", "a", "bc", "k");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_entry_expiry() {
        let key = CacheKey::new("ns", "form", "", "all");
        let live = CacheEntry::new(key.clone(), 1u8, Duration::from_secs(60));
        assert!(!live.is_expired());
        assert!(live.expires_at() > live.created_at);

        let dead = CacheEntry::new(key, 1u8, Duration::ZERO);
        assert!(dead.is_expired());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((stats.miss_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
