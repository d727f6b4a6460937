//! In-process response cache
//!
//! Provides:
//! - TTL-bounded storage of provider responses as JSON values
//! - Oldest-first eviction once the entry budget is reached
//! - Generic get/set operations plus a loader helper
//! - Key builders for provider operations

use crate::errors::{AppError, Result};
use crate::metrics;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for every entry
    pub ttl: Duration,
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Name used in metrics labels
    pub name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 2_048,
            name: "provider".to_string(),
        }
    }
}

struct Entry {
    value: serde_json::Value,
    inserted_at: Instant,
    /// Insertion order, used for eviction
    seq: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    next_seq: u64,
}

/// Shared TTL cache
pub struct Cache {
    entries: RwLock<Entries>,
    config: CacheConfig,
}

impl Cache {
    /// Create an empty cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            config,
        }
    }
    
    /// Get a value from cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.entries.read().await;
        
        match entries.map.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.config.ttl => {
                let parsed = serde_json::from_value(entry.value.clone())
                    .map_err(|e| AppError::Internal {
                        message: format!("Failed to parse cached value for '{}': {}", key, e),
                    })?;
                debug!(key = %key, "Cache hit");
                metrics::record_cache(true, &self.config.name);
                Ok(Some(parsed))
            }
            _ => {
                debug!(key = %key, "Cache miss");
                metrics::record_cache(false, &self.config.name);
                Ok(None)
            }
        }
    }
    
    /// Set a value in cache
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.write().await;
        
        let ttl = self.config.ttl;
        entries.map.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        
        if entries.map.len() >= self.config.max_entries && !entries.map.contains_key(key) {
            let oldest = entries
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.map.remove(&oldest);
            }
        }
        
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(key.to_string(), Entry {
            value,
            inserted_at: Instant::now(),
            seq,
        });
        
        debug!(key = %key, "Cache set");
        Ok(())
    }
    
    /// Delete a key from cache
    pub async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.map.remove(key).is_some()
    }
    
    /// Number of stored entries, expired ones included until the next write
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }
    
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
    
    /// Get or set with a loader function. Loader errors are returned and never cached.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Discarding unreadable cache entry"),
        }
        
        let value = loader().await?;
        
        if let Err(e) = self.set(key, &value).await {
            warn!(error = %e, "Failed to cache value, continuing without cache");
        }
        
        Ok(value)
    }
}

/// Cache key builder helpers
pub mod keys {
    use crate::models::SourceTag;
    
    pub fn author_search(source: SourceTag, name: &str) -> String {
        format!("{}:search:{}", source, name.trim().to_lowercase())
    }
    
    pub fn author_detail(source: SourceTag, author_id: &str) -> String {
        format!("{}:author:{}", source, author_id)
    }
    
    pub fn author_works(source: SourceTag, author_id: &str) -> String {
        format!("{}:works:{}", source, author_id)
    }
    
    pub fn citing_works(source: SourceTag, work_id: &str, limit: usize) -> String {
        format!("{}:citing:{}:{}", source, work_id, limit)
    }
    
    pub fn work(source: SourceTag, work_id: &str) -> String {
        format!("{}:work:{}", source, work_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceTag;
    
    #[test]
    fn test_key_builders() {
        assert_eq!(keys::author_search(SourceTag::OpenAlex, " Ada Lovelace "), "openalex:search:ada lovelace");
        assert!(keys::citing_works(SourceTag::SemanticScholar, "p1", 50).contains(":citing:p1:50"));
    }
    
    #[tokio::test]
    async fn test_set_then_get() {
        let cache = Cache::new(CacheConfig::default());
        cache.set("k", &vec![1, 2, 3]).await.unwrap();
        let value: Option<Vec<i32>> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
    
    #[tokio::test]
    async fn test_expired_entries_miss() {
        let cache = Cache::new(CacheConfig {
            ttl: Duration::from_millis(0),
            ..CacheConfig::default()
        });
        cache.set("k", &"v").await.unwrap();
        let value: Option<String> = cache.get("k").await.unwrap();
        assert!(value.is_none());
    }
    
    #[tokio::test]
    async fn test_oldest_entry_is_evicted() {
        let cache = Cache::new(CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        });
        cache.set("a", &1).await.unwrap();
        cache.set("b", &2).await.unwrap();
        cache.set("c", &3).await.unwrap();
        
        assert_eq!(cache.len().await, 2);
        assert!(cache.get::<i32>("a").await.unwrap().is_none());
        assert_eq!(cache.get::<i32>("c").await.unwrap(), Some(3));
    }
    
    #[tokio::test]
    async fn test_loader_errors_are_not_cached() {
        let cache = Cache::new(CacheConfig::default());
        let failed: Result<i32> = cache
            .get_or_load("k", || async {
                Err(AppError::Internal { message: "boom".into() })
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);
        
        let loaded = cache.get_or_load("k", || async { Ok(7) }).await.unwrap();
        assert_eq!(loaded, 7);
        assert_eq!(cache.get::<i32>("k").await.unwrap(), Some(7));
    }
    
    #[test]
    fn test_delete() {
        let cache = Cache::new(CacheConfig::default());
        tokio_test::block_on(async {
            cache.set("k", &1).await.unwrap();
            assert!(cache.delete("k").await);
            assert!(!cache.delete("k").await);
            assert!(cache.is_empty().await);
        });
    }
}
