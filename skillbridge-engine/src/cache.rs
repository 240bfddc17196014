//! Roadmap response cache
//!
//! Content-addressed by [`CacheKey`]. A hit returns the stored roadmap
//! unchanged, including the `cost` and `generated_by` of the call that
//! produced it.

use async_trait::async_trait;
use serde::Serialize;
use skillbridge_core::{CacheConfig, CacheKey, GeneratedRoadmap, SkillbridgeResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache backend trait for pluggable roadmap caches.
///
/// Implementations should be thread-safe and support concurrent access.
/// Backend errors are logged by the orchestrator and treated as misses.
#[async_trait]
pub trait RoadmapCache: Send + Sync {
    /// Get a roadmap that has not yet expired.
    async fn get(&self, key: &CacheKey) -> SkillbridgeResult<Option<GeneratedRoadmap>>;

    /// Store a roadmap for `ttl`, replacing any previous entry for `key`.
    async fn set(
        &self,
        key: CacheKey,
        roadmap: GeneratedRoadmap,
        ttl: Duration,
    ) -> SkillbridgeResult<()>;

    /// Drop every entry. Returns how many were removed.
    async fn clear(&self) -> SkillbridgeResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> SkillbridgeResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

struct CacheEntry {
    roadmap: GeneratedRoadmap,
    expires_at: Instant,
}

/// Process-local cache bounded by entry count.
///
/// When full, expired entries are purged first, then the entry closest to
/// expiry is evicted.
pub struct InMemoryRoadmapCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryRoadmapCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries)
    }

    fn make_room(&self, entries: &mut HashMap<CacheKey, CacheEntry>, now: Instant) {
        entries.retain(|_, entry| entry.expires_at > now);
        while entries.len() >= self.max_entries {
            let victim = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }
}

impl Default for InMemoryRoadmapCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[async_trait]
impl RoadmapCache for InMemoryRoadmapCache {
    async fn get(&self, key: &CacheKey) -> SkillbridgeResult<Option<GeneratedRoadmap>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(entry.roadmap.clone()));
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }

        // Expired: drop it under the write lock unless a writer refreshed it.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn set(
        &self,
        key: CacheKey,
        roadmap: GeneratedRoadmap,
        ttl: Duration,
    ) -> SkillbridgeResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&key) {
            self.make_room(&mut entries, now);
        }
        entries.insert(
            key,
            CacheEntry {
                roadmap,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self) -> SkillbridgeResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn stats(&self) -> SkillbridgeResult<CacheStats> {
        let now = Instant::now();
        let entry_count = self
            .entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count() as u64;

        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}

impl std::fmt::Debug for InMemoryRoadmapCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRoadmapCache")
            .field("max_entries", &self.max_entries)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackGenerator;
    use skillbridge_core::{RoadmapRequest, SkillLevel, TimeAvailability, UserContext};

    fn key_and_roadmap(domain: &str) -> (CacheKey, GeneratedRoadmap) {
        let request = RoadmapRequest::new(
            domain,
            SkillLevel::Beginner,
            TimeAvailability::PartTime,
            UserContext::default(),
        );
        let roadmap = FallbackGenerator::new().generate(
            request.domain(),
            request.skill_level(),
            request.time_availability(),
        );
        (request.cache_key(), roadmap)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_set_returns_same_roadmap() {
        let cache = InMemoryRoadmapCache::new(10);
        let (key, roadmap) = key_and_roadmap("Python");

        assert!(cache.get(&key).await.unwrap().is_none());
        cache
            .set(key.clone(), roadmap.clone(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(roadmap));

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = InMemoryRoadmapCache::new(10);
        let (key, roadmap) = key_and_roadmap("Python");
        cache
            .set(key.clone(), roadmap, Duration::from_secs(3600))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.get(&key).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&key).await.unwrap().is_none());
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_soonest_expiring() {
        let cache = InMemoryRoadmapCache::new(2);
        let (k1, r1) = key_and_roadmap("Python");
        let (k2, r2) = key_and_roadmap("JavaScript");
        let (k3, r3) = key_and_roadmap("Go");

        cache.set(k1.clone(), r1, Duration::from_secs(10)).await.unwrap();
        cache.set(k2.clone(), r2, Duration::from_secs(100)).await.unwrap();
        cache.set(k3.clone(), r3, Duration::from_secs(100)).await.unwrap();

        assert!(cache.get(&k1).await.unwrap().is_none());
        assert!(cache.get(&k2).await.unwrap().is_some());
        assert!(cache.get(&k3).await.unwrap().is_some());
        assert_eq!(cache.stats().await.unwrap().evictions, 1);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = InMemoryRoadmapCache::default();
        let (k1, r1) = key_and_roadmap("Python");
        let (k2, r2) = key_and_roadmap("Go");
        cache.set(k1.clone(), r1, Duration::from_secs(60)).await.unwrap();
        cache.set(k2, r2, Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get(&k1).await.unwrap().is_none());
    }
}
