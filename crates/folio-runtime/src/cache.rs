//! Annotation cache.
//!
//! Block ids are content addresses, so an annotation computed once for a
//! block is valid for any later run that produces the same block.

use moka::future::Cache;
use std::time::Duration;

use folio_core::BlockAnnotation;

/// Cache key: which enricher annotated which block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    enricher: String,
    block_id: String,
}

impl CacheKey {
    pub fn new(enricher: impl Into<String>, block_id: impl Into<String>) -> Self {
        Self {
            enricher: enricher.into(),
            block_id: block_id.into(),
        }
    }
}

/// Annotation cache using moka.
pub struct AnnotationCache {
    cache: Cache<CacheKey, BlockAnnotation>,
}

impl AnnotationCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<BlockAnnotation> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, annotation: BlockAnnotation) {
        self.cache.insert(key, annotation).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate entry count; pending maintenance may lag.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Flush pending maintenance so `entry_count` is current.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for AnnotationCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = AnnotationCache::default();
        let key = CacheKey::new("gloss", "035ca48205e677");
        let annotation = BlockAnnotation::new("035ca48205e677").with_field("tag", "x");

        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), annotation.clone()).await;
        assert_eq!(cache.get(&key).await, Some(annotation));
    }

    #[tokio::test]
    async fn test_keys_separate_enrichers() {
        let cache = AnnotationCache::default();
        cache
            .insert(CacheKey::new("a", "b1"), BlockAnnotation::new("b1"))
            .await;
        assert!(cache.get(&CacheKey::new("other", "b1")).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = AnnotationCache::default();
        let key = CacheKey::new("a", "b1");
        cache.insert(key.clone(), BlockAnnotation::new("b1")).await;
        cache.sync().await;
        assert_eq!(cache.entry_count(), 1);

        cache.invalidate_all();
        assert!(cache.get(&key).await.is_none());
    }
}
