use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use trendrank_core::{CoreResult, Period};

/// Abstracts rank resolution away from a concrete `RankReader` so the
/// composer can be unit-tested without a live Postgres/Redis connection.
#[async_trait]
pub trait RankSource: Send + Sync {
    async fn find_rank(&self, period: Period, product_id: i64) -> CoreResult<Option<i64>>;
}

#[async_trait]
impl<'a> RankSource for crate::rank_reader::RankReader<'a> {
    async fn find_rank(&self, period: Period, product_id: i64) -> CoreResult<Option<i64>> {
        crate::rank_reader::RankReader::find_rank(self, period, product_id).await
    }
}

/// Minimal product-detail shape cached by the composer (C11). Fields
/// beyond identity are out of scope (generic product CRUD is an external
/// collaborator) but `stock` is kept because spec.md's testable scenario 4
/// exercises a stale-vs-fresh detail field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProductDetailV1 {
    pub product_id: i64,
    pub name: String,
    pub stock: i64,
    pub rank: Option<i64>,
}

/// The list cache stores only ordered product ids plus the total count —
/// never the full detail payload, so a list-cache hit always recombines
/// with (possibly fresher) per-item detail-cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProductListV1 {
    pub product_ids: Vec<i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListCacheKey {
    pub page: u32,
    pub size: u32,
    pub sort: &'static str,
    pub brand_id: Option<i64>,
}

impl ListCacheKey {
    /// Deterministic function of its inputs: equivalent requests produce
    /// byte-identical cache keys.
    fn cache_string(&self) -> String {
        format!(
            "list:{}:{}:{}:{}",
            self.page,
            self.size,
            self.sort,
            self.brand_id.map(|b| b.to_string()).unwrap_or_else(|| "none".to_string())
        )
    }
}

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64 * 100.0
        }
    }
}

/// Two Moka caches — one per-product detail, one per-list-query — composed
/// the way spec.md §4.11 requires: a list-cache hit preserves its cached id
/// order exactly, re-reading detail-cache entries (or the DB, for misses)
/// per id rather than re-running the list query.
pub struct ProductCache {
    detail: MokaCache<i64, CachedProductDetailV1>,
    list: MokaCache<String, CachedProductListV1>,
    pub detail_metrics: CacheMetrics,
    pub list_metrics: CacheMetrics,
}

impl ProductCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            detail: MokaCache::builder().max_capacity(capacity).time_to_live(ttl).build(),
            list: MokaCache::builder().max_capacity(capacity).time_to_live(ttl).build(),
            detail_metrics: CacheMetrics::default(),
            list_metrics: CacheMetrics::default(),
        }
    }

    pub async fn get_detail(&self, product_id: i64) -> Option<CachedProductDetailV1> {
        let hit = self.detail.get(&product_id).await;
        if hit.is_some() {
            self.detail_metrics.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.detail_metrics.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub async fn put_detail(&self, detail: CachedProductDetailV1) {
        self.detail.insert(detail.product_id, detail).await;
    }

    /// Called by the owning product service when it pushes a write for
    /// `product_id`; no in-process caller exists here since product writes
    /// are out of scope for this service.
    #[allow(dead_code)]
    pub async fn invalidate_detail(&self, product_id: i64) {
        self.detail.invalidate(&product_id).await;
    }

    pub async fn get_list(&self, key: &ListCacheKey) -> Option<CachedProductListV1> {
        let hit = self.list.get(&key.cache_string()).await;
        if hit.is_some() {
            self.list_metrics.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.list_metrics.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub async fn put_list(&self, key: &ListCacheKey, value: CachedProductListV1) {
        self.list.insert(key.cache_string(), value).await;
    }
}

/// Product identity/inventory lookup that this composer sits in front of.
/// Generic product CRUD is an external collaborator (out of scope), so the
/// composer depends on this trait rather than a concrete table — matching
/// how spec.md's testable scenario 4 exercises it with a fake/in-memory
/// fetcher instead of a real database.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn fetch_detail(&self, product_id: i64) -> CoreResult<Option<CachedProductDetailV1>>;
    /// Returns the full ordered id list and total count for a list query.
    async fn fetch_list_ids(&self, criteria: &ListCacheKey) -> CoreResult<(Vec<i64>, i64)>;
}

/// List-query criteria beyond pagination; `page >= 3` always bypasses both
/// caches (tail pages are rare and small, per spec.md §4.11).
const CACHED_PAGE_LIMIT: u32 = 3;

pub struct ProductCacheComposer<'a, S: ProductStore, R: RankSource> {
    cache: &'a ProductCache,
    store: &'a S,
    rank_source: &'a R,
}

impl<'a, S: ProductStore, R: RankSource> ProductCacheComposer<'a, S, R> {
    pub fn new(cache: &'a ProductCache, store: &'a S, rank_source: &'a R) -> Self {
        Self { cache, store, rank_source }
    }

    /// `findProductById`: detail-cache hit, else DB load + fill. Resolves
    /// `rank` against the hourly period regardless of cache outcome, then
    /// emits a `ProductViewedEventV1` synchronously before returning (the
    /// downstream event consumer is an external collaborator, so emission
    /// here is a structured tracing event rather than a queue publish).
    pub async fn find_product_by_id(
        &self,
        product_id: i64,
        user_id: Option<i64>,
    ) -> CoreResult<Option<CachedProductDetailV1>> {
        let mut detail = match self.cache.get_detail(product_id).await {
            Some(d) => d,
            None => match self.store.fetch_detail(product_id).await? {
                Some(d) => {
                    self.cache.put_detail(d.clone()).await;
                    d
                }
                None => return Ok(None),
            },
        };
        detail.rank = match self.rank_source.find_rank(Period::Hourly, product_id).await {
            Ok(rank) => rank,
            Err(e) => {
                tracing::warn!(error = %e, product_id, "rank lookup failed, returning rank=null");
                None
            }
        };
        tracing::info!(
            event = "ProductViewedEventV1",
            product_id,
            user_id,
            "product detail viewed"
        );
        Ok(Some(detail))
    }

    /// `findProducts`: list-cache composition. A hit preserves the cached
    /// id order exactly, splicing DB-sourced misses back into place.
    pub async fn find_products(&self, key: ListCacheKey, page: u32) -> CoreResult<(Vec<CachedProductDetailV1>, i64)> {
        if page >= CACHED_PAGE_LIMIT {
            let (ids, total) = self.store.fetch_list_ids(&key).await?;
            let details = self.load_details_uncached(&ids).await?;
            return Ok((details, total));
        }

        if let Some(cached) = self.cache.get_list(&key).await {
            let details = self.resolve_ids_preserving_order(&cached.product_ids).await?;
            return Ok((details, cached.total));
        }

        let (ids, total) = self.store.fetch_list_ids(&key).await?;
        self.cache.put_list(&key, CachedProductListV1 { product_ids: ids.clone(), total }).await;
        let details = self.load_details_uncached(&ids).await?;
        Ok((details, total))
    }

    async fn load_details_uncached(&self, ids: &[i64]) -> CoreResult<Vec<CachedProductDetailV1>> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(detail) = self.store.fetch_detail(id).await? {
                self.cache.put_detail(detail.clone()).await;
                out.push(detail);
            }
        }
        Ok(out)
    }

    async fn resolve_ids_preserving_order(&self, ids: &[i64]) -> CoreResult<Vec<CachedProductDetailV1>> {
        let mut missing = Vec::new();
        let mut resolved: Vec<Option<CachedProductDetailV1>> = Vec::with_capacity(ids.len());
        for &id in ids {
            let hit = self.cache.get_detail(id).await;
            if hit.is_none() {
                missing.push(id);
            }
            resolved.push(hit);
        }

        if !missing.is_empty() {
            let mut fetched = std::collections::HashMap::new();
            for id in &missing {
                if let Some(detail) = self.store.fetch_detail(*id).await? {
                    self.cache.put_detail(detail.clone()).await;
                    fetched.insert(*id, detail);
                }
            }
            for (slot, id) in resolved.iter_mut().zip(ids.iter()) {
                if slot.is_none() {
                    *slot = fetched.get(id).cloned();
                }
            }
        }

        Ok(resolved.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_cache_key_is_deterministic() {
        let a = ListCacheKey { page: 0, size: 20, sort: "popular", brand_id: None };
        let b = ListCacheKey { page: 0, size: 20, sort: "popular", brand_id: None };
        assert_eq!(a.cache_string(), b.cache_string());
    }

    #[tokio::test]
    async fn detail_cache_hit_then_invalidate() {
        let cache = ProductCache::new(100, Duration::from_secs(60));
        let detail = CachedProductDetailV1 { product_id: 1, name: "p1".into(), stock: 10, rank: Some(3) };
        cache.put_detail(detail.clone()).await;
        assert_eq!(cache.get_detail(1).await, Some(detail));
        cache.invalidate_detail(1).await;
        assert_eq!(cache.get_detail(1).await, None);
    }

    struct FakeStore {
        details: std::sync::Mutex<std::collections::HashMap<i64, CachedProductDetailV1>>,
        list_ids: Vec<i64>,
        fetch_detail_calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ProductStore for FakeStore {
        async fn fetch_detail(&self, product_id: i64) -> CoreResult<Option<CachedProductDetailV1>> {
            self.fetch_detail_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.details.lock().unwrap().get(&product_id).cloned())
        }

        async fn fetch_list_ids(&self, _criteria: &ListCacheKey) -> CoreResult<(Vec<i64>, i64)> {
            Ok((self.list_ids.clone(), self.list_ids.len() as i64))
        }
    }

    struct NoRank;

    #[async_trait]
    impl RankSource for NoRank {
        async fn find_rank(&self, _period: Period, _product_id: i64) -> CoreResult<Option<i64>> {
            Ok(None)
        }
    }

    fn detail(id: i64, stock: i64) -> CachedProductDetailV1 {
        CachedProductDetailV1 { product_id: id, name: format!("p{id}"), stock, rank: None }
    }

    /// spec.md §8 scenario 4: a list-cache hit preserves cached id order
    /// exactly, splicing DB-sourced misses for stale/evicted detail
    /// entries back into their original position.
    #[tokio::test]
    async fn list_cache_hit_preserves_order_with_spliced_misses() {
        let cache = ProductCache::new(100, Duration::from_secs(60));
        let store = FakeStore {
            details: std::sync::Mutex::new(
                [(1, detail(1, 5)), (2, detail(2, 9)), (3, detail(3, 1))].into_iter().collect(),
            ),
            list_ids: vec![1, 2, 3],
            fetch_detail_calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let rank_source = NoRank;
        let composer = ProductCacheComposer::new(&cache, &store, &rank_source);

        let key = ListCacheKey { page: 0, size: 20, sort: "popular", brand_id: None };
        let (first, total) = composer.find_products(key, 0).await.unwrap();
        assert_eq!(first.iter().map(|d| d.product_id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(total, 3);

        cache.invalidate_detail(2).await;
        store.details.lock().unwrap().insert(2, detail(2, 42));

        let (second, _) = composer.find_products(key, 0).await.unwrap();
        assert_eq!(second.iter().map(|d| d.product_id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(second[1].stock, 42);
    }

    #[tokio::test]
    async fn find_product_by_id_fills_cache_and_resolves_rank() {
        let cache = ProductCache::new(100, Duration::from_secs(60));
        let store = FakeStore {
            details: std::sync::Mutex::new([(1, detail(1, 5))].into_iter().collect()),
            list_ids: vec![1],
            fetch_detail_calls: std::sync::atomic::AtomicUsize::new(0),
        };
        struct FixedRank;
        #[async_trait]
        impl RankSource for FixedRank {
            async fn find_rank(&self, _period: Period, _product_id: i64) -> CoreResult<Option<i64>> {
                Ok(Some(7))
            }
        }
        let rank_source = FixedRank;
        let composer = ProductCacheComposer::new(&cache, &store, &rank_source);

        let found = composer.find_product_by_id(1, Some(42)).await.unwrap().unwrap();
        assert_eq!(found.rank, Some(7));
        assert_eq!(cache.get_detail(1).await.unwrap().product_id, 1);
        assert_eq!(store.fetch_detail_calls.load(Ordering::Relaxed), 1);

        composer.find_product_by_id(1, None).await.unwrap();
        assert_eq!(store.fetch_detail_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn tail_pages_bypass_both_caches() {
        let cache = ProductCache::new(100, Duration::from_secs(60));
        let store = FakeStore {
            details: std::sync::Mutex::new([(9, detail(9, 1))].into_iter().collect()),
            list_ids: vec![9],
            fetch_detail_calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let rank_source = NoRank;
        let composer = ProductCacheComposer::new(&cache, &store, &rank_source);

        let key = ListCacheKey { page: 3, size: 20, sort: "popular", brand_id: None };
        composer.find_products(key, 3).await.unwrap();
        assert!(cache.get_list(&key).await.is_none());
    }
}
