/// Tiered caching for upstream Printful data.
///
/// Two independent sub-caches: a whole-collection catalog snapshot with a
/// fixed refresh interval, and a per-entity persistent cache with its own
/// staleness verdicts. Both are consulted before any network call.
use crate::logger::{log, LogTag};
use crate::models::{Product, ProductInfo, VariantInfo};
use crate::store::EntityStore;
use chrono::Utc;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Full catalog listings are refreshed at most this often.
pub const CATALOG_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 3600);

/// Persisted entity records older than this are stale (still served, but
/// flagged so freshness-requiring callers refresh them).
pub const ENTITY_MAX_AGE_SECS: i64 = 24 * 3600;

/// Outcome of an entity cache lookup. Staleness is a verdict attached to an
/// otherwise-usable record, not an error and not a miss.
#[derive(Debug, Clone)]
pub enum Lookup<T> {
    Found { record: T, stale: bool },
    NotFound,
}

/// One full catalog listing, replaced wholesale on refresh.
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub fetched_at: Instant,
}

/// Holds the latest catalog snapshot. Readers see either the old or the new
/// snapshot atomically; the snapshot itself is never mutated in place.
pub struct CatalogCache {
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_interval: Duration,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::with_interval(CATALOG_REFRESH_INTERVAL)
    }

    pub fn with_interval(refresh_interval: Duration) -> Self {
        Self {
            snapshot: RwLock::new(None),
            refresh_interval,
        }
    }

    /// The current snapshot, only while inside the refresh window.
    pub fn fresh(&self) -> Option<Arc<CatalogSnapshot>> {
        let guard = self.snapshot.read().unwrap();
        let snapshot = guard.as_ref()?;
        if snapshot.fetched_at.elapsed() >= self.refresh_interval {
            return None;
        }
        Some(snapshot.clone())
    }

    /// Install a freshly fetched listing, replacing any prior snapshot.
    pub fn replace(&self, products: Vec<Product>) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(CatalogSnapshot {
            products,
            fetched_at: Instant::now(),
        });
        *self.snapshot.write().unwrap() = Some(snapshot.clone());
        snapshot
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Staleness layer over the persistent entity store.
///
/// Store failures degrade to `NotFound` so the read path falls through to
/// upstream, and write failures are logged and swallowed so a successful
/// fetch is never turned into a caller-visible failure by the cache.
pub struct EntityCache {
    store: EntityStore,
    max_age_secs: i64,
}

impl EntityCache {
    pub fn new(store: EntityStore) -> Self {
        Self {
            store,
            max_age_secs: ENTITY_MAX_AGE_SECS,
        }
    }

    pub fn find_product(&self, product_id: i64) -> Lookup<ProductInfo> {
        self.find_product_at(product_id, Utc::now().timestamp())
    }

    pub(crate) fn find_product_at(&self, product_id: i64, now: i64) -> Lookup<ProductInfo> {
        match self.store.find_product(product_id) {
            Ok(Some(record)) => Lookup::Found {
                stale: now - record.last_updated > self.max_age_secs,
                record: record.payload,
            },
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                log(
                    LogTag::Cache,
                    "WARN",
                    &format!("product {} lookup failed, treating as miss: {}", product_id, e),
                );
                Lookup::NotFound
            }
        }
    }

    pub fn upsert_product(&self, product_id: i64, info: &ProductInfo) {
        if let Err(e) = self.store.upsert_product(product_id, info) {
            log(
                LogTag::Cache,
                "WARN",
                &format!("failed to cache product {}: {}", product_id, e),
            );
        }
    }

    pub fn find_variant(&self, variant_id: i64) -> Lookup<VariantInfo> {
        self.find_variant_at(variant_id, Utc::now().timestamp())
    }

    pub(crate) fn find_variant_at(&self, variant_id: i64, now: i64) -> Lookup<VariantInfo> {
        match self.store.find_variant(variant_id) {
            Ok(Some(record)) => Lookup::Found {
                stale: now - record.last_updated > self.max_age_secs,
                record: record.payload,
            },
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                log(
                    LogTag::Cache,
                    "WARN",
                    &format!("variant {} lookup failed, treating as miss: {}", variant_id, e),
                );
                Lookup::NotFound
            }
        }
    }

    pub fn upsert_variant(&self, variant_id: i64, info: &VariantInfo) {
        if let Err(e) = self.store.upsert_variant(variant_id, info) {
            log(
                LogTag::Cache,
                "WARN",
                &format!("failed to cache variant {}: {}", variant_id, e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn product(id: i64) -> Product {
        Product {
            id,
            main_category_id: 0,
            product_type: String::new(),
            type_name: String::new(),
            title: format!("product {}", id),
            brand: None,
            model: String::new(),
            image: String::new(),
            variant_count: 0,
            currency: "USD".to_string(),
            description: String::new(),
        }
    }

    fn product_info(id: i64) -> ProductInfo {
        ProductInfo {
            product: product(id),
            variants: Vec::new(),
        }
    }

    #[test]
    fn record_is_fresh_through_the_full_trust_window() {
        let store = EntityStore::open_in_memory().unwrap();
        let cache = EntityCache::new(store.clone());
        let fetched_at = 1_700_000_000;
        store
            .upsert_product_at(42, &product_info(42), fetched_at)
            .unwrap();

        for now in [fetched_at, fetched_at + 3600, fetched_at + ENTITY_MAX_AGE_SECS] {
            match cache.find_product_at(42, now) {
                Lookup::Found { record, stale } => {
                    assert_eq!(record.product.id, 42);
                    assert!(!stale, "record unexpectedly stale at now={}", now);
                }
                Lookup::NotFound => panic!("record missing at now={}", now),
            }
        }
    }

    #[test]
    fn record_past_the_trust_window_is_returned_but_stale() {
        let store = EntityStore::open_in_memory().unwrap();
        let cache = EntityCache::new(store.clone());
        let fetched_at = 1_700_000_000;
        store
            .upsert_product_at(42, &product_info(42), fetched_at)
            .unwrap();

        match cache.find_product_at(42, fetched_at + ENTITY_MAX_AGE_SECS + 1) {
            Lookup::Found { record, stale } => {
                assert_eq!(record.product.id, 42);
                assert!(stale);
            }
            Lookup::NotFound => panic!("stale record must still be returned"),
        }
    }

    #[test]
    fn store_failure_degrades_to_a_miss_and_writes_are_swallowed() {
        let store = EntityStore::open_in_memory().unwrap();
        let cache = EntityCache::new(store.clone());
        store.drop_tables();

        assert!(matches!(cache.find_product(42), Lookup::NotFound));
        cache.upsert_product(42, &product_info(42));
    }

    #[test]
    fn missing_record_is_not_found() {
        let cache = EntityCache::new(EntityStore::open_in_memory().unwrap());
        assert!(matches!(cache.find_product(42), Lookup::NotFound));
        assert!(matches!(cache.find_variant(42), Lookup::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn catalog_snapshot_stays_fresh_inside_the_window() {
        let cache = CatalogCache::new();
        assert!(cache.fresh().is_none());

        let installed = cache.replace(vec![product(1), product(2)]);
        tokio::time::advance(Duration::from_secs(3600)).await;

        let snapshot = cache.fresh().expect("snapshot should still be fresh");
        assert!(Arc::ptr_eq(&installed, &snapshot));
        assert_eq!(snapshot.products.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn catalog_snapshot_expires_after_the_window() {
        let cache = CatalogCache::new();
        cache.replace(vec![product(1)]);

        tokio::time::advance(CATALOG_REFRESH_INTERVAL).await;
        assert!(cache.fresh().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn replace_swaps_the_snapshot_wholesale() {
        let cache = CatalogCache::new();
        let first = cache.replace(vec![product(1)]);
        let second = cache.replace(vec![product(1), product(2), product(3)]);

        assert!(!Arc::ptr_eq(&first, &second));
        let current = cache.fresh().unwrap();
        assert_eq!(current.products.len(), 3);
    }
}
