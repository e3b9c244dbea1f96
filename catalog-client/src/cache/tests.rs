//! Cache synchronizer tests driven by an in-process fake API

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use shared::query::{SortField, SortOrder};

// ========================================================================
// Mock API
// ========================================================================

struct MockApi {
    products: Mutex<Vec<Product>>,
    fail_list: AtomicBool,
    fail_delete: AtomicBool,
    list_calls: AtomicUsize,
    delay_ms: AtomicU64,
}

impl MockApi {
    fn with_products(count: i64) -> Arc<Self> {
        let products = (1..=count).map(make_product).collect();
        Arc::new(Self {
            products: Mutex::new(products),
            fail_list: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        })
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

fn make_product(id: i64) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        description: None,
        price: id as f64,
        discounted_price: None,
        sku: format!("SKU-{id:03}"),
        photo_url: None,
        created_at: 1_000 + id,
        updated_at: 1_000 + id,
    }
}

#[async_trait]
impl ProductApi for MockApi {
    async fn list(&self, spec: &QuerySpec) -> ClientResult<PaginatedResponse<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Server(500, "list failed".into()));
        }

        let mut items: Vec<Product> = self.products.lock().unwrap().clone();
        if let Some(q) = &spec.search {
            let q = q.to_lowercase();
            items.retain(|p| {
                p.name.to_lowercase().contains(&q)
                    || p.description
                        .as_deref()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&q)
                    || p.sku.to_lowercase().contains(&q)
            });
        }
        if let Some(min) = spec.min_price {
            items.retain(|p| p.price >= min);
        }
        if let Some(max) = spec.max_price {
            items.retain(|p| p.price <= max);
        }

        items.sort_by(|a, b| {
            let ordering = match spec.sort {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Price => a.price.partial_cmp(&b.price).unwrap(),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                _ => a.id.cmp(&b.id),
            };
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = items.len() as u64;
        let start = ((spec.page - 1) * spec.limit) as usize;
        let data: Vec<Product> = items
            .into_iter()
            .skip(start)
            .take(spec.limit as usize)
            .collect();
        Ok(PaginatedResponse::new(data, total, spec.page, spec.limit))
    }

    async fn get(&self, id: i64) -> ClientResult<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("Product {id}")))
    }

    async fn create(&self, payload: &ProductCreate) -> ClientResult<Product> {
        let mut products = self.products.lock().unwrap();
        let id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let created = Product {
            id,
            name: payload.name.clone(),
            description: payload.description.clone(),
            price: payload.price,
            discounted_price: payload.discounted_price,
            sku: payload.sku.clone(),
            photo_url: payload.photo_url.clone(),
            created_at: 1_000 + id,
            updated_at: 1_000 + id,
        };
        products.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, payload: &ProductUpdate) -> ClientResult<Product> {
        let mut products = self.products.lock().unwrap();
        let item = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Product {id}")))?;
        if let Some(name) = &payload.name {
            item.name = name.clone();
        }
        if let Some(price) = payload.price {
            item.price = price;
        }
        Ok(item.clone())
    }

    async fn delete(&self, id: i64) -> ClientResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ClientError::Server(500, "delete failed".into()));
        }
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(ClientError::NotFound(format!("Product {id}")));
        }
        Ok(())
    }

    async fn upload_photo(
        &self,
        id: i64,
        _file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> ClientResult<Product> {
        let mut products = self.products.lock().unwrap();
        let item = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Product {id}")))?;
        item.photo_url = Some(format!("/uploads/mock-{id}.jpg"));
        Ok(item.clone())
    }

    async fn delete_photo(&self, id: i64) -> ClientResult<Product> {
        let mut products = self.products.lock().unwrap();
        let item = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Product {id}")))?;
        item.photo_url = None;
        Ok(item.clone())
    }
}

fn paged_spec() -> QuerySpec {
    QuerySpec::paged()
        .limit(10)
        .order_by(SortField::Id, SortOrder::Asc)
}

fn infinite_spec() -> QuerySpec {
    QuerySpec::infinite()
        .limit(10)
        .order_by(SortField::Id, SortOrder::Asc)
}

/// Wait until the entry's background fetch settles
async fn settle(cache: &CatalogCache, spec: &QuerySpec) -> CacheSnapshot {
    for _ in 0..100 {
        if let Some(snapshot) = cache.snapshot(spec)
            && snapshot.status != FetchStatus::Fetching
        {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("cache entry never settled");
}

// ========================================================================
// Read path
// ========================================================================

#[tokio::test]
async fn test_query_fetches_once_and_caches() {
    let api = MockApi::with_products(5);
    let cache = CatalogCache::new(api.clone());
    let spec = paged_spec();

    let first = cache.query(&spec).await.expect("query");
    assert_eq!(first.products.len(), 5);
    assert_eq!(first.total, 5);
    assert_eq!(first.status, FetchStatus::Success);
    assert_eq!(api.list_calls(), 1);

    // Second read answers from the cache
    let second = cache.query(&spec).await.expect("query");
    assert_eq!(second.products, first.products);
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test]
async fn test_distinct_signatures_fetch_separately() {
    let api = MockApi::with_products(5);
    let cache = CatalogCache::new(api.clone());

    cache.query(&paged_spec()).await.expect("query");
    cache
        .query(&paged_spec().search("Product 3"))
        .await
        .expect("query");
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn test_concurrent_reads_deduplicate() {
    let api = MockApi::with_products(5);
    api.delay_ms.store(50, Ordering::SeqCst);
    let cache = CatalogCache::new(api.clone());
    let spec = paged_spec();

    let (a, b) = tokio::join!(cache.query(&spec), cache.query(&spec));
    let a = a.expect("query");
    let b = b.expect("query");

    assert_eq!(a.products, b.products);
    // One network call served both readers
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test]
async fn test_error_without_data_is_returned() {
    let api = MockApi::with_products(5);
    api.fail_list.store(true, Ordering::SeqCst);
    let cache = CatalogCache::new(api.clone());

    let err = cache.query(&paged_spec()).await.unwrap_err();
    assert_eq!(err, ClientError::Server(500, "list failed".into()));
}

#[tokio::test]
async fn test_error_preserves_previous_data() {
    let api = MockApi::with_products(5);
    let cache = CatalogCache::new(api.clone());
    let spec = paged_spec();

    let good = cache.query(&spec).await.expect("query");

    // Later reads hit a failing server
    api.fail_list.store(true, Ordering::SeqCst);
    cache.invalidate_all();

    // Stale entry still answers with the old data
    let served = cache.query(&spec).await.expect("query");
    assert_eq!(served.products, good.products);

    // Background refetch fails; data survives next to the error
    let settled = settle(&cache, &spec).await;
    assert_eq!(settled.status, FetchStatus::Error);
    assert_eq!(settled.products, good.products);
    let error = settled.error.expect("error recorded");
    assert!(error.retryable());
}

#[tokio::test]
async fn test_dropped_reader_does_not_strand_the_fetch() {
    let api = MockApi::with_products(5);
    api.delay_ms.store(30, Ordering::SeqCst);
    let cache = CatalogCache::new(api.clone());
    let spec = paged_spec();

    // Reader torn down before its fetch resolves; the timeout drops the future
    let torn_down = tokio::time::timeout(Duration::from_millis(5), cache.query(&spec)).await;
    assert!(torn_down.is_err());

    // The detached fetch still commits exactly once
    let settled = settle(&cache, &spec).await;
    assert_eq!(settled.status, FetchStatus::Success);
    assert_eq!(settled.products.len(), 5);
    assert_eq!(api.list_calls(), 1);

    // Later reads answer from the committed entry
    let again = cache.query(&spec).await.expect("query");
    assert_eq!(again.products.len(), 5);
    assert_eq!(api.list_calls(), 1);
}

// ========================================================================
// Infinite accumulation
// ========================================================================

#[tokio::test]
async fn test_infinite_accumulation_covers_all_ids() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    let spec = infinite_spec();

    let first = cache.query(&spec).await.expect("query");
    assert_eq!(first.products.len(), 10);
    assert_eq!(first.total, 25);
    assert!(first.has_more);

    let mut fetches = 0;
    while cache.snapshot(&spec).expect("entry").has_more {
        assert!(cache.fetch_next_page(&spec).await.expect("next page"));
        fetches += 1;
        assert!(fetches <= 3, "accumulation never terminated");
    }

    let done = cache.snapshot(&spec).expect("entry");
    assert_eq!(done.products.len(), 25);
    assert!(!done.has_more);

    // Every id exactly once
    let mut ids: Vec<i64> = done.products.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 25);

    // Page sizes were 10/10/5
    assert_eq!(api.list_calls(), 3);

    // Fully covered: no further fetch is triggered
    assert!(!cache.fetch_next_page(&spec).await.expect("guarded"));
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test]
async fn test_fetch_next_page_is_guarded_while_fetching() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    let spec = infinite_spec();

    cache.query(&spec).await.expect("query");
    assert_eq!(api.list_calls(), 1);

    api.delay_ms.store(50, Ordering::SeqCst);
    let (a, b) = tokio::join!(cache.fetch_next_page(&spec), cache.fetch_next_page(&spec));
    let results = [a.expect("next"), b.expect("next")];

    // Exactly one of the two rode the single outstanding fetch
    assert_eq!(results.iter().filter(|fetched| **fetched).count(), 1);
    assert_eq!(api.list_calls(), 2);
    assert_eq!(cache.snapshot(&spec).expect("entry").products.len(), 20);
}

#[tokio::test]
async fn test_fetch_next_page_without_initial_load_is_noop() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());

    assert!(!cache.fetch_next_page(&infinite_spec()).await.expect("noop"));
    assert_eq!(api.list_calls(), 0);
}

// ========================================================================
// Optimistic delete
// ========================================================================

#[tokio::test]
async fn test_optimistic_delete_updates_every_signature() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    let paged = paged_spec();
    let infinite = infinite_spec();

    cache.query(&paged).await.expect("query");
    cache.query(&infinite).await.expect("query");

    cache.delete_product(3).await.expect("delete");

    // Both signatures reflect the removal immediately
    for spec in [&paged, &infinite] {
        let snapshot = cache.snapshot(spec).expect("entry");
        assert!(snapshot.products.iter().all(|p| p.id != 3));
        assert_eq!(snapshot.total, 24);
        assert!(snapshot.stale, "entry must reconcile after confirmation");
    }
}

#[tokio::test]
async fn test_optimistic_delete_rolls_back_on_failure() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    let paged = paged_spec();
    let infinite = infinite_spec();

    cache.query(&paged).await.expect("query");
    cache.query(&infinite).await.expect("query");
    let before_paged = cache.snapshot(&paged).expect("entry");
    let before_infinite = cache.snapshot(&infinite).expect("entry");

    api.fail_delete.store(true, Ordering::SeqCst);
    let err = cache.delete_product(3).await.unwrap_err();
    assert!(err.retryable());

    // Byte-for-byte restoration: same products, order, total, state
    assert_eq!(cache.snapshot(&paged).expect("entry"), before_paged);
    assert_eq!(cache.snapshot(&infinite).expect("entry"), before_infinite);
}

#[tokio::test]
async fn test_delete_untouched_entries_stay_fresh() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    // Window holding ids 11..=20 only
    let other_page = paged_spec().page(2);

    cache.query(&other_page).await.expect("query");
    cache.delete_product(3).await.expect("delete");

    // id 3 never appeared here, so the entry was not touched
    let snapshot = cache.snapshot(&other_page).expect("entry");
    assert!(!snapshot.stale);
    assert_eq!(snapshot.products.len(), 10);
}

// ========================================================================
// Non-optimistic mutations
// ========================================================================

#[tokio::test]
async fn test_create_invalidates_all_entries() {
    let api = MockApi::with_products(5);
    let cache = CatalogCache::new(api.clone());
    let paged = paged_spec();
    let infinite = infinite_spec();

    cache.query(&paged).await.expect("query");
    cache.query(&infinite).await.expect("query");

    let payload = ProductCreate {
        name: "Fresh".into(),
        description: None,
        price: 9.0,
        discounted_price: None,
        sku: "SKU-NEW".into(),
        photo_url: None,
    };
    cache.create_product(&payload).await.expect("create");

    assert!(cache.snapshot(&paged).expect("entry").stale);
    assert!(cache.snapshot(&infinite).expect("entry").stale);

    // Next read reconciles; the stale answer comes first, then the refresh
    cache.query(&paged).await.expect("query");
    let settled = settle(&cache, &paged).await;
    assert_eq!(settled.total, 6);
    assert!(!settled.stale);
}

#[tokio::test]
async fn test_update_invalidates_all_entries() {
    let api = MockApi::with_products(5);
    let cache = CatalogCache::new(api.clone());
    let paged = paged_spec();

    cache.query(&paged).await.expect("query");

    let updated = cache
        .update_product(
            2,
            &ProductUpdate {
                price: Some(42.0),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.price, 42.0);
    assert!(cache.snapshot(&paged).expect("entry").stale);

    // Reconciled data carries the new price
    cache.query(&paged).await.expect("query");
    let settled = settle(&cache, &paged).await;
    let item = settled.products.iter().find(|p| p.id == 2).expect("product 2");
    assert_eq!(item.price, 42.0);
}

#[tokio::test]
async fn test_photo_mutations_invalidate_entries_containing_product() {
    let api = MockApi::with_products(25);
    let cache = CatalogCache::new(api.clone());
    // Entry containing id 2 and one that cannot contain it
    let with_product = paged_spec();
    let without_product = paged_spec().page(2);

    cache.query(&with_product).await.expect("query");
    cache.query(&without_product).await.expect("query");

    let updated = cache
        .upload_photo(2, "photo.png", "image/png", b"bytes".to_vec())
        .await
        .expect("upload");
    assert_eq!(updated.photo_url.as_deref(), Some("/uploads/mock-2.jpg"));

    assert!(cache.snapshot(&with_product).expect("entry").stale);
    assert!(!cache.snapshot(&without_product).expect("entry").stale);

    // Reconcile, then detach and check the same invalidation path
    cache.query(&with_product).await.expect("query");
    let settled = settle(&cache, &with_product).await;
    let refreshed = settled
        .products
        .iter()
        .find(|p| p.id == 2)
        .expect("product 2");
    assert_eq!(refreshed.photo_url.as_deref(), Some("/uploads/mock-2.jpg"));

    let cleared = cache.remove_photo(2).await.expect("detach");
    assert!(cleared.photo_url.is_none());
    assert!(cache.snapshot(&with_product).expect("entry").stale);
}
