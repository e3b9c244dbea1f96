//! Client Cache Synchronizer
//!
//! Page-keyed cache of listing results with in-flight fetch deduplication,
//! optimistic delete with rollback, and invalidate/refetch after confirmed
//! writes.
//!
//! [`CatalogCache`] is an explicitly constructed instance injected wherever
//! it is needed. Its map is the only shared mutable state on the client and
//! every mutation of it happens inside one synchronous critical section,
//! never across an `.await`. Fetches run as detached tasks: a caller torn
//! down mid-await abandons its subscription while the fetch still commits
//! exactly once, so no entry is ever stuck `Fetching`.

mod mutation;

#[cfg(test)]
mod tests;

pub use mutation::{MutationState, OptimisticDelete};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::api::ProductApi;
use crate::error::{ClientError, ClientResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::query::{PaginatedResponse, QuerySpec};

/// Fetch lifecycle of one cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
    Success,
    Error,
}

/// One cached query: accumulated pages plus fetch state
#[derive(Debug, Default)]
pub(crate) struct CacheEntry {
    /// Envelopes in page order; exactly one in paged mode
    pub(crate) pages: Vec<PaginatedResponse<Product>>,
    pub(crate) status: FetchStatus,
    /// Set by invalidation; data stays readable while a refetch runs
    pub(crate) stale: bool,
    /// Last fetch error, kept alongside any previous data
    pub(crate) error: Option<ClientError>,
    /// Bumped on every fetch commit; lets a rollback detect that fresh
    /// server data arrived after the snapshot was taken
    pub(crate) version: u64,
    /// In-flight marker; dropping the sender wakes all waiters
    inflight: Option<broadcast::Sender<()>>,
}

impl CacheEntry {
    /// Wait handle for the in-flight fetch. With nothing in flight the
    /// returned receiver is already closed, waking the caller immediately.
    fn subscribe(&self) -> broadcast::Receiver<()> {
        match &self.inflight {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            }
        }
    }

    /// Whether more pages exist beyond the accumulated ones.
    ///
    /// Decided against the most recently fetched envelope's total; if total
    /// moved between fetches this is an accepted approximation.
    fn has_more(&self) -> bool {
        match self.pages.last() {
            Some(last) => (self.pages.len() as u64) * (last.limit as u64) < last.total,
            None => true,
        }
    }

    fn products(&self) -> Vec<Product> {
        self.pages
            .iter()
            .flat_map(|page| page.data.iter().cloned())
            .collect()
    }

    fn total(&self) -> u64 {
        self.pages.last().map(|page| page.total).unwrap_or(0)
    }

    fn error_or_unknown(&self) -> ClientError {
        self.error
            .clone()
            .unwrap_or_else(|| ClientError::InvalidResponse("Fetch failed".into()))
    }
}

/// What a read hands to the UI: accumulated data plus entry state
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    /// Accumulated products in page order
    pub products: Vec<Product>,
    /// Total match count from the most recent envelope
    pub total: u64,
    pub status: FetchStatus,
    pub stale: bool,
    /// Whether another page can be fetched (infinite mode)
    pub has_more: bool,
    /// Last fetch error, if any (data above may still be served)
    pub error: Option<ClientError>,
}

fn snapshot_of(entry: &CacheEntry) -> CacheSnapshot {
    CacheSnapshot {
        products: entry.products(),
        total: entry.total(),
        status: entry.status,
        stale: entry.stale,
        has_more: entry.has_more(),
        error: entry.error.clone(),
    }
}

/// Page-keyed product cache bound to one [`ProductApi`]
#[derive(Clone)]
pub struct CatalogCache {
    api: Arc<dyn ProductApi>,
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl CatalogCache {
    pub fn new(api: Arc<dyn ProductApi>) -> Self {
        Self {
            api,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.inner.lock().expect("cache lock poisoned")
    }

    /// Read the cached result for `spec`, fetching when absent.
    ///
    /// - fresh data answers immediately;
    /// - a stale entry answers immediately and refreshes in the background;
    /// - a signature already `Fetching` attaches to the in-flight call
    ///   instead of issuing a second one;
    /// - after a failed fetch, previous data is served with the error kept
    ///   on the snapshot; with no previous data the error is returned.
    pub async fn query(&self, spec: &QuerySpec) -> ClientResult<CacheSnapshot> {
        let key = spec.signature();
        let mut waited = false;
        loop {
            let rx = {
                let mut map = self.lock();
                let entry = map.entry(key.clone()).or_default();
                match entry.status {
                    FetchStatus::Fetching => entry.subscribe(),
                    FetchStatus::Error if waited => {
                        return if entry.pages.is_empty() {
                            Err(entry.error_or_unknown())
                        } else {
                            Ok(snapshot_of(entry))
                        };
                    }
                    _ if !entry.pages.is_empty()
                        && !entry.stale
                        && entry.status != FetchStatus::Error =>
                    {
                        return Ok(snapshot_of(entry));
                    }
                    _ => {
                        if !entry.pages.is_empty() && !waited {
                            // Serve what we have now; reconcile in the background
                            let snapshot = snapshot_of(entry);
                            self.begin_fetch(entry, &key, spec, 1, false);
                            return Ok(snapshot);
                        }
                        self.begin_fetch(entry, &key, spec, 1, false);
                        entry.subscribe()
                    }
                }
            };

            let mut rx = rx;
            let _ = rx.recv().await;
            waited = true;
        }
    }

    /// Guarded next-page fetch for infinite accumulation.
    ///
    /// Returns `Ok(false)` without a network call while a fetch for this
    /// signature is outstanding, when nothing is loaded yet, or when the
    /// accumulated pages already cover `total`. Returns `Ok(true)` once the
    /// next page has been appended.
    pub async fn fetch_next_page(&self, spec: &QuerySpec) -> ClientResult<bool> {
        let key = spec.signature();
        let rx = {
            let mut map = self.lock();
            let entry = map.entry(key.clone()).or_default();
            if entry.status == FetchStatus::Fetching {
                return Ok(false);
            }
            if entry.pages.is_empty() || !entry.has_more() {
                return Ok(false);
            }
            let next_page = entry.pages.len() as u32 + 1;
            self.begin_fetch(entry, &key, spec, next_page, true);
            entry.subscribe()
        };

        let mut rx = rx;
        let _ = rx.recv().await;

        let mut map = self.lock();
        let entry = map.entry(key).or_default();
        match entry.status {
            FetchStatus::Error => Err(entry.error_or_unknown()),
            _ => Ok(true),
        }
    }

    /// Peek at the cached state without triggering any fetch
    pub fn snapshot(&self, spec: &QuerySpec) -> Option<CacheSnapshot> {
        let map = self.lock();
        map.get(&spec.signature()).map(snapshot_of)
    }

    /// Optimistically delete a product: remove it from every cached entry
    /// (all signatures, both modes), confirm with the server, then mark the
    /// affected entries stale on success or restore them on failure.
    pub async fn delete_product(&self, id: i64) -> ClientResult<()> {
        let mut mutation = {
            let mut map = self.lock();
            OptimisticDelete::apply(&mut map, id)
        };

        match self.api.delete(id).await {
            Ok(()) => {
                let mut map = self.lock();
                mutation.commit(&mut map);
                Ok(())
            }
            Err(e) => {
                let mut map = self.lock();
                mutation.roll_back(&mut map);
                tracing::warn!(id, error = %e, "Delete failed, optimistic removal rolled back");
                Err(e)
            }
        }
    }

    /// Create a product. Not optimistic: every list entry may now be out of
    /// date, so all of them are invalidated once the server confirms.
    pub async fn create_product(&self, payload: &ProductCreate) -> ClientResult<Product> {
        let created = self.api.create(payload).await?;
        self.invalidate_all();
        Ok(created)
    }

    /// Update a product. Not optimistic; invalidates every list entry since
    /// changed fields can move the product in or out of any filter.
    pub async fn update_product(&self, id: i64, payload: &ProductUpdate) -> ClientResult<Product> {
        let updated = self.api.update(id, payload).await?;
        self.invalidate_all();
        Ok(updated)
    }

    /// Attach a photo. Not optimistic: the new photoUrl is re-fetched rather
    /// than guessed, by invalidating every entry containing the product.
    pub async fn upload_photo(
        &self,
        id: i64,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Product> {
        let updated = self
            .api
            .upload_photo(id, file_name, content_type, bytes)
            .await?;
        self.invalidate_product(id);
        Ok(updated)
    }

    /// Detach a photo; same reconciliation as [`Self::upload_photo`]
    pub async fn remove_photo(&self, id: i64) -> ClientResult<Product> {
        let updated = self.api.delete_photo(id).await?;
        self.invalidate_product(id);
        Ok(updated)
    }

    /// Fetch one product, bypassing the list cache
    pub async fn get_product(&self, id: i64) -> ClientResult<Product> {
        self.api.get(id).await
    }

    /// Mark every populated entry stale. Entries are never dropped: data
    /// stays readable until the refetch lands, so the UI never flashes empty.
    pub fn invalidate_all(&self) {
        let mut map = self.lock();
        for entry in map.values_mut() {
            if !entry.pages.is_empty() {
                entry.stale = true;
            }
        }
    }

    /// Mark every entry containing the product stale
    pub fn invalidate_product(&self, id: i64) {
        let mut map = self.lock();
        for entry in map.values_mut() {
            let contains = entry
                .pages
                .iter()
                .any(|page| page.data.iter().any(|item| item.id == id));
            if contains {
                entry.stale = true;
            }
        }
    }

    /// Start a detached fetch for `page` of `spec`, recording the in-flight
    /// marker on the entry. Callers subscribe to the entry to await it.
    fn begin_fetch(
        &self,
        entry: &mut CacheEntry,
        key: &str,
        spec: &QuerySpec,
        page: u32,
        append: bool,
    ) {
        let (tx, _) = broadcast::channel(1);
        entry.status = FetchStatus::Fetching;
        entry.inflight = Some(tx);

        let cache = self.clone();
        let key = key.to_string();
        let mut spec = spec.clone();
        spec.page = page;

        tokio::spawn(async move {
            let result = cache.api.list(&spec).await;
            cache.commit_fetch(&key, result, append);
        });
    }

    /// Commit a fetch outcome. Runs in one synchronous critical section.
    fn commit_fetch(
        &self,
        key: &str,
        result: ClientResult<PaginatedResponse<Product>>,
        append: bool,
    ) {
        let mut map = self.lock();
        let Some(entry) = map.get_mut(key) else {
            return;
        };

        match result {
            Ok(envelope) => {
                if append {
                    entry.pages.push(envelope);
                } else {
                    entry.pages = vec![envelope];
                }
                entry.status = FetchStatus::Success;
                entry.stale = false;
                entry.error = None;
                entry.version += 1;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "List fetch failed");
                entry.status = FetchStatus::Error;
                entry.error = Some(e);
            }
        }

        // Dropping the sender wakes everyone attached to this fetch
        entry.inflight = None;
    }
}
