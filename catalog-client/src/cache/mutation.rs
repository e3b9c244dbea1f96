//! Optimistic mutation state machine
//!
//! A delete is applied to the cache before the server confirms it. The
//! snapshots taken at apply time make the transitions explicit and testable
//! without any UI framework:
//!
//! ```text
//! apply -> Pending -> commit    -> Committed   (entries marked stale)
//!                  -> roll_back -> RolledBack  (entries restored)
//! ```

use std::collections::HashMap;

use super::CacheEntry;
use shared::models::Product;
use shared::query::PaginatedResponse;

/// Lifecycle of one optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Applied locally, server outcome unknown
    Pending,
    /// Server confirmed; affected entries are marked for reconciliation
    Committed,
    /// Server failed; affected entries were restored
    RolledBack,
}

/// Pre-edit copy of one affected entry
#[derive(Debug)]
struct EntrySnapshot {
    key: String,
    pages: Vec<PaginatedResponse<Product>>,
    version: u64,
}

/// An optimistic delete in flight
#[derive(Debug)]
pub struct OptimisticDelete {
    product_id: i64,
    snapshots: Vec<EntrySnapshot>,
    state: MutationState,
}

impl OptimisticDelete {
    /// Remove the product from every cached entry it appears in,
    /// snapshotting each affected entry first. Totals shrink with the data
    /// so `has_more` stays consistent until the server reconciles.
    pub(crate) fn apply(map: &mut HashMap<String, CacheEntry>, product_id: i64) -> Self {
        let mut snapshots = Vec::new();

        for (key, entry) in map.iter_mut() {
            let affected = entry
                .pages
                .iter()
                .any(|page| page.data.iter().any(|p| p.id == product_id));
            if !affected {
                continue;
            }

            snapshots.push(EntrySnapshot {
                key: key.clone(),
                pages: entry.pages.clone(),
                version: entry.version,
            });

            for page in &mut entry.pages {
                page.data.retain(|p| p.id != product_id);
                page.total = page.total.saturating_sub(1);
            }
        }

        Self {
            product_id,
            snapshots,
            state: MutationState::Pending,
        }
    }

    /// Server confirmed the delete: the optimistic removal stands, and every
    /// affected entry is marked stale so its total reconciles on next read.
    pub(crate) fn commit(&mut self, map: &mut HashMap<String, CacheEntry>) {
        for snapshot in &self.snapshots {
            if let Some(entry) = map.get_mut(&snapshot.key) {
                entry.stale = true;
            }
        }
        self.state = MutationState::Committed;
    }

    /// Server failed: restore every snapshotted entry whose version did not
    /// move. An entry recommitted by a concurrent fetch already holds fresh
    /// server data, which wins over the snapshot.
    pub(crate) fn roll_back(&mut self, map: &mut HashMap<String, CacheEntry>) {
        for snapshot in self.snapshots.drain(..) {
            if let Some(entry) = map.get_mut(&snapshot.key)
                && entry.version == snapshot.version
            {
                entry.pages = snapshot.pages;
            }
        }
        self.state = MutationState::RolledBack;
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    /// How many cache entries the optimistic edit touched
    pub fn affected_entries(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchStatus;

    fn product(id: i64) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            description: None,
            price: id as f64,
            discounted_price: None,
            sku: format!("SKU-{id}"),
            photo_url: None,
            created_at: 1_000 + id,
            updated_at: 1_000 + id,
        }
    }

    fn entry_with(ids: &[i64], total: u64) -> CacheEntry {
        CacheEntry {
            pages: vec![PaginatedResponse::new(
                ids.iter().map(|id| product(*id)).collect(),
                total,
                1,
                10,
            )],
            status: FetchStatus::Success,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_removes_and_snapshots() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), entry_with(&[1, 2, 3], 3));
        map.insert("b".to_string(), entry_with(&[2, 4], 2));
        map.insert("c".to_string(), entry_with(&[5], 1));

        let mutation = OptimisticDelete::apply(&mut map, 2);
        assert_eq!(mutation.state(), MutationState::Pending);
        assert_eq!(mutation.product_id(), 2);
        assert_eq!(mutation.affected_entries(), 2);

        let a = &map["a"].pages[0];
        assert_eq!(a.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(a.total, 2);

        let b = &map["b"].pages[0];
        assert_eq!(b.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4]);
        assert_eq!(b.total, 1);

        // Untouched entry: no snapshot, no edit
        assert_eq!(map["c"].pages[0].total, 1);
    }

    #[test]
    fn test_commit_marks_affected_stale() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), entry_with(&[1, 2], 2));
        map.insert("c".to_string(), entry_with(&[5], 1));

        let mut mutation = OptimisticDelete::apply(&mut map, 2);
        mutation.commit(&mut map);

        assert_eq!(mutation.state(), MutationState::Committed);
        assert!(map["a"].stale);
        assert!(!map["c"].stale);
    }

    #[test]
    fn test_roll_back_restores_pages() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), entry_with(&[1, 2, 3], 3));

        let mut mutation = OptimisticDelete::apply(&mut map, 2);
        assert_eq!(map["a"].pages[0].data.len(), 2);

        mutation.roll_back(&mut map);
        assert_eq!(mutation.state(), MutationState::RolledBack);

        let a = &map["a"].pages[0];
        assert_eq!(
            a.data.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(a.total, 3);
    }

    #[test]
    fn test_roll_back_skips_recommitted_entry() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), entry_with(&[1, 2], 2));

        let mut mutation = OptimisticDelete::apply(&mut map, 2);

        // A fetch commits fresh server data while the delete is in flight
        let fresh = entry_with(&[1, 9], 2);
        let entry = map.get_mut("a").unwrap();
        entry.pages = fresh.pages;
        entry.version += 1;

        mutation.roll_back(&mut map);

        // Fresh data wins over the stale snapshot
        let a = &map["a"].pages[0];
        assert_eq!(a.data.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 9]);
    }
}
