//! A single named cache store with FIFO eviction.
//!
//! Entries carry a monotonically increasing insertion order; eviction
//! removes the oldest-inserted entries, never the least-recently-used.
//! Lookups do not touch the order, so a hot entry that arrived early is
//! still the first to go. Re-inserting an existing key gives it a fresh
//! order — the entry is as new as its content.

use super::fetch::Response;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store's byte quota cannot hold the entry even after eviction.
    #[error("quota exceeded in store {store}: entry of {needed} bytes, {available} available")]
    QuotaExceeded {
        store: String,
        needed: usize,
        available: usize,
    },
}

#[derive(Debug, Clone)]
struct Entry {
    response: Response,
    insertion_order: u64,
}

/// One isolated cache namespace.
#[derive(Debug)]
pub struct CategoryStore {
    name: String,
    /// `None` means always-kept: no count-based eviction (precache).
    max_entries: Option<usize>,
    quota_bytes: Option<usize>,
    used_bytes: usize,
    next_order: u64,
    entries: HashMap<String, Entry>,
}

impl CategoryStore {
    /// Store bounded to `max_entries`, evicting FIFO. A bound of zero is
    /// treated as one — an insert must always be able to land, and the
    /// resting count can never exceed the bound.
    pub fn bounded(name: impl Into<String>, max_entries: usize) -> CategoryStore {
        CategoryStore {
            name: name.into(),
            max_entries: Some(max_entries.max(1)),
            quota_bytes: None,
            used_bytes: 0,
            next_order: 0,
            entries: HashMap::new(),
        }
    }

    /// Store that never evicts on count; entries leave only via `clear` or
    /// a version bump.
    pub fn always_kept(name: impl Into<String>) -> CategoryStore {
        CategoryStore {
            name: name.into(),
            max_entries: None,
            quota_bytes: None,
            used_bytes: 0,
            next_order: 0,
            entries: HashMap::new(),
        }
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> CategoryStore {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Lookup never reorders anything.
    pub fn get(&self, key: &str) -> Option<&Response> {
        self.entries.get(key).map(|e| &e.response)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert, evicting oldest entries first if the store is at capacity.
    ///
    /// Replacing an existing key re-stamps its insertion order. Fails only
    /// when a byte quota is set and the entry cannot fit.
    pub fn insert(&mut self, key: String, response: Response) -> Result<(), StoreError> {
        if let Some(old) = self.entries.remove(&key) {
            self.used_bytes -= old.response.len();
        }
        self.maintain_size();
        if let Some(quota) = self.quota_bytes {
            let available = quota.saturating_sub(self.used_bytes);
            if response.len() > available {
                return Err(StoreError::QuotaExceeded {
                    store: self.name.clone(),
                    needed: response.len(),
                    available,
                });
            }
        }
        self.used_bytes += response.len();
        let insertion_order = self.next_order;
        self.next_order += 1;
        self.entries.insert(
            key,
            Entry {
                response,
                insertion_order,
            },
        );
        Ok(())
    }

    /// Evict so that one more entry fits under `max_entries`. Runs before
    /// every insertion; removes `count - max + 1` oldest entries when the
    /// store is at or over capacity.
    fn maintain_size(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        while self.entries.len() + 1 > max {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.insertion_order)
                .map(|(k, _)| k.clone())
            else {
                return;
            };
            let removed = self.entries.remove(&oldest).map(|e| e.response.len());
            self.used_bytes -= removed.unwrap_or(0);
            tracing::debug!(store = %self.name, key = %oldest, "evicted oldest entry");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_bytes = 0;
    }

    /// Keys ordered oldest-first.
    pub fn keys_in_insertion_order(&self) -> Vec<String> {
        let mut keyed: Vec<(&String, u64)> = self
            .entries
            .iter()
            .map(|(k, e)| (k, e.insertion_order))
            .collect();
        keyed.sort_by_key(|&(_, order)| order);
        keyed.into_iter().map(|(k, _)| k.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> Response {
        Response::ok("text/plain", body.to_owned())
    }

    #[test]
    fn fifo_evicts_oldest_not_least_recently_used() {
        let mut store = CategoryStore::bounded("image", 3);
        for key in ["a", "b", "c"] {
            store.insert(key.into(), response(key)).unwrap();
        }
        // Touch "a" repeatedly; FIFO must still evict it first.
        for _ in 0..5 {
            assert!(store.get("a").is_some());
        }
        store.insert("d".into(), response("d")).unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.get("a").is_none());
        assert_eq!(store.keys_in_insertion_order(), ["b", "c", "d"]);
    }

    #[test]
    fn eviction_runs_before_insertion() {
        let mut store = CategoryStore::bounded("image", 2);
        store.insert("a".into(), response("a")).unwrap();
        store.insert("b".into(), response("b")).unwrap();
        store.insert("c".into(), response("c")).unwrap();
        // Never more than max entries at rest.
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys_in_insertion_order(), ["b", "c"]);
    }

    #[test]
    fn reinsert_gets_fresh_order() {
        let mut store = CategoryStore::bounded("api", 3);
        for key in ["a", "b", "c"] {
            store.insert(key.into(), response(key)).unwrap();
        }
        store.insert("a".into(), response("a2")).unwrap();
        assert_eq!(store.len(), 3);
        store.insert("d".into(), response("d")).unwrap();

        // "b" was oldest after the refresh, not "a".
        assert!(store.get("b").is_none());
        assert_eq!(store.get("a").unwrap().body.as_ref(), b"a2");
    }

    #[test]
    fn zero_bound_behaves_as_single_entry() {
        let mut store = CategoryStore::bounded("image", 0);
        store.insert("a".into(), response("a")).unwrap();
        store.insert("b".into(), response("b")).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_none());
        assert_eq!(store.get("b").unwrap().body.as_ref(), b"b");
    }

    #[test]
    fn always_kept_store_never_evicts() {
        let mut store = CategoryStore::always_kept("precache");
        for i in 0..500 {
            store.insert(format!("k{i}"), response("x")).unwrap();
        }
        assert_eq!(store.len(), 500);
    }

    #[test]
    fn quota_rejects_oversized_entry() {
        let mut store = CategoryStore::bounded("static", 10).with_quota(8);
        store.insert("a".into(), response("1234")).unwrap();
        let err = store
            .insert("b".into(), response("way too large"))
            .unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 13, available: 4, .. }));
        // Failed insertion leaves the store untouched.
        assert_eq!(store.len(), 1);
        assert_eq!(store.used_bytes(), 4);
    }

    #[test]
    fn byte_accounting_tracks_eviction_and_replacement() {
        let mut store = CategoryStore::bounded("static", 2);
        store.insert("a".into(), response("aaaa")).unwrap();
        store.insert("b".into(), response("bb")).unwrap();
        assert_eq!(store.used_bytes(), 6);

        store.insert("b".into(), response("b")).unwrap();
        assert_eq!(store.used_bytes(), 5);

        store.insert("c".into(), response("cc")).unwrap(); // evicts "a"
        assert_eq!(store.used_bytes(), 3);
    }

    #[test]
    fn clear_empties_store() {
        let mut store = CategoryStore::bounded("navigation", 5);
        store.insert("a".into(), response("a")).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn interleaved_inserts_and_hits_keep_fifo_order() {
        let mut store = CategoryStore::bounded("image", 3);
        store.insert("u1".into(), response("1")).unwrap();
        store.insert("u2".into(), response("2")).unwrap();
        store.get("u1");
        store.insert("u3".into(), response("3")).unwrap();
        store.get("u2");
        store.insert("u4".into(), response("4")).unwrap(); // evicts u1
        store.insert("u5".into(), response("5")).unwrap(); // evicts u2

        assert_eq!(store.keys_in_insertion_order(), ["u3", "u4", "u5"]);
    }
}
