//! Identity-keyed metadata records backed by DashMap.
//!
//! A record is a sparse string-keyed map attached to exactly one object. It
//! is created lazily on the first write and is never copied when an object
//! is refined. The store is independent of behavior: nothing here can change
//! how an object responds to messages.
//!
//! Writes are crate-private so that every write goes through
//! [`MetaMirror`](super::MetaMirror), which validates well-known shapes.

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::config::EngineConfig;
use crate::object::{ObjectId, ObjectModel};

use super::value::MetaValue;

/// Sparse metadata for one object, ordered by key.
pub type MetadataRecord = BTreeMap<String, MetaValue>;

/// Concurrent, identity-keyed metadata store.
pub struct MetadataStore {
    records: DashMap<ObjectId, MetadataRecord>,
    enabled: bool,
    warn_on_deprecated: bool,
}

impl MetadataStore {
    /// Create an empty, enabled store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            enabled: true,
            warn_on_deprecated: false,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            records: DashMap::with_capacity(config.capacity_hint),
            enabled: config.metadata_enabled,
            warn_on_deprecated: config.warn_on_deprecated,
        }
    }

    /// A store that drops every write, as in builds without reflection metadata.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn warns_on_deprecated(&self) -> bool {
        self.warn_on_deprecated
    }

    /// Get a clone of one value.
    pub fn get(&self, id: ObjectId, key: &str) -> Option<MetaValue> {
        self.records.get(&id).and_then(|r| r.get(key).cloned())
    }

    pub fn contains(&self, id: ObjectId, key: &str) -> bool {
        self.records.get(&id).is_some_and(|r| r.contains_key(key))
    }

    /// Snapshot of a whole record.
    pub fn record(&self, id: ObjectId) -> Option<MetadataRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Keys present on an object, sorted.
    pub fn keys(&self, id: ObjectId) -> Vec<String> {
        self.records
            .get(&id)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Run `f` on the object's record under its shard lock, creating the
    /// record if needed. Returns `None` without calling `f` when disabled.
    pub(crate) fn modify<R>(&self, id: ObjectId, f: impl FnOnce(&mut MetadataRecord) -> R) -> Option<R> {
        if !self.enabled {
            tracing::trace!(object = %id, "metadata disabled, dropping write");
            return None;
        }
        let mut record = self.records.entry(id).or_default();
        Some(f(record.value_mut()))
    }

    pub(crate) fn insert(&self, id: ObjectId, key: &str, value: MetaValue) {
        self.modify(id, |r| {
            r.insert(key.to_owned(), value);
        });
    }

    /// Remove one key. An emptied record is dropped.
    pub(crate) fn remove(&self, id: ObjectId, key: &str) -> Option<MetaValue> {
        let (removed, now_empty) = {
            let mut record = self.records.get_mut(&id)?;
            let removed = record.remove(key);
            (removed, record.is_empty())
        };
        if now_empty {
            self.records.remove_if(&id, |_, r| r.is_empty());
        }
        removed
    }

    /// Drop an object's whole record.
    pub fn evict(&self, id: ObjectId) -> Option<MetadataRecord> {
        self.records.remove(&id).map(|(_, r)| r)
    }

    /// Drop the records of every object the model no longer contains.
    ///
    /// Returns the number of records removed.
    pub fn sweep(&self, model: &dyn ObjectModel) -> usize {
        let before = self.records.len();
        self.records.retain(|id, _| model.contains(*id));
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            tracing::debug!(removed, "swept metadata of released objects");
        }
        removed
    }

    /// Objects that currently carry a record, sorted by id.
    pub fn objects(&self) -> Vec<ObjectId> {
        let mut ids: Vec<_> = self.records.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }

    /// Number of objects with a record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("records", &self.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectHeap, ObjectSpec};

    fn id(raw: u64) -> ObjectId {
        ObjectId::new(raw).unwrap()
    }

    #[test]
    fn records_are_created_lazily() {
        let store = MetadataStore::new();
        assert!(store.get(id(1), "name").is_none());
        assert!(store.is_empty());

        store.insert(id(1), "name", "sun".into());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id(1), "name"), Some(MetaValue::from("sun")));
        assert!(store.contains(id(1), "name"));
        assert!(!store.contains(id(2), "name"));
    }

    #[test]
    fn insert_overwrites() {
        let store = MetadataStore::new();
        store.insert(id(1), "since", "1.0".into());
        store.insert(id(1), "since", "2.0".into());
        assert_eq!(store.get(id(1), "since"), Some(MetaValue::from("2.0")));
    }

    #[test]
    fn removing_last_key_drops_record() {
        let store = MetadataStore::new();
        store.insert(id(1), "a", "x".into());
        store.insert(id(1), "b", "y".into());
        assert_eq!(store.remove(id(1), "a"), Some(MetaValue::from("x")));
        assert_eq!(store.len(), 1);
        store.remove(id(1), "b");
        assert!(store.is_empty());
        assert_eq!(store.remove(id(1), "b"), None);
    }

    #[test]
    fn keys_are_sorted() {
        let store = MetadataStore::new();
        store.insert(id(1), "tags", MetaValue::text_list(["a"]));
        store.insert(id(1), "category", "x".into());
        assert_eq!(store.keys(id(1)), vec!["category", "tags"]);
    }

    #[test]
    fn disabled_store_drops_writes() {
        let store = MetadataStore::disabled();
        store.insert(id(1), "name", "sun".into());
        assert!(store.get(id(1), "name").is_none());
        assert!(store.modify(id(1), |_| ()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_drops_released_objects() {
        let heap = ObjectHeap::new();
        let kept = heap.create_object(ObjectSpec::new("kept")).unwrap();
        let gone = heap.create_object(ObjectSpec::new("gone")).unwrap();

        let store = MetadataStore::new();
        store.insert(kept, "name", "kept".into());
        store.insert(gone, "name", "gone".into());
        heap.release(gone);

        assert_eq!(store.sweep(&heap), 1);
        assert_eq!(store.objects(), vec![kept]);
    }

    #[test]
    fn concurrent_writes_to_one_record() {
        use std::sync::Arc;
        let store = Arc::new(MetadataStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.insert(id(1), &format!("k{i}"), MetaValue::Integer(i));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.keys(id(1)).len(), 32);
    }
}
