//! Default in-memory storage backend.
//!
//! `InMemoryStore` keeps every metric's cells in a `HashMap` behind its own
//! `parking_lot::RwLock`, one lock per metric. That satisfies the storage
//! contract for many threads in one process: read-modify-write operations
//! take the metric's write lock, so increments on the same key never lose
//! updates, while metrics never contend with each other.
//!
//! `parking_lot::RwLock` is chosen over `std::sync::RwLock` for the same
//! reasons the rest of this crate uses it: no lock poisoning to thread
//! through the API, smaller footprint, and faster uncontended paths.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tallycraft::store::{InMemoryStore, ValueStore};
//! use tallycraft::Counter;
//!
//! // A private store keeps this counter isolated from the process-wide one.
//! let store: Arc<dyn ValueStore> = Arc::new(InMemoryStore::new());
//! let counter = Counter::builder("jobs_total", "Jobs processed")
//!     .store(Arc::clone(&store))
//!     .build()
//!     .unwrap();
//! counter.increment(tallycraft::Labels::new()).unwrap();
//! ```

use super::{MetricStore, ValueStore};
use crate::labels::LabelSet;
use crate::metrics::MetricKind;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory, lock-per-metric storage backend.
///
/// This is the backend installed by default when no other has been
/// configured. Records live for the life of the process (or the store) and
/// are removed only by explicit deletion; there is no eviction and no TTL.
#[derive(Default)]
pub struct InMemoryStore {
    metrics: RwLock<HashMap<String, Arc<MemoryMetricStore>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::store::InMemoryStore;
    ///
    /// let store = InMemoryStore::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValueStore for InMemoryStore {
    fn for_metric(
        &self,
        name: &str,
        _kind: MetricKind,
        _label_names: &[String],
    ) -> Arc<dyn MetricStore> {
        if let Some(handle) = self.metrics.read().get(name) {
            return Arc::clone(handle) as Arc<dyn MetricStore>;
        }
        let mut metrics = self.metrics.write();
        let handle = metrics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryMetricStore::default()));
        Arc::clone(handle) as Arc<dyn MetricStore>
    }
}

/// Cells of a single metric, guarded by one RwLock.
#[derive(Default)]
struct MemoryMetricStore {
    cells: RwLock<HashMap<LabelSet, f64>>,
}

impl MetricStore for MemoryMetricStore {
    fn set(&self, key: &LabelSet, value: f64) {
        self.cells.write().insert(key.clone(), value);
    }

    fn increment(&self, key: &LabelSet, by: f64) -> f64 {
        let mut cells = self.cells.write();
        let cell = cells.entry(key.clone()).or_insert(0.0);
        *cell += by;
        *cell
    }

    fn get(&self, key: &LabelSet) -> Option<f64> {
        self.cells.read().get(key).copied()
    }

    fn all_values(&self) -> Vec<(LabelSet, f64)> {
        self.cells
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect()
    }

    fn delete(&self, key: &LabelSet) {
        self.cells.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{LabelSchema, Labels};
    use std::thread;

    fn handle(store: &InMemoryStore, name: &str) -> Arc<dyn MetricStore> {
        store.for_metric(name, MetricKind::Counter, &[])
    }

    fn key(value: &str) -> LabelSet {
        LabelSchema::new(&["service"], &[])
            .unwrap()
            .validate(&Labels::new().with("service", value))
            .unwrap()
    }

    #[test]
    fn test_increment_creates_zero_cell_first() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");
        assert_eq!(h.increment(&key("web"), 2.5), 2.5);
        assert_eq!(h.increment(&key("web"), 0.5), 3.0);
    }

    #[test]
    fn test_increment_by_zero_is_idempotent_init() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");

        assert_eq!(h.get(&key("web")), None);
        h.increment(&key("web"), 0.0);
        assert_eq!(h.get(&key("web")), Some(0.0));

        // Does not disturb a live value.
        h.increment(&key("web"), 7.0);
        h.increment(&key("web"), 0.0);
        assert_eq!(h.get(&key("web")), Some(7.0));
    }

    #[test]
    fn test_set_overwrites() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");
        h.increment(&key("web"), 5.0);
        h.set(&key("web"), 1.5);
        assert_eq!(h.get(&key("web")), Some(1.5));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");
        assert_eq!(h.get(&key("absent")), None);
    }

    #[test]
    fn test_delete_removes_record() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");
        h.increment(&key("web"), 3.0);
        h.delete(&key("web"));
        assert_eq!(h.get(&key("web")), None);

        // Deleting an absent key is a no-op.
        h.delete(&key("web"));
    }

    #[test]
    fn test_all_values_snapshot() {
        let store = InMemoryStore::new();
        let h = handle(&store, "m");
        h.increment(&key("web"), 1.0);
        h.increment(&key("api"), 2.0);

        let mut snapshot = h.all_values();
        snapshot.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].1, 1.0);
        assert_eq!(snapshot[1].1, 2.0);
    }

    #[test]
    fn test_metrics_are_isolated() {
        let store = InMemoryStore::new();
        let a = handle(&store, "a");
        let b = handle(&store, "b");
        a.increment(&key("web"), 1.0);
        assert_eq!(b.get(&key("web")), None);
    }

    #[test]
    fn test_same_metric_yields_same_cells() {
        let store = InMemoryStore::new();
        let first = handle(&store, "m");
        first.increment(&key("web"), 1.0);
        let second = handle(&store, "m");
        assert_eq!(second.get(&key("web")), Some(1.0));
    }

    #[test]
    fn test_concurrent_increments_lose_no_updates() {
        let store = Arc::new(InMemoryStore::new());
        let h = store.for_metric("stress", MetricKind::Counter, &[]);

        let mut handles = vec![];
        for _ in 0..10 {
            let h = Arc::clone(&h);
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    h.increment(&key("web"), 1.0);
                }
            }));
        }
        for t in handles {
            t.join().unwrap();
        }

        assert_eq!(h.get(&key("web")), Some(100.0));
    }
}
