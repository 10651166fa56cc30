//! Pluggable value storage for metric records.
//!
//! Every metric keeps its numeric state in a *value store*: a process-wide,
//! swappable backend addressed by (metric identity, label set). The store
//! holds only scalar `f64` cells; metric kinds that need a richer record
//! shape (histograms, summaries) decompose it into several cells addressed
//! by their reserved label, so the whole storage contract stays the five
//! scalar operations of [`MetricStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 ValueStore                     │
//! │   (process-wide backend, selected at startup)  │
//! └────────────────────────────────────────────────┘
//!                        │ for_metric(name, kind, labels)
//!                        ▼
//! ┌────────────────────────────────────────────────┐
//! │                MetricStore                     │
//! │  (per-metric handle: set/increment/get/        │
//! │   all_values/delete, atomic per key)           │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! # Choosing a Backend
//!
//! The default backend is [`InMemoryStore`], sufficient for many threads in
//! one process. The trait seam exists so that an out-of-process backend
//! (file- or shared-memory-backed) can be dropped in without changing the
//! metric layer: implement both traits and install the backend with
//! [`set_value_store`] before any metric performs I/O.
//!
//! # Swap Precondition
//!
//! Swapping the active store after metrics have written data is undefined:
//! metrics capture their [`MetricStore`] handle at construction time, so
//! already-built metrics keep writing to the old backend. Swap only at
//! startup, or between test cases with no metric traffic in flight.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tallycraft::store::{set_value_store, InMemoryStore};
//!
//! // Bootstrap: select the backend before declaring metrics.
//! set_value_store(Arc::new(InMemoryStore::new()));
//! ```

/// Default in-memory backend
pub mod memory;

pub use memory::InMemoryStore;

use crate::labels::LabelSet;
use crate::metrics::MetricKind;
use parking_lot::RwLock;
use std::sync::Arc;

/// A process-wide storage backend for metric records.
///
/// One implementation is active per process at a time. The only operation
/// is handing out per-metric accessors; everything else lives on
/// [`MetricStore`].
///
/// Implementations must be `Send + Sync`: handles are created from and used
/// on arbitrary threads.
pub trait ValueStore: Send + Sync {
    /// Return the accessor for one metric's records.
    ///
    /// `kind` and `label_names` are provided so backends that lay records
    /// out ahead of time (files, shared memory) can size and shape their
    /// storage; the in-memory backend ignores them.
    fn for_metric(
        &self,
        name: &str,
        kind: MetricKind,
        label_names: &[String],
    ) -> Arc<dyn MetricStore>;
}

/// Per-metric storage handle.
///
/// All operations are keyed by a normalized [`LabelSet`] and must be atomic
/// per key under concurrent callers: no lost updates, no torn reads.
/// Operations on different keys carry no ordering guarantee relative to
/// each other.
pub trait MetricStore: Send + Sync {
    /// Unconditionally overwrite the cell, creating it if absent.
    fn set(&self, key: &LabelSet, value: f64);

    /// Atomically add `by` to the cell, creating a zero cell first when
    /// absent. Returns the new value.
    fn increment(&self, key: &LabelSet, by: f64) -> f64;

    /// Read the cell's current value.
    ///
    /// Returns `None` when no record exists for the key; the metric layer
    /// maps absence to the kind's zero default. Reading is never
    /// destructive and never fails for a well-formed key.
    fn get(&self, key: &LabelSet) -> Option<f64>;

    /// A point-in-time snapshot of every cell of this metric.
    ///
    /// Under concurrent writers the snapshot is per-key linearizable, not a
    /// single global atomic cut.
    fn all_values(&self) -> Vec<(LabelSet, f64)>;

    /// Remove the cell entirely. Subsequent reads revert to absence.
    fn delete(&self, key: &LabelSet);
}

/// The active process-wide store. `None` until first use or explicit
/// configuration; reads install the in-memory default lazily.
static ACTIVE_STORE: RwLock<Option<Arc<dyn ValueStore>>> = RwLock::new(None);

/// Install `store` as the process-wide value store.
///
/// Call once at startup, before declaring metrics. See the module
/// documentation for the swap precondition.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tallycraft::store::{set_value_store, InMemoryStore};
///
/// set_value_store(Arc::new(InMemoryStore::new()));
/// ```
pub fn set_value_store(store: Arc<dyn ValueStore>) {
    *ACTIVE_STORE.write() = Some(store);
}

/// The currently active process-wide value store.
///
/// Installs and returns an [`InMemoryStore`] on first use if no backend has
/// been configured.
#[must_use]
pub fn value_store() -> Arc<dyn ValueStore> {
    if let Some(store) = ACTIVE_STORE.read().as_ref() {
        return Arc::clone(store);
    }
    let mut active = ACTIVE_STORE.write();
    Arc::clone(active.get_or_insert_with(|| Arc::new(InMemoryStore::new())))
}
