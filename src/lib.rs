//! TallyCraft: Production-grade process-local metrics instrumentation for Rust.
//!
//! TallyCraft lets application code declare named measurements (counters,
//! gauges, histograms, summaries), record observations against a dynamic
//! set of label dimensions, and read back aggregated values for export.
//! The heart of the crate is its label-set-addressed storage core: an
//! arbitrary, caller-supplied combination of label names and values is
//! validated against the metric's declared schema, normalized into a
//! canonical composite key, and aggregated into the right statistical
//! shape under concurrent access.
//!
//! # Quick Start
//!
//! ```
//! use tallycraft::{Counter, Labels};
//!
//! // Declare once, at startup.
//! let requests = Counter::new(
//!     "http_requests_total",
//!     "HTTP requests served",
//!     &["method", "code"],
//! ).unwrap();
//!
//! // Record from anywhere; label values coerce to strings.
//! requests
//!     .increment(Labels::new().with("method", "GET").with("code", 200))
//!     .unwrap();
//!
//! // Read back for export.
//! let count = requests
//!     .get(Labels::new().with("method", "GET").with("code", "200"))
//!     .unwrap();
//! assert_eq!(count, 1.0);
//! ```
//!
//! # Metric Kinds
//!
//! | Kind | Shape | Typical Use |
//! |------|-------|-------------|
//! | [`Counter`] | monotonic scalar | requests served, bytes sent |
//! | [`Gauge`] | free scalar | queue depth, in-flight requests |
//! | [`Histogram`] | cumulative buckets + sum | latency, payload sizes |
//! | [`Summary`] | count + sum | cheap rate/average tracking |
//!
//! # Concurrency Model
//!
//! Every operation is synchronous and in-memory: nothing suspends, awaits,
//! or blocks on I/O. Observations against the same label set are atomic
//! read-modify-writes with no lost updates; a 10-thread stress of 10
//! increments each lands at exactly +100. Different metrics never contend
//! with each other under the default backend (one lock per metric).
//!
//! # Pluggable Storage
//!
//! Metric state lives in a process-wide, swappable [`store::ValueStore`].
//! The default [`store::InMemoryStore`] suits many threads in one process;
//! an out-of-process backend (file- or shared-memory-backed) can be
//! dropped in through [`store::set_value_store`] without touching metric
//! code. Swap only at startup or between test cases, never under traffic.
//!
//! ```
//! use std::sync::Arc;
//! use tallycraft::store::{set_value_store, InMemoryStore};
//!
//! set_value_store(Arc::new(InMemoryStore::new()));
//! ```
//!
//! # Label Lifecycle
//!
//! Records appear lazily on first observation, or eagerly through
//! `init_label_set` (useful so exporters see a zero series before the
//! first event). They disappear only through `purge_label_set`. Partial
//! application via `with_labels` returns a new view with labels
//! pre-merged, leaving the original metric untouched:
//!
//! ```
//! use tallycraft::{Counter, Labels};
//!
//! let errors = Counter::new("errors_total", "Errors", &["service", "kind"]).unwrap();
//! let web_errors = errors.with_labels(Labels::new().with("service", "web")).unwrap();
//! web_errors.increment(Labels::new().with("kind", "timeout")).unwrap();
//! ```
//!
//! # Optional Features
//!
//! - `serde` - Serialize/Deserialize on snapshot-facing types
//!   ([`LabelSet`], [`MetricKind`]) for exporter collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]
#![allow(clippy::float_cmp)]

/// Error types and result aliases
pub mod error;

/// Label mappings, schemas, and canonical label sets
pub mod labels;

/// Metric kinds and the shared label-set lifecycle
pub mod metrics;

/// Pluggable value storage backends
pub mod store;

// Re-export commonly used types at crate root
pub use error::{Result, TallyCraftError};

pub use labels::{LabelSet, Labels};

pub use metrics::{Counter, Gauge, Histogram, Metric, MetricKind, Summary};

// Bucket helpers are used at nearly every histogram declaration site.
pub use metrics::{exponential_buckets, linear_buckets, DEFAULT_BUCKETS};

pub use store::{set_value_store, value_store, InMemoryStore, MetricStore, ValueStore};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use tallycraft::prelude::*;
///
/// let counter = Counter::new("prelude_demo_total", "Demo", &[]).unwrap();
/// counter.increment(Labels::new()).unwrap();
/// assert_eq!(counter.get(Labels::new()).unwrap(), 1.0);
/// ```
pub mod prelude {
    pub use crate::error::{Result, TallyCraftError};
    pub use crate::labels::{LabelSet, Labels};
    pub use crate::metrics::{
        exponential_buckets, linear_buckets, Counter, Gauge, Histogram, Metric, MetricKind,
        Summary, DEFAULT_BUCKETS,
    };
    pub use crate::store::{set_value_store, value_store, InMemoryStore, ValueStore};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_prelude_imports() {
        let counter = Counter::builder("lib_prelude_total", "Prelude smoke test")
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap();
        counter.increment(Labels::new()).unwrap();
        assert_eq!(counter.get(Labels::new()).unwrap(), 1.0);
    }

    #[test]
    fn test_trait_usage() {
        fn describe(metric: &dyn Metric) -> String {
            format!("{} ({})", metric.name(), metric.kind())
        }

        let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
        let counter = Counter::builder("lib_trait_counter", "help")
            .store(store.clone())
            .build()
            .unwrap();
        let histogram = Histogram::builder("lib_trait_histogram", "help")
            .store(store)
            .build()
            .unwrap();

        assert_eq!(describe(&counter), "lib_trait_counter (counter)");
        assert_eq!(describe(&histogram), "lib_trait_histogram (histogram)");
    }

    #[test]
    fn test_bucket_helpers_reexported() {
        assert_eq!(linear_buckets(0.0, 1.0, 3).unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(exponential_buckets(1.0, 10.0, 3).unwrap(), vec![1.0, 10.0, 100.0]);
        assert!(!DEFAULT_BUCKETS.is_empty());
    }
}
