//! Metric kinds and the shared label-set lifecycle.
//!
//! This module provides the four concrete metric kinds and the machinery
//! they share. Every kind binds a name, help text and declared label names
//! to a store handle, then differs only in how an observation updates
//! stored cells and how cells read back as a public value:
//!
//! | Kind | Observation | Public value | Reserved labels |
//! |------|-------------|--------------|-----------------|
//! | [`Counter`] | `increment_by(by >= 0)` | monotonic f64 | none |
//! | [`Gauge`] | `set` / `increment_by` / `decrement_by` | f64 | none |
//! | [`Histogram`] | `observe(v)` | cumulative buckets + `+Inf` + `sum` | `le` |
//! | [`Summary`] | `observe(v)` | `count` + `sum` | `quantile` |
//!
//! # Shared Lifecycle
//!
//! All kinds expose the same label-set lifecycle:
//!
//! - `init_label_set` - create the kind's zero record for a label set
//!   (idempotent, never overwrites live data)
//! - `purge_label_set` - remove a label set's record (no-op when absent)
//! - `with_labels` - a new metric view with labels pre-merged; the
//!   original is untouched and views compose
//! - `values` - snapshot of label set to current value
//! - `get` - one label set's current value, zero default when unset
//!
//! # Examples
//!
//! ```
//! use tallycraft::{Counter, Labels};
//!
//! let requests = Counter::new(
//!     "requests_total",
//!     "Total requests served",
//!     &["service", "code"],
//! ).unwrap();
//!
//! requests.increment(Labels::new().with("service", "web").with("code", 200)).unwrap();
//!
//! let per_service = requests.with_labels(Labels::new().with("service", "web")).unwrap();
//! per_service.increment(Labels::new().with("code", 200)).unwrap();
//!
//! let count = requests
//!     .get(Labels::new().with("service", "web").with("code", 200))
//!     .unwrap();
//! assert_eq!(count, 2.0);
//! ```

/// Shared metric base and the [`Metric`] identity trait
pub mod core;

/// Monotonically non-decreasing counters
pub mod counter;

/// Freely settable gauges
pub mod gauge;

/// Cumulative histograms and bucket generators
pub mod histogram;

/// Count-and-sum summaries
pub mod summary;

pub use self::core::Metric;
pub use counter::{Counter, CounterBuilder};
pub use gauge::{Gauge, GaugeBuilder};
pub use histogram::{
    exponential_buckets, linear_buckets, Histogram, HistogramBuilder, DEFAULT_BUCKETS,
};
pub use summary::{Summary, SummaryBuilder};

use std::fmt;

/// The statistical shape of a metric.
///
/// Passed to storage backends so they can shape per-metric storage, and
/// exposed on every metric through the [`Metric`] trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// Monotonically non-decreasing scalar.
    Counter,
    /// Freely settable scalar.
    Gauge,
    /// Cumulative bucket counters plus a running sum.
    Histogram,
    /// Observation count plus a running sum.
    Summary,
}

impl MetricKind {
    /// The kind's name in exposition conventions.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }

    /// Label names this kind uses internally and therefore refuses in
    /// declared label sets.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::MetricKind;
    ///
    /// assert_eq!(MetricKind::Histogram.reserved_labels(), &["le"]);
    /// assert_eq!(MetricKind::Summary.reserved_labels(), &["quantile"]);
    /// assert!(MetricKind::Counter.reserved_labels().is_empty());
    /// ```
    #[must_use]
    pub fn reserved_labels(self) -> &'static [&'static str] {
        match self {
            MetricKind::Histogram => &["le"],
            MetricKind::Summary => &["quantile"],
            MetricKind::Counter | MetricKind::Gauge => &[],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Histogram.to_string(), "histogram");
    }

    #[test]
    fn test_reserved_labels_per_kind() {
        assert!(MetricKind::Counter.reserved_labels().is_empty());
        assert!(MetricKind::Gauge.reserved_labels().is_empty());
        assert_eq!(MetricKind::Histogram.reserved_labels(), &["le"]);
        assert_eq!(MetricKind::Summary.reserved_labels(), &["quantile"]);
    }

    #[test]
    fn test_module_exports() {
        // Verify all public types are accessible through this module.
        let _counter = Counter::builder("mod_exports_counter", "help");
        let _gauge = Gauge::builder("mod_exports_gauge", "help");
        let _histogram = Histogram::builder("mod_exports_histogram", "help");
        let _summary = Summary::builder("mod_exports_summary", "help");
    }
}
