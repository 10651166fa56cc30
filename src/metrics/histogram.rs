//! Cumulative histograms and bucket boundary generators.
//!
//! A histogram counts observations into configured buckets and keeps a
//! running sum. Buckets are *cumulative*: a bucket counts every observation
//! less than or equal to its upper bound, not only those in its own
//! interval, and an implicit `+Inf` bucket counts all observations. This is
//! the defining histogram semantic and is preserved exactly: quantile
//! estimation from these counters is the exporter's business, not this
//! crate's.
//!
//! # Record Shape
//!
//! One observation with value `v` updates, atomically per cell:
//!
//! - every bucket cell whose bound `b` satisfies `v <= b`, by 1
//! - the `+Inf` cell, by 1
//! - the `sum` cell, by `v`
//!
//! Cells are addressed through the reserved `le` label, which is why `le`
//! cannot be declared as a histogram label.
//!
//! # Examples
//!
//! ```
//! use tallycraft::{Histogram, Labels};
//!
//! let latency = Histogram::new(
//!     "request_seconds",
//!     "Request latency in seconds",
//!     &[],
//!     vec![0.1, 0.5, 1.0],
//! ).unwrap();
//!
//! latency.observe(0.25, Labels::new()).unwrap();
//! latency.observe(0.75, Labels::new()).unwrap();
//!
//! let record = latency.get(Labels::new()).unwrap();
//! assert_eq!(record["0.1"], 0.0);
//! assert_eq!(record["0.5"], 1.0);
//! assert_eq!(record["1"], 2.0);
//! assert_eq!(record["+Inf"], 2.0);
//! assert_eq!(record["sum"], 1.0);
//! ```

use super::core::{CellLayout, Metric, MetricCore};
use super::MetricKind;
use crate::error::{Result, TallyCraftError};
use crate::labels::{LabelSet, Labels};
use crate::store::ValueStore;
use std::collections::HashMap;
use std::sync::Arc;

/// The internal dimension addressing histogram cells.
const BUCKET_LABEL: &str = "le";

/// Cell name of the implicit bucket counting all observations.
const INF_CELL: &str = "+Inf";

/// Cell name of the running sum of observed values.
const SUM_CELL: &str = "sum";

/// Conventional default bucket bounds, in seconds.
///
/// Spans typical request latencies from 5ms to 10s. Used by
/// [`HistogramBuilder`] when no explicit bounds are given.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Generate `count` bucket bounds `start, start+width, start+2*width, ...`.
///
/// # Errors
///
/// [`TallyCraftError::InvalidBuckets`] when `count` is zero or `width` is
/// not positive.
///
/// # Examples
///
/// ```
/// use tallycraft::linear_buckets;
///
/// let bounds = linear_buckets(1.0, 2.0, 5).unwrap();
/// assert_eq!(bounds, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
/// ```
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(TallyCraftError::invalid_buckets(
            "bucket count must be at least 1",
        ));
    }
    if !(width > 0.0) {
        return Err(TallyCraftError::invalid_buckets(format!(
            "bucket width {} must be positive",
            width
        )));
    }
    Ok((0..count).map(|i| start + width * i as f64).collect())
}

/// Generate `count` bucket bounds `start, start*factor, start*factor^2, ...`.
///
/// # Errors
///
/// [`TallyCraftError::InvalidBuckets`] when `count` is zero, `start` is not
/// positive, or `factor` is not greater than 1.
///
/// # Examples
///
/// ```
/// use tallycraft::exponential_buckets;
///
/// let bounds = exponential_buckets(1.0, 2.0, 5).unwrap();
/// assert_eq!(bounds, vec![1.0, 2.0, 4.0, 8.0, 16.0]);
/// ```
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(TallyCraftError::invalid_buckets(
            "bucket count must be at least 1",
        ));
    }
    if !(start > 0.0) {
        return Err(TallyCraftError::invalid_buckets(format!(
            "starting bound {} must be positive",
            start
        )));
    }
    if !(factor > 1.0) {
        return Err(TallyCraftError::invalid_buckets(format!(
            "growth factor {} must be greater than 1",
            factor
        )));
    }
    let mut bounds = Vec::with_capacity(count);
    let mut next = start;
    for _ in 0..count {
        bounds.push(next);
        next *= factor;
    }
    Ok(bounds)
}

/// A cumulative-bucket distribution metric.
///
/// Thread-safe. Each cell update is atomic per key; one `observe` touches
/// several cells, and a concurrent snapshot may catch a subset of them (the
/// per-key guarantee of the storage contract, not a torn cell).
#[derive(Clone, Debug)]
pub struct Histogram {
    core: MetricCore,
    bounds: Vec<f64>,
    bound_cells: Vec<String>,
}

impl Histogram {
    /// Create a histogram with explicit bucket bounds against the
    /// process-wide value store.
    ///
    /// # Errors
    ///
    /// [`TallyCraftError::InvalidBuckets`] when bounds are not finite and
    /// strictly ascending, plus the usual construction errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Histogram;
    ///
    /// let histogram = Histogram::new(
    ///     "batch_size",
    ///     "Items per batch",
    ///     &["queue"],
    ///     vec![10.0, 100.0, 1000.0],
    /// ).unwrap();
    ///
    /// assert!(Histogram::new("bad", "Unsorted", &[], vec![5.0, 2.5, 10.0]).is_err());
    /// ```
    pub fn new(name: &str, help: &str, label_names: &[&str], bounds: Vec<f64>) -> Result<Self> {
        Self::builder(name, help)
            .labels(label_names)
            .buckets(bounds)
            .build()
    }

    /// Start building a histogram. Bounds default to [`DEFAULT_BUCKETS`].
    #[must_use]
    pub fn builder(name: impl Into<String>, help: impl Into<String>) -> HistogramBuilder {
        HistogramBuilder {
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            preset: Labels::new(),
            bounds: None,
            store: None,
        }
    }

    /// The configured bucket upper bounds, ascending.
    #[must_use]
    pub fn buckets(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one observation.
    ///
    /// Increments every bucket whose bound is `>= value`, the `+Inf`
    /// bucket, and the running sum.
    ///
    /// # Errors
    ///
    /// [`TallyCraftError::InvalidLabelSet`] on label mismatch; the record
    /// is untouched.
    pub fn observe(&self, value: f64, labels: impl Into<Labels>) -> Result<()> {
        let base = self.core.bound_set(&labels.into())?;
        for (bound, cell) in self.bounds.iter().zip(&self.bound_cells) {
            if value <= *bound {
                self.core.store().increment(&base.child(BUCKET_LABEL, cell), 1.0);
            }
        }
        self.core
            .store()
            .increment(&base.child(BUCKET_LABEL, INF_CELL), 1.0);
        self.core
            .store()
            .increment(&base.child(BUCKET_LABEL, SUM_CELL), value);
        Ok(())
    }

    /// Current record for a label set.
    ///
    /// The mapping is keyed by each bound's string form plus `"+Inf"` and
    /// `"sum"`; with no observations every entry is 0.0.
    pub fn get(&self, labels: impl Into<Labels>) -> Result<HashMap<String, f64>> {
        self.core.read_cells(&labels.into())
    }

    /// Snapshot of every live label set and its full record.
    #[must_use]
    pub fn values(&self) -> HashMap<LabelSet, HashMap<String, f64>> {
        self.core.mapped_values()
    }

    /// A view of this histogram with `labels` pre-merged.
    pub fn with_labels(&self, labels: impl Into<Labels>) -> Result<Self> {
        Ok(Self {
            core: self.core.with_labels(&labels.into())?,
            bounds: self.bounds.clone(),
            bound_cells: self.bound_cells.clone(),
        })
    }

    /// Create the all-zero record for a label set if absent. Idempotent.
    pub fn init_label_set(&self, labels: impl Into<Labels>) -> Result<()> {
        self.core.init_label_set(&labels.into())
    }

    /// Remove a label set's record (all cells). No-op when absent.
    pub fn purge_label_set(&self, labels: impl Into<Labels>) -> Result<()> {
        self.core.purge_label_set(&labels.into())
    }

    /// Normalize labels into the key form used by [`values`](Self::values).
    pub fn label_set(&self, labels: impl Into<Labels>) -> Result<LabelSet> {
        self.core.bound_set(&labels.into())
    }
}

impl Metric for Histogram {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn help(&self) -> &str {
        self.core.help()
    }

    fn kind(&self) -> MetricKind {
        self.core.kind()
    }

    fn label_names(&self) -> &[String] {
        self.core.label_names()
    }
}

/// Builder for [`Histogram`].
///
/// # Examples
///
/// ```
/// use tallycraft::{linear_buckets, Histogram};
///
/// let histogram = Histogram::builder("payload_bytes", "Payload size")
///     .labels(&["route"])
///     .buckets(linear_buckets(1024.0, 1024.0, 8).unwrap())
///     .build()
///     .unwrap();
/// ```
pub struct HistogramBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    preset: Labels,
    bounds: Option<Vec<f64>>,
    store: Option<Arc<dyn ValueStore>>,
}

impl HistogramBuilder {
    /// Declare the histogram's label names.
    #[must_use]
    pub fn labels(mut self, names: &[&str]) -> Self {
        self.label_names = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Fix a sub-mapping of the declared labels at construction time.
    #[must_use]
    pub fn preset_labels(mut self, labels: impl Into<Labels>) -> Self {
        self.preset = labels.into();
        self
    }

    /// Set explicit bucket upper bounds.
    #[must_use]
    pub fn buckets(mut self, bounds: Vec<f64>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Bind to a specific store instead of the process-wide one.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate parameters and build the histogram.
    ///
    /// # Errors
    ///
    /// [`TallyCraftError::InvalidBuckets`] when bounds are not finite and
    /// strictly ascending. The implicit `+Inf` bucket must not be supplied.
    pub fn build(self) -> Result<Histogram> {
        let bounds = self
            .bounds
            .unwrap_or_else(|| DEFAULT_BUCKETS.to_vec());
        for bound in &bounds {
            if !bound.is_finite() {
                return Err(TallyCraftError::invalid_buckets(format!(
                    "boundary {} is not finite; the +Inf bucket is implicit",
                    bound
                )));
            }
        }
        for pair in bounds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(TallyCraftError::invalid_buckets(format!(
                    "boundary {} is not greater than its predecessor {}",
                    pair[1], pair[0]
                )));
            }
        }

        let bound_cells: Vec<String> = bounds.iter().map(|b| b.to_string()).collect();
        let mut cells = bound_cells.clone();
        cells.push(INF_CELL.to_string());
        cells.push(SUM_CELL.to_string());

        let core = MetricCore::new(
            MetricKind::Histogram,
            self.name,
            self.help,
            &self.label_names,
            self.preset,
            CellLayout::Dimension {
                label: BUCKET_LABEL,
                cells,
            },
            self.store,
        )?;
        Ok(Histogram {
            core,
            bounds,
            bound_cells,
        })
    }
}
