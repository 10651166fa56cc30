//! Monotonically non-decreasing counters.
//!
//! A counter accumulates a single non-negative floating-point value per
//! label set. Increments must be non-negative; there is no way to reset or
//! lower a counter short of purging its label set.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use tallycraft::{Counter, Labels};
//!
//! let requests = Counter::new("requests_total", "Total requests", &["code"]).unwrap();
//!
//! requests.increment(Labels::new().with("code", 200)).unwrap();
//! requests.increment_by(2.0, Labels::new().with("code", 200)).unwrap();
//!
//! assert_eq!(requests.get(Labels::new().with("code", 200)).unwrap(), 3.0);
//! assert_eq!(requests.get(Labels::new().with("code", 500)).unwrap(), 0.0);
//! ```
//!
//! ## Pre-set Labels
//!
//! ```
//! use tallycraft::{Counter, Labels};
//!
//! let requests = Counter::new("handled_total", "Handled requests", &["service", "code"]).unwrap();
//! let web = requests.with_labels(Labels::new().with("service", "web")).unwrap();
//!
//! web.increment(Labels::new().with("code", 200)).unwrap();
//! assert_eq!(
//!     requests
//!         .get(Labels::new().with("service", "web").with("code", 200))
//!         .unwrap(),
//!     1.0
//! );
//! ```

use super::core::{CellLayout, Metric, MetricCore};
use super::MetricKind;
use crate::error::{Result, TallyCraftError};
use crate::labels::{LabelSet, Labels};
use crate::store::ValueStore;
use std::collections::HashMap;
use std::sync::Arc;

/// A monotonically non-decreasing metric.
///
/// Thread-safe: observations from any number of threads against the same
/// label set are applied atomically with no lost updates. Cloning shares
/// the underlying store handle.
#[derive(Clone)]
pub struct Counter {
    core: MetricCore,
}

impl Counter {
    /// Create a counter against the process-wide value store.
    ///
    /// # Errors
    ///
    /// Construction errors for invalid names, empty help text, or invalid
    /// declared labels. See [`crate::TallyCraftError`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Counter;
    ///
    /// let counter = Counter::new("jobs_total", "Jobs processed", &["queue"]).unwrap();
    /// ```
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        Self::builder(name, help).labels(label_names).build()
    }

    /// Start building a counter.
    #[must_use]
    pub fn builder(name: impl Into<String>, help: impl Into<String>) -> CounterBuilder {
        CounterBuilder {
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            preset: Labels::new(),
            store: None,
        }
    }

    /// Increment by 1, returning the new value.
    ///
    /// # Errors
    ///
    /// [`TallyCraftError::InvalidLabelSet`] when the merged label keys do
    /// not exactly match the declared names.
    pub fn increment(&self, labels: impl Into<Labels>) -> Result<f64> {
        self.increment_by(1.0, labels)
    }

    /// Increment by `by`, returning the new value.
    ///
    /// # Errors
    ///
    /// - [`TallyCraftError::NegativeIncrement`] when `by` is negative or
    ///   NaN; rejected before any store mutation
    /// - [`TallyCraftError::InvalidLabelSet`] on label mismatch
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::{Counter, Labels};
    ///
    /// let bytes = Counter::new("bytes_total", "Bytes sent", &[]).unwrap();
    /// assert_eq!(bytes.increment_by(512.0, Labels::new()).unwrap(), 512.0);
    /// assert!(bytes.increment_by(-1.0, Labels::new()).is_err());
    /// ```
    pub fn increment_by(&self, by: f64, labels: impl Into<Labels>) -> Result<f64> {
        // NaN fails this comparison and is rejected along with negatives.
        if !(by >= 0.0) {
            return Err(TallyCraftError::negative_increment(by));
        }
        self.core.increment_scalar(by, &labels.into())
    }

    /// Current value for a label set; 0.0 when never incremented.
    ///
    /// Reading never creates a record.
    pub fn get(&self, labels: impl Into<Labels>) -> Result<f64> {
        self.core.read_scalar(&labels.into())
    }

    /// Snapshot of every live label set and its current value.
    #[must_use]
    pub fn values(&self) -> HashMap<LabelSet, f64> {
        self.core.scalar_values()
    }

    /// A view of this counter with `labels` pre-merged.
    ///
    /// The view shares this counter's storage; later presets override
    /// earlier ones for the same key. `self` is untouched.
    pub fn with_labels(&self, labels: impl Into<Labels>) -> Result<Self> {
        Ok(Self {
            core: self.core.with_labels(&labels.into())?,
        })
    }

    /// Create the zero record for a label set if absent. Idempotent.
    pub fn init_label_set(&self, labels: impl Into<Labels>) -> Result<()> {
        self.core.init_label_set(&labels.into())
    }

    /// Remove a label set's record. No-op when absent.
    pub fn purge_label_set(&self, labels: impl Into<Labels>) -> Result<()> {
        self.core.purge_label_set(&labels.into())
    }

    /// Normalize labels into the key form used by [`values`](Self::values).
    pub fn label_set(&self, labels: impl Into<Labels>) -> Result<LabelSet> {
        self.core.bound_set(&labels.into())
    }
}

impl Metric for Counter {
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

/// Builder for [`Counter`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tallycraft::{Counter, Labels};
/// use tallycraft::store::InMemoryStore;
///
/// let counter = Counter::builder("retries_total", "Retries attempted")
///     .labels(&["job", "attempt"])
///     .preset_labels(Labels::new().with("job", "sync"))
///     .store(Arc::new(InMemoryStore::new()))
///     .build()
///     .unwrap();
/// ```
pub struct CounterBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    preset: Labels,
    store: Option<Arc<dyn ValueStore>>,
}

impl CounterBuilder {
    /// Declare the counter's label names.
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

    /// Bind to a specific store instead of the process-wide one.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate parameters and build the counter.
    pub fn build(self) -> Result<Counter> {
        let core = MetricCore::new(
            MetricKind::Counter,
            self.name,
            self.help,
            &self.label_names,
            self.preset,
            CellLayout::Scalar,
            self.store,
        )?;
        Ok(Counter { core })
    }
}
