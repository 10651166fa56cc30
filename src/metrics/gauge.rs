//! Freely settable gauges.
//!
//! A gauge holds a single floating-point value per label set that can go up
//! and down: queue depths, in-flight requests, temperatures. It is the one
//! metric kind that uses the store's unconditional `set` operation.
//!
//! # Examples
//!
//! ```
//! use tallycraft::{Gauge, Labels};
//!
//! let in_flight = Gauge::new("in_flight_requests", "Requests in flight", &["service"]).unwrap();
//!
//! in_flight.set(5.0, Labels::new().with("service", "web")).unwrap();
//! in_flight.decrement(Labels::new().with("service", "web")).unwrap();
//!
//! assert_eq!(in_flight.get(Labels::new().with("service", "web")).unwrap(), 4.0);
//! ```

use super::core::{CellLayout, Metric, MetricCore};
use super::MetricKind;
use crate::error::Result;
use crate::labels::{LabelSet, Labels};
use crate::store::ValueStore;
use std::collections::HashMap;
use std::sync::Arc;

/// A metric whose value can move in either direction.
///
/// Thread-safe; increments and decrements against the same label set are
/// applied atomically. A `set` racing an `increment_by` resolves to one of
/// the two serialized outcomes, never a blend.
#[derive(Clone)]
pub struct Gauge {
    core: MetricCore,
}

impl Gauge {
    /// Create a gauge against the process-wide value store.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Gauge;
    ///
    /// let depth = Gauge::new("queue_depth", "Jobs waiting", &["queue"]).unwrap();
    /// ```
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        Self::builder(name, help).labels(label_names).build()
    }

    /// Start building a gauge.
    #[must_use]
    pub fn builder(name: impl Into<String>, help: impl Into<String>) -> GaugeBuilder {
        GaugeBuilder {
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            preset: Labels::new(),
            store: None,
        }
    }

    /// Overwrite the value for a label set, creating the record if absent.
    pub fn set(&self, value: f64, labels: impl Into<Labels>) -> Result<()> {
        self.core.set_scalar(value, &labels.into())
    }

    /// Add 1, returning the new value.
    pub fn increment(&self, labels: impl Into<Labels>) -> Result<f64> {
        self.increment_by(1.0, labels)
    }

    /// Add `by` (any sign), returning the new value.
    pub fn increment_by(&self, by: f64, labels: impl Into<Labels>) -> Result<f64> {
        self.core.increment_scalar(by, &labels.into())
    }

    /// Subtract 1, returning the new value.
    pub fn decrement(&self, labels: impl Into<Labels>) -> Result<f64> {
        self.decrement_by(1.0, labels)
    }

    /// Subtract `by`, returning the new value.
    pub fn decrement_by(&self, by: f64, labels: impl Into<Labels>) -> Result<f64> {
        self.core.increment_scalar(-by, &labels.into())
    }

    /// Current value for a label set; 0.0 when never written.
    pub fn get(&self, labels: impl Into<Labels>) -> Result<f64> {
        self.core.read_scalar(&labels.into())
    }

    /// Snapshot of every live label set and its current value.
    #[must_use]
    pub fn values(&self) -> HashMap<LabelSet, f64> {
        self.core.scalar_values()
    }

    /// A view of this gauge with `labels` pre-merged.
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

impl Metric for Gauge {
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

/// Builder for [`Gauge`].
pub struct GaugeBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    preset: Labels,
    store: Option<Arc<dyn ValueStore>>,
}

impl GaugeBuilder {
    /// Declare the gauge's label names.
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

    /// Validate parameters and build the gauge.
    pub fn build(self) -> Result<Gauge> {
        let core = MetricCore::new(
            MetricKind::Gauge,
            self.name,
            self.help,
            &self.label_names,
            self.preset,
            CellLayout::Scalar,
            self.store,
        )?;
        Ok(Gauge { core })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn private_gauge(labels: &[&str]) -> Gauge {
        Gauge::builder("test_gauge", "A test gauge")
            .labels(labels)
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_overwrites() {
        let gauge = private_gauge(&[]);
        gauge.set(5.0, Labels::new()).unwrap();
        gauge.set(2.5, Labels::new()).unwrap();
        assert_eq!(gauge.get(Labels::new()).unwrap(), 2.5);
    }

    #[test]
    fn test_moves_both_directions() {
        let gauge = private_gauge(&[]);
        assert_eq!(gauge.increment(Labels::new()).unwrap(), 1.0);
        assert_eq!(gauge.decrement_by(3.0, Labels::new()).unwrap(), -2.0);
        assert_eq!(gauge.increment_by(-1.0, Labels::new()).unwrap(), -3.0);
    }

    #[test]
    fn test_zero_default() {
        let gauge = private_gauge(&["queue"]);
        assert_eq!(gauge.get(Labels::new().with("queue", "q1")).unwrap(), 0.0);
        assert!(gauge.values().is_empty());
    }

    #[test]
    fn test_invalid_label_set_rejected() {
        let gauge = private_gauge(&["queue"]);
        assert!(gauge.set(1.0, Labels::new()).is_err());
        assert!(gauge.values().is_empty());
    }

    #[test]
    fn test_lifecycle() {
        let gauge = private_gauge(&["queue"]);
        let labels = Labels::new().with("queue", "q1");

        gauge.init_label_set(labels.clone()).unwrap();
        assert_eq!(gauge.values().len(), 1);

        gauge.set(9.0, labels.clone()).unwrap();
        gauge.init_label_set(labels.clone()).unwrap();
        assert_eq!(gauge.get(labels.clone()).unwrap(), 9.0);

        gauge.purge_label_set(labels.clone()).unwrap();
        assert_eq!(gauge.get(labels).unwrap(), 0.0);
        assert!(gauge.values().is_empty());
    }

    #[test]
    fn test_metric_trait_surface() {
        let gauge = private_gauge(&[]);
        let metric: &dyn Metric = &gauge;
        assert_eq!(metric.kind(), MetricKind::Gauge);
    }
}
