//! Count-and-sum summaries.
//!
//! A summary tracks how many observations a label set has seen and their
//! running sum, enough for an exporter to derive rates and averages. No
//! quantile estimation is performed; `quantile` is nevertheless reserved
//! because the record's cells are addressed through it, and because
//! exporters render quantile series under that label.
//!
//! # Examples
//!
//! ```
//! use tallycraft::{Labels, Summary};
//!
//! let sizes = Summary::new("payload_bytes", "Payload sizes", &[]).unwrap();
//!
//! sizes.observe(512.0, Labels::new()).unwrap();
//! sizes.observe(2048.0, Labels::new()).unwrap();
//!
//! let record = sizes.get(Labels::new()).unwrap();
//! assert_eq!(record["count"], 2.0);
//! assert_eq!(record["sum"], 2560.0);
//! ```

use super::core::{CellLayout, Metric, MetricCore};
use super::MetricKind;
use crate::error::Result;
use crate::labels::{LabelSet, Labels};
use crate::store::ValueStore;
use std::collections::HashMap;
use std::sync::Arc;

/// The internal dimension addressing summary cells.
const QUANTILE_LABEL: &str = "quantile";

/// Cell name of the observation count.
const COUNT_CELL: &str = "count";

/// Cell name of the running sum of observed values.
const SUM_CELL: &str = "sum";

/// An observation count plus running sum.
///
/// Thread-safe; each cell update is atomic per key.
#[derive(Clone, Debug)]
pub struct Summary {
    core: MetricCore,
}

impl Summary {
    /// Create a summary against the process-wide value store.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Summary;
    ///
    /// let summary = Summary::new("job_seconds", "Job runtime", &["queue"]).unwrap();
    /// ```
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        Self::builder(name, help).labels(label_names).build()
    }

    /// Start building a summary.
    #[must_use]
    pub fn builder(name: impl Into<String>, help: impl Into<String>) -> SummaryBuilder {
        SummaryBuilder {
            name: name.into(),
            help: help.into(),
            label_names: Vec::new(),
            preset: Labels::new(),
            store: None,
        }
    }

    /// Record one observation: count += 1, sum += `value`.
    ///
    /// # Errors
    ///
    /// [`crate::TallyCraftError::InvalidLabelSet`] on label mismatch; the
    /// record is untouched.
    pub fn observe(&self, value: f64, labels: impl Into<Labels>) -> Result<()> {
        let base = self.core.bound_set(&labels.into())?;
        self.core
            .store()
            .increment(&base.child(QUANTILE_LABEL, COUNT_CELL), 1.0);
        self.core
            .store()
            .increment(&base.child(QUANTILE_LABEL, SUM_CELL), value);
        Ok(())
    }

    /// Current record for a label set: `{"count", "sum"}`, both 0.0 when
    /// never observed.
    pub fn get(&self, labels: impl Into<Labels>) -> Result<HashMap<String, f64>> {
        self.core.read_cells(&labels.into())
    }

    /// Snapshot of every live label set and its record.
    #[must_use]
    pub fn values(&self) -> HashMap<LabelSet, HashMap<String, f64>> {
        self.core.mapped_values()
    }

    /// A view of this summary with `labels` pre-merged.
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

impl Metric for Summary {
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

/// Builder for [`Summary`].
pub struct SummaryBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    preset: Labels,
    store: Option<Arc<dyn ValueStore>>,
}

impl SummaryBuilder {
    /// Declare the summary's label names.
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

    /// Validate parameters and build the summary.
    pub fn build(self) -> Result<Summary> {
        let core = MetricCore::new(
            MetricKind::Summary,
            self.name,
            self.help,
            &self.label_names,
            self.preset,
            CellLayout::Dimension {
                label: QUANTILE_LABEL,
                cells: vec![COUNT_CELL.to_string(), SUM_CELL.to_string()],
            },
            self.store,
        )?;
        Ok(Summary { core })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyCraftError;
    use crate::store::InMemoryStore;

    fn private_summary(labels: &[&str]) -> Summary {
        Summary::builder("test_summary", "A test summary")
            .labels(labels)
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_observations_accumulate_count_and_sum() {
        let summary = private_summary(&[]);
        for value in [3.0, 5.2, 13.0, 4.0] {
            summary.observe(value, Labels::new()).unwrap();
        }

        let record = summary.get(Labels::new()).unwrap();
        assert_eq!(record["count"], 4.0);
        assert_eq!(record["sum"], 3.0 + 5.2 + 13.0 + 4.0);
    }

    #[test]
    fn test_default_record_is_zero() {
        let summary = private_summary(&["queue"]);
        let record = summary.get(Labels::new().with("queue", "q1")).unwrap();
        assert_eq!(record["count"], 0.0);
        assert_eq!(record["sum"], 0.0);
        assert!(summary.values().is_empty());
    }

    #[test]
    fn test_quantile_is_reserved() {
        let result = Summary::builder("s", "help")
            .labels(&["quantile"])
            .store(Arc::new(InMemoryStore::new()))
            .build();
        assert_eq!(
            result.unwrap_err(),
            TallyCraftError::reserved_label("quantile")
        );
    }

    #[test]
    fn test_negative_observations_allowed() {
        let summary = private_summary(&[]);
        summary.observe(-2.5, Labels::new()).unwrap();
        summary.observe(1.0, Labels::new()).unwrap();

        let record = summary.get(Labels::new()).unwrap();
        assert_eq!(record["count"], 2.0);
        assert_eq!(record["sum"], -1.5);
    }

    #[test]
    fn test_values_per_label_set() {
        let summary = private_summary(&["queue"]);
        summary
            .observe(1.0, Labels::new().with("queue", "q1"))
            .unwrap();
        summary
            .observe(2.0, Labels::new().with("queue", "q2"))
            .unwrap();

        let snapshot = summary.values();
        let q1 = summary
            .label_set(Labels::new().with("queue", "q1"))
            .unwrap();
        assert_eq!(snapshot[&q1]["count"], 1.0);
        assert_eq!(snapshot[&q1]["sum"], 1.0);
    }

    #[test]
    fn test_lifecycle() {
        let summary = private_summary(&["queue"]);
        let labels = Labels::new().with("queue", "q1");

        summary.init_label_set(labels.clone()).unwrap();
        assert_eq!(summary.values().len(), 1);

        summary.observe(4.0, labels.clone()).unwrap();
        summary.init_label_set(labels.clone()).unwrap();
        assert_eq!(summary.get(labels.clone()).unwrap()["sum"], 4.0);

        summary.purge_label_set(labels.clone()).unwrap();
        assert!(summary.values().is_empty());
        summary.purge_label_set(labels).unwrap();
    }

    #[test]
    fn test_with_labels_view() {
        let summary = private_summary(&["queue", "host"]);
        let host = summary
            .with_labels(Labels::new().with("host", "a1"))
            .unwrap();
        host.observe(2.0, Labels::new().with("queue", "q1")).unwrap();

        let record = summary
            .get(Labels::new().with("queue", "q1").with("host", "a1"))
            .unwrap();
        assert_eq!(record["count"], 1.0);
    }
}
