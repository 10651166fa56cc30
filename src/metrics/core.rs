//! Shared metric base: identity, presets, and the store-interaction path.
//!
//! Every metric kind funnels its operations through one reusable path:
//! validate the caller's labels against the declared schema, merge preset
//! labels, normalize into a canonical [`LabelSet`] key, then perform the
//! store operation. Keeping that path in one place means the kinds
//! themselves only describe *what* an observation does to stored cells,
//! never *how* a label set becomes a key.
//!
//! # Cell Layout
//!
//! The store holds scalar cells only. A counter or gauge record is one
//! cell addressed by the label set itself. A histogram or summary record is
//! several cells addressed by the label set plus a trailing internal
//! dimension named after the kind's reserved label (`le`, `quantile`).
//! [`CellLayout`] captures that difference once, so the lifecycle
//! operations (`init_label_set`, `purge_label_set`, snapshots) are written
//! a single time for all kinds.

use crate::error::{Result, TallyCraftError};
use crate::labels::{LabelSchema, LabelSet, Labels};
use crate::metrics::MetricKind;
use crate::store::{value_store, MetricStore, ValueStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity surface shared by every metric kind.
///
/// This is the object-safe slice of a metric consumed by registry and
/// exporter collaborators: who the metric is, not how to observe into it.
///
/// # Examples
///
/// ```
/// use tallycraft::{Counter, Metric, MetricKind};
///
/// let counter = Counter::new("jobs_total", "Jobs processed", &["queue"]).unwrap();
/// let metric: &dyn Metric = &counter;
///
/// assert_eq!(metric.name(), "jobs_total");
/// assert_eq!(metric.kind(), MetricKind::Counter);
/// assert_eq!(metric.label_names(), &["queue".to_string()]);
/// ```
pub trait Metric {
    /// The metric's name.
    fn name(&self) -> &str;

    /// The metric's help text.
    fn help(&self) -> &str;

    /// The metric's statistical shape.
    fn kind(&self) -> MetricKind;

    /// The declared label names, in declared order.
    fn label_names(&self) -> &[String];
}

/// How one logical record maps onto scalar store cells.
#[derive(Debug, Clone)]
pub(crate) enum CellLayout {
    /// One cell, addressed by the label set itself (counters, gauges).
    Scalar,
    /// One cell per entry of `cells`, addressed by the label set plus the
    /// trailing pair `(label, cell)` (histograms, summaries).
    Dimension {
        /// The reserved label used as the internal dimension name.
        label: &'static str,
        /// Cell names in read-back order.
        cells: Vec<String>,
    },
}

/// Shared state and behavior behind every metric kind.
///
/// Holds the immutable identity (name, help, schema), the accumulated
/// preset labels, the cell layout, and the store handle captured at
/// construction time. Cloning a core shares the handle, which is what
/// makes `with_labels` views cheap.
#[derive(Clone)]
pub(crate) struct MetricCore {
    name: String,
    help: String,
    kind: MetricKind,
    schema: LabelSchema,
    preset: Labels,
    layout: CellLayout,
    store: Arc<dyn MetricStore>,
}

impl std::fmt::Debug for MetricCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricCore")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .field("preset", &self.preset)
            .field("layout", &self.layout)
            .field("store", &"Arc<dyn MetricStore>")
            .finish()
    }
}

impl MetricCore {
    /// Validate identity parameters and bind a store handle.
    ///
    /// `store` overrides the process-wide backend when given; otherwise the
    /// active [`value_store`] is consulted. Either way the per-metric
    /// handle is captured here, once, for the metric's lifetime.
    pub(crate) fn new(
        kind: MetricKind,
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[String],
        preset: Labels,
        layout: CellLayout,
        store: Option<Arc<dyn ValueStore>>,
    ) -> Result<Self> {
        let name = name.into();
        validate_metric_name(&name)?;
        let help = help.into();
        if help.trim().is_empty() {
            return Err(TallyCraftError::empty_help(&name));
        }
        let schema = LabelSchema::new(label_names, kind.reserved_labels())?;
        schema.validate_subset(&preset)?;
        let backend = store.unwrap_or_else(value_store);
        let store = backend.for_metric(&name, kind, schema.names());
        Ok(Self {
            name,
            help,
            kind,
            schema,
            preset,
            layout,
            store,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn help(&self) -> &str {
        &self.help
    }

    pub(crate) fn kind(&self) -> MetricKind {
        self.kind
    }

    pub(crate) fn label_names(&self) -> &[String] {
        self.schema.names()
    }

    pub(crate) fn store(&self) -> &dyn MetricStore {
        self.store.as_ref()
    }

    /// Merge preset labels with call-site labels (call-site wins per key)
    /// and validate the result into a canonical key.
    pub(crate) fn bound_set(&self, labels: &Labels) -> Result<LabelSet> {
        let merged = Labels::merged(&self.preset, labels);
        self.schema.validate(&merged)
    }

    /// A new core with `labels` merged into the presets.
    ///
    /// The new presets must remain a sub-mapping of the declared names;
    /// later values override earlier ones for the same key. `self` is
    /// untouched.
    pub(crate) fn with_labels(&self, labels: &Labels) -> Result<Self> {
        self.schema.validate_subset(labels)?;
        let mut view = self.clone();
        view.preset = Labels::merged(&self.preset, labels);
        Ok(view)
    }

    /// Every store key backing the record for `base`.
    fn cell_keys(&self, base: &LabelSet) -> Vec<LabelSet> {
        match &self.layout {
            CellLayout::Scalar => vec![base.clone()],
            CellLayout::Dimension { label, cells } => cells
                .iter()
                .map(|cell| base.child(label, cell))
                .collect(),
        }
    }

    /// Create the kind's zero record for a label set if absent.
    ///
    /// Implemented as an increment by zero per cell: atomic, idempotent,
    /// and never overwrites a live value.
    pub(crate) fn init_label_set(&self, labels: &Labels) -> Result<()> {
        let base = self.bound_set(labels)?;
        for key in self.cell_keys(&base) {
            self.store.increment(&key, 0.0);
        }
        Ok(())
    }

    /// Remove every cell of a label set's record. No-op when absent.
    pub(crate) fn purge_label_set(&self, labels: &Labels) -> Result<()> {
        let base = self.bound_set(labels)?;
        for key in self.cell_keys(&base) {
            self.store.delete(&key);
        }
        Ok(())
    }

    /// Scalar-kind update: add `by` to the record, returning the new value.
    pub(crate) fn increment_scalar(&self, by: f64, labels: &Labels) -> Result<f64> {
        let key = self.bound_set(labels)?;
        Ok(self.store.increment(&key, by))
    }

    /// Scalar-kind overwrite.
    pub(crate) fn set_scalar(&self, value: f64, labels: &Labels) -> Result<()> {
        let key = self.bound_set(labels)?;
        self.store.set(&key, value);
        Ok(())
    }

    /// Scalar-kind read, zero default when unset.
    pub(crate) fn read_scalar(&self, labels: &Labels) -> Result<f64> {
        let key = self.bound_set(labels)?;
        Ok(self.store.get(&key).unwrap_or(0.0))
    }

    /// Scalar-kind snapshot: label set to current value.
    pub(crate) fn scalar_values(&self) -> HashMap<LabelSet, f64> {
        let arity = self.schema.len();
        self.store
            .all_values()
            .into_iter()
            .filter(|(key, _)| key.len() == arity)
            .collect()
    }

    /// Dimension-kind read: one label set's cells, all-zero when unset.
    pub(crate) fn read_cells(&self, labels: &Labels) -> Result<HashMap<String, f64>> {
        let base = self.bound_set(labels)?;
        let (label, cells) = match &self.layout {
            CellLayout::Dimension { label, cells } => (label, cells),
            CellLayout::Scalar => return Ok(HashMap::new()),
        };
        let mut record = HashMap::with_capacity(cells.len());
        for cell in cells {
            let value = self.store.get(&base.child(label, cell)).unwrap_or(0.0);
            record.insert(cell.clone(), value);
        }
        Ok(record)
    }

    /// Dimension-kind snapshot: label set to its full cell mapping.
    ///
    /// Cells a series has never written (possible only for records created
    /// outside the normal observation path) read back as zero so every
    /// returned mapping has the full cell shape.
    pub(crate) fn mapped_values(&self) -> HashMap<LabelSet, HashMap<String, f64>> {
        let arity = self.schema.len();
        let cells = match &self.layout {
            CellLayout::Dimension { cells, .. } => cells,
            CellLayout::Scalar => return HashMap::new(),
        };
        let mut grouped: HashMap<LabelSet, HashMap<String, f64>> = HashMap::new();
        for (key, value) in self.store.all_values() {
            if key.len() != arity + 1 {
                continue;
            }
            if let Some(cell) = key.last_value() {
                let cell = cell.to_string();
                grouped.entry(key.prefix(arity)).or_default().insert(cell, value);
            }
        }
        for record in grouped.values_mut() {
            for cell in cells {
                record.entry(cell.clone()).or_insert(0.0);
            }
        }
        grouped
    }
}

/// Check a metric name against the identifier rules.
///
/// Metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first =
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if !valid_first || !valid_rest {
        return Err(TallyCraftError::invalid_metric_name(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn scalar_core(name: &str, labels: &[&str]) -> MetricCore {
        let label_names: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        MetricCore::new(
            MetricKind::Counter,
            name,
            "help text",
            &label_names,
            Labels::new(),
            CellLayout::Scalar,
            Some(Arc::new(InMemoryStore::new())),
        )
        .unwrap()
    }

    fn dimension_core(name: &str, labels: &[&str], cells: &[&str]) -> MetricCore {
        let label_names: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        MetricCore::new(
            MetricKind::Histogram,
            name,
            "help text",
            &label_names,
            Labels::new(),
            CellLayout::Dimension {
                label: "le",
                cells: cells.iter().map(|s| s.to_string()).collect(),
            },
            Some(Arc::new(InMemoryStore::new())),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_metric_name() {
        assert!(validate_metric_name("requests_total").is_ok());
        assert!(validate_metric_name("http:requests").is_ok());
        assert!(validate_metric_name("_hidden").is_ok());
        assert!(validate_metric_name("2xx").is_err());
        assert!(validate_metric_name("has space").is_err());
        assert!(validate_metric_name("").is_err());
    }

    #[test]
    fn test_construction_rejects_empty_help() {
        let err = MetricCore::new(
            MetricKind::Counter,
            "m",
            "   ",
            &[],
            Labels::new(),
            CellLayout::Scalar,
            Some(Arc::new(InMemoryStore::new())),
        )
        .unwrap_err();
        assert_eq!(err, TallyCraftError::empty_help("m"));
    }

    #[test]
    fn test_construction_rejects_reserved_declared_label() {
        let err = MetricCore::new(
            MetricKind::Histogram,
            "m",
            "help",
            &["le".to_string()],
            Labels::new(),
            CellLayout::Scalar,
            Some(Arc::new(InMemoryStore::new())),
        )
        .unwrap_err();
        assert_eq!(err, TallyCraftError::reserved_label("le"));
    }

    #[test]
    fn test_construction_rejects_unknown_preset() {
        let err = MetricCore::new(
            MetricKind::Counter,
            "m",
            "help",
            &["service".to_string()],
            Labels::new().with("region", "eu"),
            CellLayout::Scalar,
            Some(Arc::new(InMemoryStore::new())),
        )
        .unwrap_err();
        assert!(matches!(err, TallyCraftError::InvalidLabelSet { .. }));
    }

    #[test]
    fn test_bound_set_merges_presets_call_site_wins() {
        let core = scalar_core("m", &["service", "region"]);
        let view = core
            .with_labels(&Labels::new().with("region", "eu"))
            .unwrap();

        let set = view
            .bound_set(&Labels::new().with("service", "web").with("region", "us"))
            .unwrap();
        assert_eq!(set.get("region"), Some("us"));

        let set = view
            .bound_set(&Labels::new().with("service", "web"))
            .unwrap();
        assert_eq!(set.get("region"), Some("eu"));
    }

    #[test]
    fn test_with_labels_leaves_original_untouched() {
        let core = scalar_core("m", &["service"]);
        let _view = core
            .with_labels(&Labels::new().with("service", "web"))
            .unwrap();
        // The original still requires the label at the call site.
        assert!(core.bound_set(&Labels::new()).is_err());
    }

    #[test]
    fn test_with_labels_rejects_undeclared() {
        let core = scalar_core("m", &["service"]);
        assert!(core
            .with_labels(&Labels::new().with("region", "eu"))
            .is_err());
    }

    #[test]
    fn test_init_and_purge_scalar() {
        let core = scalar_core("m", &["service"]);
        let labels = Labels::new().with("service", "web");

        core.init_label_set(&labels).unwrap();
        assert_eq!(core.scalar_values().len(), 1);

        core.increment_scalar(5.0, &labels).unwrap();
        core.init_label_set(&labels).unwrap();
        assert_eq!(core.read_scalar(&labels).unwrap(), 5.0);

        core.purge_label_set(&labels).unwrap();
        assert!(core.scalar_values().is_empty());
        // Purging again is a no-op.
        core.purge_label_set(&labels).unwrap();
    }

    #[test]
    fn test_init_and_purge_dimension_touch_every_cell() {
        let core = dimension_core("m", &["service"], &["1", "+Inf", "sum"]);
        let labels = Labels::new().with("service", "web");

        core.init_label_set(&labels).unwrap();
        let record = core.read_cells(&labels).unwrap();
        assert_eq!(record.len(), 3);
        assert!(record.values().all(|v| *v == 0.0));
        assert_eq!(core.mapped_values().len(), 1);

        core.purge_label_set(&labels).unwrap();
        assert!(core.mapped_values().is_empty());
    }

    #[test]
    fn test_mapped_values_groups_by_outer_label_set() {
        let core = dimension_core("m", &["service"], &["1", "sum"]);
        let web = core.bound_set(&Labels::new().with("service", "web")).unwrap();
        let api = core.bound_set(&Labels::new().with("service", "api")).unwrap();

        core.store().increment(&web.child("le", "1"), 2.0);
        core.store().increment(&web.child("le", "sum"), 1.5);
        core.store().increment(&api.child("le", "1"), 4.0);

        let snapshot = core.mapped_values();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&web]["1"], 2.0);
        assert_eq!(snapshot[&web]["sum"], 1.5);
        assert_eq!(snapshot[&api]["1"], 4.0);
        // The cell the api series never wrote reads back as zero.
        assert_eq!(snapshot[&api]["sum"], 0.0);
    }

    #[test]
    fn test_read_scalar_zero_default() {
        let core = scalar_core("m", &["service"]);
        let value = core
            .read_scalar(&Labels::new().with("service", "absent"))
            .unwrap();
        assert_eq!(value, 0.0);
    }
}
