//! Label mappings, declared-schema validation, and canonical label sets.
//!
//! Every observation in TallyCraft is addressed by a *label set*: a mapping
//! from dimension names to string values identifying one time series of a
//! metric. This module provides the three forms that mapping takes on its
//! way into storage:
//!
//! - [`Labels`] - the caller-supplied form. Unordered, built incrementally,
//!   and value-coercing: every value is converted to its string form on
//!   insertion, so `404u16` and `"404"` address the same record.
//! - [`LabelSchema`] - the declared form. Names only, fixed at metric
//!   construction, with reserved-name and syntax enforcement.
//! - [`LabelSet`] - the validated, normalized form. Pairs reordered into the
//!   schema's declared order, usable as a stable composite store key and as
//!   the equality-comparable key of snapshot mappings.
//!
//! # Validation Contract
//!
//! Validation is a pure step with no shared mutable state; it is safe to
//! call from any number of threads concurrently. A label set is accepted
//! only when its key set equals the declared names *exactly*. Extra labels
//! and missing labels are both rejected, and rejection happens before any
//! store mutation.
//!
//! # Examples
//!
//! ```
//! use tallycraft::labels::{Labels, LabelSchema};
//!
//! let schema = LabelSchema::new(&["service", "code"], &[]).unwrap();
//!
//! let labels = Labels::new().with("code", 200).with("service", "web");
//! let set = schema.validate(&labels).unwrap();
//!
//! // Normalized into declared order, values coerced to strings.
//! assert_eq!(set.get("service"), Some("web"));
//! assert_eq!(set.get("code"), Some("200"));
//! ```

use crate::error::{Result, TallyCraftError};
use std::fmt;

/// A caller-supplied label mapping.
///
/// `Labels` is the write-side form: insertion-ordered, key-unique (setting
/// an existing key replaces its value), and string-coercing. It carries no
/// schema knowledge; validation against a metric's declared names happens
/// in [`LabelSchema::validate`].
///
/// # Value Coercion
///
/// Values are accepted as anything implementing [`ToString`] and stored as
/// strings immediately. Distinct representations of the same value collide
/// to one record by design.
///
/// # Examples
///
/// ```
/// use tallycraft::Labels;
///
/// let labels = Labels::new()
///     .with("service", "checkout")
///     .with("code", 503);
///
/// assert_eq!(labels.get("code"), Some("503"));
/// assert_eq!(labels.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    pairs: Vec<(String, String)>,
}

impl Labels {
    /// Create an empty label mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Labels;
    ///
    /// let labels = Labels::new();
    /// assert!(labels.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Add or replace a label, consuming and returning `self` for chaining.
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::Labels;
    ///
    /// let labels = Labels::new().with("code", 200).with("code", 404);
    /// assert_eq!(labels.get("code"), Some("404"));
    /// ```
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a label in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Look up a label value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of labels in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the mapping contains no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The label names currently present, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.pairs.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Merge `overlay` on top of `base`: every key of `overlay` is set into
    /// a copy of `base`, so overlay values win for shared keys.
    pub(crate) fn merged(base: &Labels, overlay: &Labels) -> Labels {
        let mut merged = base.clone();
        for (name, value) in overlay.iter() {
            merged.set(name, value);
        }
        merged
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Labels {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: ToString> From<Vec<(K, V)>> for Labels {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (name, value) in iter {
            labels.set(name, value);
        }
        labels
    }
}

/// The label names a metric declares, with reserved-name enforcement.
///
/// A schema is constructed once per metric and never changes. Construction
/// validates each declared name:
///
/// - syntax must match `[a-zA-Z_][a-zA-Z0-9_]*`
/// - the `__` prefix is rejected (reserved for exposition internals)
/// - duplicates are rejected
/// - collisions with the metric kind's reserved names (`le`, `quantile`)
///   are rejected
///
/// All violations are construction-time errors, not observation-time ones.
#[derive(Debug, Clone)]
pub struct LabelSchema {
    names: Vec<String>,
}

impl LabelSchema {
    /// Build a schema from declared label names and the kind's reserved
    /// names.
    ///
    /// # Errors
    ///
    /// - [`TallyCraftError::InvalidLabelName`] on bad syntax or `__` prefix
    /// - [`TallyCraftError::DuplicateLabelName`] on repeated names
    /// - [`TallyCraftError::ReservedLabel`] on reserved-name collision
    ///
    /// # Examples
    ///
    /// ```
    /// use tallycraft::labels::LabelSchema;
    ///
    /// assert!(LabelSchema::new(&["service"], &["le"]).is_ok());
    /// assert!(LabelSchema::new(&["le"], &["le"]).is_err());
    /// ```
    pub fn new<S: AsRef<str>>(names: &[S], reserved: &'static [&'static str]) -> Result<Self> {
        let mut declared: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            validate_label_name(name)?;
            if reserved.contains(&name) {
                return Err(TallyCraftError::reserved_label(name));
            }
            if declared.iter().any(|n| n == name) {
                return Err(TallyCraftError::duplicate_label_name(name));
            }
            declared.push(name.to_string());
        }
        Ok(Self { names: declared })
    }

    /// The declared label names, in declared order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of declared labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema declares no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Validate a label mapping against this schema and normalize it.
    ///
    /// The mapping's key set must equal the declared names exactly. On
    /// success, pairs are reordered into declared order and returned as a
    /// [`LabelSet`] suitable for use as a composite store key.
    ///
    /// # Errors
    ///
    /// [`TallyCraftError::InvalidLabelSet`] when keys are missing, extra,
    /// or both.
    pub fn validate(&self, labels: &Labels) -> Result<LabelSet> {
        let mut pairs = Vec::with_capacity(self.names.len());
        for name in &self.names {
            match labels.get(name) {
                Some(value) => pairs.push((name.clone(), value.to_string())),
                None => {
                    return Err(TallyCraftError::invalid_label_set(
                        self.names.clone(),
                        labels.names(),
                    ))
                }
            }
        }
        // Every declared name matched; any additional provided key is an
        // extra label.
        if labels.len() != pairs.len() {
            return Err(TallyCraftError::invalid_label_set(
                self.names.clone(),
                labels.names(),
            ));
        }
        Ok(LabelSet { pairs })
    }

    /// Validate that `labels` is a sub-mapping of the declared names.
    ///
    /// Used for preset labels fixed at construction or `with_labels` time,
    /// which may cover any subset of the declared names.
    pub(crate) fn validate_subset(&self, labels: &Labels) -> Result<()> {
        for (name, _) in labels.iter() {
            if !self.names.iter().any(|n| n == name) {
                return Err(TallyCraftError::invalid_label_set(
                    self.names.clone(),
                    labels.names(),
                ));
            }
        }
        Ok(())
    }
}

/// A validated, normalized label set.
///
/// Pairs are held in the owning metric's declared order, which makes a
/// `LabelSet` a stable composite key: two observations with the same
/// name/value content always produce equal keys regardless of the order the
/// caller supplied labels in. This is the key type of [`values()`]
/// snapshots and of the store layer.
///
/// [`values()`]: crate::Counter::values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    /// Look up a label value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of pairs in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set contains no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Extend this set with one trailing internal pair.
    ///
    /// Histogram and summary records are decomposed into scalar cells
    /// addressed by their reserved label; the cell key is the outer label
    /// set plus this trailing dimension.
    pub(crate) fn child(&self, name: &str, value: &str) -> LabelSet {
        let mut pairs = Vec::with_capacity(self.pairs.len() + 1);
        pairs.extend(self.pairs.iter().cloned());
        pairs.push((name.to_string(), value.to_string()));
        LabelSet { pairs }
    }

    /// The first `n` pairs as a new set: the outer label set of a cell key.
    pub(crate) fn prefix(&self, n: usize) -> LabelSet {
        LabelSet {
            pairs: self.pairs.iter().take(n).cloned().collect(),
        }
    }

    /// The value of the trailing internal pair, if any.
    pub(crate) fn last_value(&self) -> Option<&str> {
        self.pairs.last().map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}=\"{}\"", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Check a label name against the identifier rules.
///
/// Label names must match `[a-zA-Z_][a-zA-Z0-9_]*` and must not start with
/// `__`.
pub(crate) fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_first || !valid_rest || name.starts_with("__") {
        return Err(TallyCraftError::invalid_label_name(name));
    }
    Ok(())
}
