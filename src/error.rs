//! Error types for TallyCraft operations.
//!
//! This module provides comprehensive error handling for metric construction
//! and observation. All errors are structured for ergonomic handling and
//! clear error messages.
//!
//! # Error Taxonomy
//!
//! - **Construction errors** (`InvalidMetricName`, `InvalidLabelName`,
//!   `DuplicateLabelName`, `ReservedLabel`, `EmptyHelp`, `InvalidBuckets`):
//!   raised synchronously while building a metric; fatal to that
//!   construction call, never corrupt shared state.
//! - **Observation errors** (`InvalidLabelSet`): raised when an
//!   observation's label keys do not exactly match the declared set; the
//!   observation is rejected before any store mutation.
//! - **Argument errors** (`NegativeIncrement`): rejected before any store
//!   mutation.
//!
//! # Error Propagation
//!
//! ```
//! use tallycraft::{Counter, Result};
//!
//! fn build_request_counter() -> Result<Counter> {
//!     let counter = Counter::new("requests_total", "Total requests", &["service"])?;
//!     Ok(counter)
//! }
//! # assert!(build_request_counter().is_ok());
//! ```

use std::fmt;

/// Result type alias for TallyCraft operations.
///
/// This is the standard Result type used throughout the crate.
/// All fallible operations return [`Result<T>`] where the error type is
/// [`TallyCraftError`].
///
/// # Examples
/// ```
/// use tallycraft::{Result, TallyCraftError};
///
/// fn validate_by(by: f64) -> Result<()> {
///     if by < 0.0 {
///         return Err(TallyCraftError::negative_increment(by));
///     }
///     Ok(())
/// }
/// # assert!(validate_by(1.0).is_ok());
/// ```
pub type Result<T> = std::result::Result<T, TallyCraftError>;

/// Errors that can occur during metric construction or observation.
///
/// This enum covers all possible error conditions in TallyCraft.
/// Each variant contains relevant context to help diagnose issues.
///
/// # Design Notes
/// - `Clone` + `PartialEq` enable testing and error comparison
/// - `Debug` required by std::error::Error trait
/// - All variants include sufficient context for debugging
#[derive(Debug, Clone, PartialEq)]
pub enum TallyCraftError {
    /// Metric name does not match the required identifier syntax.
    ///
    /// Metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    InvalidMetricName {
        /// The rejected metric name.
        name: String,
    },

    /// Label name does not match the required identifier syntax.
    ///
    /// Label names must match `[a-zA-Z_][a-zA-Z0-9_]*` and must not start
    /// with `__`, which is reserved for exposition internals.
    InvalidLabelName {
        /// The rejected label name.
        label: String,
    },

    /// The same label name was declared more than once for one metric.
    DuplicateLabelName {
        /// The duplicated label name.
        label: String,
    },

    /// A declared label name collides with a name the metric kind uses
    /// internally (`le` for histograms, `quantile` for summaries).
    ReservedLabel {
        /// The reserved label name that was declared.
        label: String,
    },

    /// The metric help text (docstring) is empty.
    ///
    /// Every metric must carry a non-empty description for exporters to
    /// render as help text.
    EmptyHelp {
        /// Name of the metric missing its help text.
        metric: String,
    },

    /// Histogram bucket boundaries are invalid.
    ///
    /// Boundaries must be finite and strictly ascending. The `+Inf` bucket
    /// is implicit and must not be supplied.
    InvalidBuckets {
        /// Description of what is wrong with the boundaries.
        reason: String,
    },

    /// An observation's label keys do not exactly match the declared label
    /// names after merging preset labels with call-site labels.
    ///
    /// Both missing and extra labels are rejected; there is no partial
    /// matching. The store is untouched when this error is raised.
    InvalidLabelSet {
        /// The label names the metric declared, in declared order.
        expected: Vec<String>,
        /// The label names the caller provided, sorted.
        provided: Vec<String>,
    },

    /// Attempted to increment a counter by a negative (or NaN) amount.
    ///
    /// Counters are monotonically non-decreasing.
    NegativeIncrement {
        /// The rejected increment amount.
        by: f64,
    },
}

impl fmt::Display for TallyCraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMetricName { name } => {
                write!(
                    f,
                    "Invalid metric name '{}'. Metric names must match [a-zA-Z_:][a-zA-Z0-9_:]*.",
                    name
                )
            }
            Self::InvalidLabelName { label } => {
                write!(
                    f,
                    "Invalid label name '{}'. Label names must match [a-zA-Z_][a-zA-Z0-9_]* and must not start with '__'.",
                    label
                )
            }
            Self::DuplicateLabelName { label } => {
                write!(f, "Label name '{}' is declared more than once.", label)
            }
            Self::ReservedLabel { label } => {
                write!(
                    f,
                    "Label name '{}' is reserved for internal use by this metric kind.",
                    label
                )
            }
            Self::EmptyHelp { metric } => {
                write!(f, "Metric '{}' must have non-empty help text.", metric)
            }
            Self::InvalidBuckets { reason } => {
                write!(f, "Invalid histogram buckets: {}.", reason)
            }
            Self::InvalidLabelSet { expected, provided } => {
                write!(
                    f,
                    "Label set mismatch: expected labels [{}], got [{}].",
                    expected.join(", "),
                    provided.join(", ")
                )
            }
            Self::NegativeIncrement { by } => {
                write!(
                    f,
                    "Cannot increment counter by {}. Counters are monotonic and require a non-negative amount.",
                    by
                )
            }
        }
    }
}

impl std::error::Error for TallyCraftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        // No nested errors in our current implementation
        None
    }
}

impl TallyCraftError {
    /// Create an `InvalidMetricName` error.
    #[must_use]
    pub fn invalid_metric_name(name: impl Into<String>) -> Self {
        Self::InvalidMetricName { name: name.into() }
    }

    /// Create an `InvalidLabelName` error.
    #[must_use]
    pub fn invalid_label_name(label: impl Into<String>) -> Self {
        Self::InvalidLabelName {
            label: label.into(),
        }
    }

    /// Create a `DuplicateLabelName` error.
    #[must_use]
    pub fn duplicate_label_name(label: impl Into<String>) -> Self {
        Self::DuplicateLabelName {
            label: label.into(),
        }
    }

    /// Create a `ReservedLabel` error.
    #[must_use]
    pub fn reserved_label(label: impl Into<String>) -> Self {
        Self::ReservedLabel {
            label: label.into(),
        }
    }

    /// Create an `EmptyHelp` error.
    #[must_use]
    pub fn empty_help(metric: impl Into<String>) -> Self {
        Self::EmptyHelp {
            metric: metric.into(),
        }
    }

    /// Create an `InvalidBuckets` error with a descriptive reason.
    ///
    /// # Examples
    /// ```
    /// use tallycraft::TallyCraftError;
    ///
    /// let err = TallyCraftError::invalid_buckets(
    ///     format!("boundary {} is not greater than its predecessor {}", 2.5, 5.0)
    /// );
    /// ```
    #[must_use]
    pub fn invalid_buckets(reason: impl Into<String>) -> Self {
        Self::InvalidBuckets {
            reason: reason.into(),
        }
    }

    /// Create an `InvalidLabelSet` error.
    ///
    /// `provided` is sorted so that error messages are deterministic
    /// regardless of caller-side label ordering.
    #[must_use]
    pub fn invalid_label_set(expected: Vec<String>, mut provided: Vec<String>) -> Self {
        provided.sort();
        Self::InvalidLabelSet { expected, provided }
    }

    /// Create a `NegativeIncrement` error.
    #[must_use]
    pub fn negative_increment(by: f64) -> Self {
        Self::NegativeIncrement { by }
    }
}
