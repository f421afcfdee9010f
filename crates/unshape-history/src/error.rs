//! History error types.

use thiserror::Error;

use crate::record::ParamType;

/// Errors raised by history bookkeeping and pruning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    /// Pruning was requested without any selection predicate.
    #[error(
        "remove_applied_transforms needs `list_selection_fn`, `per_element_selection_fn`, or both"
    )]
    MissingSelection,

    /// The most recent record for a key is absent or belongs to another transform.
    #[error("cannot invert {transform} on `{key}`: most recent record is {found}")]
    NoRecord {
        key: String,
        transform: String,
        found: String,
    },

    /// A reserved history key holds something other than a history store.
    #[error("reserved history key `{0}` does not hold a history store")]
    ReservedKey(String),

    /// A record is missing a parameter its transform needs to invert.
    #[error("record for {transform} is missing extra_info `{name}`")]
    MissingParam { transform: String, name: String },

    /// A record parameter has the wrong type.
    #[error("extra_info `{name}`: expected {expected}, got {got}")]
    ParamType {
        name: String,
        expected: ParamType,
        got: ParamType,
    },
}

/// Errors raised by array operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("shape {shape:?} holds {expected} elements, got {got}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error("axis {axis} out of bounds for array of dimension {ndim}")]
    AxisOutOfBounds { axis: usize, ndim: usize },
}

/// Errors raised while applying or inverting a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A transform's key is absent from the sample.
    #[error("key `{key}` not found in sample")]
    MissingKey { key: String },

    /// A key holds a value of the wrong kind.
    #[error("key `{key}`: expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Array(#[from] ArrayError),

    /// Failure inside a collaborator (decoder, storage, ...).
    #[error("{transform}: {source}")]
    External {
        transform: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransformError {
    /// Returns true if this error reports a missing or mismatched history record.
    pub fn is_no_record(&self) -> bool {
        matches!(self, TransformError::History(HistoryError::NoRecord { .. }))
    }
}
