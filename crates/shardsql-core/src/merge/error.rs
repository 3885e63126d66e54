//! Module: merge::error
//! Responsibility: merge-time error taxonomy.
//! Does not own: cursor failure detail, which arrives as `InternalError`.
//! Boundary: every wrapped cursor is closed before one of these is returned
//! from `next()`.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    statement::AggregationKind,
    value::{NumericError, ValueConversionError, ValueKind},
};
use thiserror::Error as ThisError;

///
/// MergeError
///

#[derive(Debug, ThisError)]
pub enum MergeError {
    #[error("reading table unit #{unit} failed: {source}")]
    Read {
        unit: usize,
        #[source]
        source: InternalError,
    },

    #[error("column index {column} out of range (1..={column_count})")]
    ColumnOutOfRange { column: usize, column_count: usize },

    #[error("merged result is closed")]
    Closed,

    #[error("merged result is not positioned on a row")]
    NoCurrentRow,

    #[error("expected {expected} results aligned to table units, got {actual}")]
    UnitCountMismatch { expected: usize, actual: usize },

    #[error("{kind} on column {column} cannot be merged: {source}")]
    UnsupportedAggregation {
        kind: AggregationKind,
        column: usize,
        #[source]
        source: NumericError,
    },

    #[error("column {column} holds {actual}, expected {expected}")]
    TypeMismatch {
        column: usize,
        expected: &'static str,
        actual: ValueKind,
    },

    #[error("{0}")]
    Internal(InternalError),
}

impl MergeError {
    pub(crate) fn type_mismatch(column: usize, err: ValueConversionError) -> Self {
        Self::TypeMismatch {
            column,
            expected: err.expected,
            actual: err.actual,
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Read { .. } => ErrorClass::Io,
            Self::ColumnOutOfRange { .. } => ErrorClass::NotFound,
            Self::Closed | Self::NoCurrentRow | Self::UnitCountMismatch { .. } => {
                ErrorClass::InvariantViolation
            }
            Self::UnsupportedAggregation { .. } | Self::TypeMismatch { .. } => {
                ErrorClass::Unsupported
            }
            Self::Internal(err) => err.class,
        }
    }

    /// Index of the table unit whose cursor failed, if any.
    #[must_use]
    pub const fn failed_unit(&self) -> Option<usize> {
        match self {
            Self::Read { unit, .. } => Some(*unit),
            _ => None,
        }
    }
}

impl From<MergeError> for InternalError {
    fn from(err: MergeError) -> Self {
        let origin = match &err {
            MergeError::Read { .. } => ErrorOrigin::Cursor,
            MergeError::Internal(inner) => inner.origin,
            _ => ErrorOrigin::Merge,
        };

        Self::new(err.class(), origin, err.to_string())
    }
}
