use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Raised by external collaborators (cursors, strategy adapters) and by
/// engine invariant checks; typed boundary errors wrap it.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    /// Construct an InternalError from its classification parts.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a cursor read failure reported by the execution layer.
    pub fn cursor_read(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Io, ErrorOrigin::Cursor, message)
    }

    /// Construct a cursor access failure for a column that does not exist.
    pub fn cursor_column(column: usize, column_count: usize) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Cursor,
            format!("column index {column} out of range (1..={column_count})"),
        )
    }

    /// Construct a strategy-adapter failure.
    pub fn strategy_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Strategy, message)
    }

    /// Construct a strategy-adapter rejection for an unsupported value shape.
    pub fn strategy_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Strategy, message)
    }

    /// Construct a merge-origin invariant violation.
    pub(crate) fn merge_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Merge, message)
    }

    /// Construct a merge-origin unsupported error.
    pub(crate) fn merge_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Merge, message)
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    NotFound,
    Internal,
    Io,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Io => "io",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Rule,
    Strategy,
    Route,
    Merge,
    Cursor,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rule => "rule",
            Self::Strategy => "strategy",
            Self::Route => "route",
            Self::Merge => "merge",
            Self::Cursor => "cursor",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
