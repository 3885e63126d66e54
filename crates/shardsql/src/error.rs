use derive_more::Display;
use shardsql_config::ConfigError;
use shardsql_core::{error::InternalError, merge::MergeError, route::RouteError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        let kind = match err {
            ConfigError::Io { .. } => ErrorKind::Io,
            _ => ErrorKind::Configuration,
        };

        Self::new(kind, ErrorOrigin::Config, err.to_string())
    }
}

impl From<RouteError> for Error {
    fn from(err: RouteError) -> Self {
        let kind = if err.is_configuration() {
            ErrorKind::Configuration
        } else {
            ErrorKind::Routing
        };

        Self::new(kind, ErrorOrigin::Route, err.to_string())
    }
}

impl From<MergeError> for Error {
    fn from(err: MergeError) -> Self {
        let kind = match err {
            MergeError::Read { .. } => ErrorKind::Io,
            MergeError::Internal(_) => ErrorKind::Internal,
            _ => ErrorKind::Merge,
        };

        Self::new(kind, ErrorOrigin::Merge, err.to_string())
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(ErrorKind::Internal, ErrorOrigin::Internal, err.display_with_class())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
    /// Rule or config is inconsistent; fix the configuration.
    Configuration,

    /// A statement could not be routed with a consistent rule.
    Routing,

    /// Merged-result misuse or an unmergeable value.
    Merge,

    /// A shard cursor or config file could not be read.
    Io,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Route,
    Merge,
    Internal,
}
