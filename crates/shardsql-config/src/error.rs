use shardsql_core::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    rule::RuleError,
};
use std::path::PathBuf;
use thiserror::Error as ThisError;

///
/// ConfigError
///
/// Everything that can go wrong turning a TOML document into a rule
/// snapshot. Each variant names the table, tag, or expression at fault.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read rule config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("inline expression '{expression}' is malformed: {reason}")]
    InlineExpression { expression: String, reason: String },

    #[error("table '{table}' declares no actual data nodes and no data sources are configured")]
    MissingDataNodes { table: String },

    #[error("strategy type '{tag}' used by {owner} is not registered")]
    UnknownStrategy { owner: String, tag: String },

    #[error("strategy type '{tag}' is already registered")]
    DuplicateStrategy { tag: String },

    #[error("strategy type '{tag}' used by {owner} failed to initialize: {source}")]
    StrategyInit {
        owner: String,
        tag: String,
        #[source]
        source: InternalError,
    },

    #[error("{0}")]
    Rule(#[from] RuleError),
}

impl ConfigError {
    pub(crate) fn inline(expression: &str, reason: impl Into<String>) -> Self {
        Self::InlineExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Io { .. } => ErrorClass::Io,
            Self::UnknownStrategy { .. } => ErrorClass::NotFound,
            Self::StrategyInit { source, .. } => source.class,
            Self::Parse(_)
            | Self::InlineExpression { .. }
            | Self::MissingDataNodes { .. }
            | Self::DuplicateStrategy { .. }
            | Self::Rule(_) => ErrorClass::Configuration,
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.class(), ErrorOrigin::Config, err.to_string())
    }
}
