//! Module: route::error
//! Responsibility: routing-time error taxonomy.
//! Does not own: rule-construction validation (see rule::error).
//! Boundary: every variant is fatal and surfaces before any execution.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    rule::StrategyLevel,
};
use thiserror::Error as ThisError;

///
/// RouteError
///
/// Configuration variants always name the offending tables and data
/// sources so operators can fix the rule without reproducing the statement.
///

#[derive(Debug, ThisError)]
pub enum RouteError {
    #[error("no sharding rule configured for table(s) [{}]", .tables.join(", "))]
    RuleNotFound { tables: Vec<String> },

    #[error(
        "binding group [{}] is inconsistent: '{table}' routes to [{}] but the representative routes to [{}]",
        .group.join(", "),
        .actual.join(", "),
        .expected.join(", ")
    )]
    BindingInconsistent {
        group: Vec<String>,
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("actual table '{actual_table}' is not configured for '{table}' in data source '{data_source}'")]
    InvalidActualTable {
        table: String,
        data_source: String,
        actual_table: String,
    },

    #[error("{level} strategy of '{table}' matched no configured target")]
    NoRouteTarget { table: String, level: StrategyLevel },

    #[error("{level} strategy of '{table}' returned unconfigured target '{target}'")]
    FabricatedTarget {
        table: String,
        level: StrategyLevel,
        target: String,
    },

    #[error("tables [{}] share no data source", .tables.join(", "))]
    DisjointDataSources { tables: Vec<String> },

    #[error("cartesian product of {size} table units exceeds the limit of {limit}")]
    CartesianLimitExceeded { size: usize, limit: usize },

    #[error("{level} strategy of '{table}' failed: {source}")]
    Strategy {
        table: String,
        level: StrategyLevel,
        #[source]
        source: InternalError,
    },
}

impl RouteError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RuleNotFound { .. }
            | Self::BindingInconsistent { .. }
            | Self::InvalidActualTable { .. }
            | Self::FabricatedTarget { .. }
            | Self::DisjointDataSources { .. } => ErrorClass::Configuration,
            Self::NoRouteTarget { .. } => ErrorClass::NotFound,
            Self::CartesianLimitExceeded { .. } => ErrorClass::Unsupported,
            Self::Strategy { source, .. } => source.class,
        }
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class(), ErrorClass::Configuration)
    }
}

impl From<RouteError> for InternalError {
    fn from(err: RouteError) -> Self {
        let origin = match &err {
            RouteError::Strategy { .. } => ErrorOrigin::Strategy,
            _ => ErrorOrigin::Route,
        };

        Self::new(err.class(), origin, err.to_string())
    }
}
