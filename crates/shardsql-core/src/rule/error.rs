//! Module: rule::error
//! Responsibility: rule-construction error taxonomy.
//! Does not own: routing-time failures (see route::error).
//! Boundary: raised while assembling an immutable `ShardingRule` snapshot.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    rule::StrategyLevel,
};
use thiserror::Error as ThisError;

///
/// RuleError
///
/// Configuration inconsistencies detected when a rule snapshot is built.
/// Every variant names the offending tables or data sources.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RuleError {
    #[error("table '{table}' declares no data nodes")]
    EmptyDataNodes { table: String },

    #[error("malformed data node '{text}': expected '<data_source>.<table>'")]
    MalformedDataNode { text: String },

    #[error("table '{table}' declares data node '{node}' more than once")]
    DuplicateDataNode { table: String, node: String },

    #[error("table '{table}' references unknown data source '{data_source}'")]
    UnknownDataSource { table: String, data_source: String },

    #[error("table '{table}' is configured more than once")]
    DuplicateTable { table: String },

    #[error("table '{table}' is both sharded and broadcast")]
    BroadcastConflict { table: String },

    #[error("{level} strategy of table '{table}' names no sharding column")]
    EmptyStrategyColumns { table: String, level: StrategyLevel },

    #[error("binding group [{}] references unknown table '{table}'", .group.join(", "))]
    BindingTableNotFound { group: Vec<String>, table: String },

    #[error(
        "binding group [{}] is not co-partitioned: '{table}' has {actual} but '{representative}' has {expected}",
        .group.join(", ")
    )]
    BindingMismatch {
        group: Vec<String>,
        representative: String,
        table: String,
        expected: String,
        actual: String,
    },
}

impl From<RuleError> for InternalError {
    fn from(err: RuleError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Rule, err.to_string())
    }
}
