//! ## Crate layout
//! - `config`: TOML rule documents, inline data-node expressions, and the
//!   strategy registry.
//! - `core`: rule model, routing engines, the streaming merge pipeline,
//!   values, and observability.
//! - `error`: the public error type.
//!
//! [`ShardingRuntime`] ties one rule snapshot to the `route` and `merge`
//! entry points. The `prelude` module carries the vocabulary most callers
//! need.

pub use shardsql_config as config;
pub use shardsql_core as core;

pub mod error;
mod runtime;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// re-exports
pub use error::{Error, ErrorKind, ErrorOrigin};
pub use runtime::ShardingRuntime;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, ShardingRuntime,
        config::{StrategyProps, StrategyRegistry},
        core::{
            merge::{
                ExecutionResult, MemoryQueryResult, MergedOutcome, MergedResult, QueryResult,
                ResultMetadata,
            },
            route::{
                RoutingResult, ShardingCondition, ShardingConditionValue, ShardingConditions,
                ShardingValue, TableUnit, ValueRange,
            },
            rule::ShardingStrategyAdapter,
            statement::{
                AggregationProjection, DalKind, OrderByItem, StatementContext, StatementKind,
            },
            value::Value,
        },
    };
}
