//! Core runtime for shardsql: sharding rules, routing engines, and the
//! streaming merge pipeline that folds per-shard cursors into one logical
//! result.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod error;
pub mod merge;
pub mod obs;
pub mod props;
pub mod route;
pub mod rule;
pub mod statement;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No engines, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        merge::{ExecutionResult, MergedOutcome, MergedResult, QueryResult},
        props::ShardingProps,
        route::{
            RoutingResult, RoutingUnit, ShardingCondition, ShardingConditionValue,
            ShardingConditions, ShardingValue, TableUnit,
        },
        rule::{DataNode, ShardingRule, ShardingStrategyAdapter, StrategyRule, TableRule},
        statement::{
            AggregationProjection, NullsOrder, OrderByItem, OrderDirection, Pagination,
            StatementContext, StatementKind,
        },
        value::Value,
    };
}
