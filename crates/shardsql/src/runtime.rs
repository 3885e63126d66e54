use crate::Error;
use shardsql_config::{StrategyRegistry, load_rule, load_rule_from_path};
use shardsql_core::{
    merge::{ExecutionResult, MergeEngine, MergedOutcome},
    route::{self, RoutingResult},
    rule::ShardingRule,
    statement::StatementContext,
};
use std::{path::Path, sync::Arc};

///
/// ShardingRuntime
///
/// Owns one immutable rule snapshot and exposes the two statement entry
/// points. Cloning shares the snapshot; swapping rules means building a new
/// runtime.
///

#[derive(Clone, Debug)]
pub struct ShardingRuntime {
    rule: Arc<ShardingRule>,
}

impl ShardingRuntime {
    #[must_use]
    pub fn new(rule: ShardingRule) -> Self {
        tracing::info!(
            tables = rule.table_rules().len(),
            data_sources = rule.data_sources().len(),
            "sharding rule installed"
        );

        Self {
            rule: Arc::new(rule),
        }
    }

    /// Build a runtime from a TOML rule document.
    pub fn from_toml(text: &str, registry: &StrategyRegistry) -> Result<Self, Error> {
        Ok(Self::new(load_rule(text, registry)?))
    }

    /// Build a runtime from a TOML rule file.
    pub fn from_path(path: impl AsRef<Path>, registry: &StrategyRegistry) -> Result<Self, Error> {
        Ok(Self::new(load_rule_from_path(path, registry)?))
    }

    #[must_use]
    pub fn rule(&self) -> &ShardingRule {
        &self.rule
    }

    /// Shared handle to the rule snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ShardingRule> {
        Arc::clone(&self.rule)
    }

    /// Route a statement to its table units.
    pub fn route(&self, ctx: &StatementContext) -> Result<RoutingResult, Error> {
        Ok(route::route(ctx, &self.rule)?)
    }

    /// Merge the per-unit results of a routed statement. `results` must be
    /// aligned with `routing`.
    pub fn merge(
        &self,
        ctx: &StatementContext,
        routing: &RoutingResult,
        results: Vec<ExecutionResult>,
    ) -> Result<MergedOutcome, Error> {
        Ok(MergeEngine::new(&self.rule).merge(ctx, routing, results)?)
    }
}

impl From<ShardingRule> for ShardingRuntime {
    fn from(rule: ShardingRule) -> Self {
        Self::new(rule)
    }
}
