use crate::{error::InternalError, route::ShardingConditionValue};
use std::{fmt, sync::Arc};

///
/// StrategyLevel
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum StrategyLevel {
    #[display("database")]
    Database,
    #[display("table")]
    Table,
}

impl StrategyLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Table => "table",
        }
    }
}

///
/// ShardingStrategyAdapter
///
/// Invocation contract for an external value-to-shard algorithm.
///
/// `candidates` are the configured names at one level (data sources, or the
/// actual tables of one data source), in configuration order. `values` are
/// the predicates on this strategy's sharding columns drawn from a single
/// condition; they are never empty. Precise values must yield exact matches;
/// range values may yield a superset. Returned names must be a subset of
/// `candidates`.
///

pub trait ShardingStrategyAdapter: fmt::Debug + Send + Sync {
    fn do_sharding(
        &self,
        candidates: &[String],
        values: &[&ShardingConditionValue],
    ) -> Result<Vec<String>, InternalError>;
}

///
/// StrategyRule
///
/// A resolved adapter plus the sharding columns it reads.
///

#[derive(Clone, Debug)]
pub struct StrategyRule {
    columns: Vec<String>,
    adapter: Arc<dyn ShardingStrategyAdapter>,
}

impl StrategyRule {
    #[must_use]
    pub fn new<I, S>(columns: I, adapter: Arc<dyn ShardingStrategyAdapter>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            adapter,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn adapter(&self) -> &dyn ShardingStrategyAdapter {
        self.adapter.as_ref()
    }
}
