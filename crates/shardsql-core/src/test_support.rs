//! Shared fixtures for unit tests: rule snapshots and strategy adapters.

use crate::{
    error::InternalError,
    props::ShardingProps,
    route::{ShardingConditionValue, ShardingValue},
    rule::{DataNode, ShardingRule, ShardingStrategyAdapter, StrategyRule, TableRule},
    value::Value,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// `count` actual tables named `{table}_{i}` in each data source, data
/// sources first.
pub(crate) fn nodes(data_sources: &[&str], table: &str, count: usize) -> Vec<DataNode> {
    data_sources
        .iter()
        .flat_map(|ds| (0..count).map(move |i| DataNode::new(*ds, format!("{table}_{i}"))))
        .collect()
}

///
/// ModuloAdapter
///
/// Matches candidates whose trailing `_N` suffix equals `value % modulus`.
/// Values in one IN list are unioned, separate predicates intersected, and
/// ranges keep every candidate.
///

#[derive(Debug)]
pub(crate) struct ModuloAdapter {
    modulus: u64,
    calls: Arc<AtomicUsize>,
}

impl ModuloAdapter {
    pub(crate) fn new(modulus: u64) -> Self {
        Self {
            modulus,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn matches(&self, candidate: &str, value: &Value) -> bool {
        let Some(shard) = value.as_u64() else {
            return false;
        };
        let suffix = candidate
            .rsplit_once('_')
            .and_then(|(_, suffix)| suffix.parse::<u64>().ok());

        suffix == Some(shard % self.modulus)
    }
}

impl ShardingStrategyAdapter for ModuloAdapter {
    fn do_sharding(
        &self,
        candidates: &[String],
        values: &[&ShardingConditionValue],
    ) -> Result<Vec<String>, InternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(candidates
            .iter()
            .filter(|candidate| {
                values.iter().all(|value| match value.value() {
                    ShardingValue::Precise(list) => {
                        list.iter().any(|v| self.matches(candidate, v))
                    }
                    ShardingValue::Range(_) => true,
                })
            })
            .cloned()
            .collect())
    }
}

/// Adapter that always fails.
#[derive(Debug)]
pub(crate) struct FailingAdapter;

impl ShardingStrategyAdapter for FailingAdapter {
    fn do_sharding(
        &self,
        _: &[String],
        _: &[&ShardingConditionValue],
    ) -> Result<Vec<String>, InternalError> {
        Err(InternalError::strategy_failed("fixture strategy failure"))
    }
}

/// Adapter that returns a target that was never offered.
#[derive(Debug)]
pub(crate) struct FabricatingAdapter;

impl ShardingStrategyAdapter for FabricatingAdapter {
    fn do_sharding(
        &self,
        _: &[String],
        _: &[&ShardingConditionValue],
    ) -> Result<Vec<String>, InternalError> {
        Ok(vec!["ds_9".to_string()])
    }
}

/// Strategy on `column` backed by `adapter`.
pub(crate) fn strategy(
    column: &str,
    adapter: impl ShardingStrategyAdapter + 'static,
) -> StrategyRule {
    StrategyRule::new([column], Arc::new(adapter))
}

///
/// OrderFixture
///
/// Two data sources with two actual tables each for `t_order`,
/// `t_order_item` (bound to `t_order`) and `t_user`, plus the broadcast
/// table `t_config`. Databases shard on `user_id % 2`, tables on
/// `order_id % 2` (`user_id % 2` for `t_user`). Every strategy counts its
/// invocations.
///

pub(crate) struct OrderFixture {
    pub(crate) rule: ShardingRule,
    pub(crate) order_database_calls: Arc<AtomicUsize>,
    pub(crate) order_table_calls: Arc<AtomicUsize>,
    pub(crate) item_database_calls: Arc<AtomicUsize>,
    pub(crate) item_table_calls: Arc<AtomicUsize>,
}

impl OrderFixture {
    pub(crate) fn item_calls(&self) -> usize {
        self.item_database_calls.load(Ordering::SeqCst)
            + self.item_table_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn order_calls(&self) -> usize {
        self.order_database_calls.load(Ordering::SeqCst)
            + self.order_table_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn order_fixture(props: ShardingProps) -> OrderFixture {
    let data_sources = ["ds_0", "ds_1"];

    let order_db = ModuloAdapter::new(2);
    let order_tb = ModuloAdapter::new(2);
    let item_db = ModuloAdapter::new(2);
    let item_tb = ModuloAdapter::new(2);
    let fixture_calls = (order_db.calls(), order_tb.calls(), item_db.calls(), item_tb.calls());

    let table = |name: &str, db: ModuloAdapter, db_column: &str, tb: ModuloAdapter, tb_column: &str| {
        TableRule::new(name, nodes(&data_sources, name, 2))
            .and_then(|rule| rule.with_database_strategy(strategy(db_column, db)))
            .and_then(|rule| rule.with_table_strategy(strategy(tb_column, tb)))
            .expect("fixture table rule")
    };

    let rule = ShardingRule::builder()
        .data_sources(data_sources)
        .table(table("t_order", order_db, "user_id", order_tb, "order_id"))
        .table(table("t_order_item", item_db, "user_id", item_tb, "order_id"))
        .table(table(
            "t_user",
            ModuloAdapter::new(2),
            "user_id",
            ModuloAdapter::new(2),
            "user_id",
        ))
        .binding_group(["t_order", "t_order_item"])
        .broadcast_table("t_config")
        .props(props)
        .build()
        .expect("fixture sharding rule");

    OrderFixture {
        rule,
        order_database_calls: fixture_calls.0,
        order_table_calls: fixture_calls.1,
        item_database_calls: fixture_calls.2,
        item_table_calls: fixture_calls.3,
    }
}

pub(crate) fn order_rule() -> ShardingRule {
    order_fixture(ShardingProps::default()).rule
}
