mod cartesian;
mod select;
mod standard;

use crate::{
    route::{RoutingResult, ShardingConditionValue, ShardingConditions},
    statement::StatementContext,
};

/// Render every table unit, in routing order.
fn rendered(result: &RoutingResult) -> Vec<String> {
    result.iter().map(ToString::to_string).collect()
}

fn select_where<const N: usize>(
    tables: [&str; N],
    values: impl IntoIterator<Item = ShardingConditionValue>,
) -> StatementContext {
    StatementContext::select(tables).with_conditions(ShardingConditions::single(values))
}

fn eq(table: &str, column: &str, value: i64) -> ShardingConditionValue {
    ShardingConditionValue::equal(table, column, value)
}
