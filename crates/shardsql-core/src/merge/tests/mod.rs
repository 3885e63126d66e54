mod engine;
mod pagination;
mod properties;

use crate::{
    merge::{ExecutionResult, MemoryQueryResult, MergeEngine, MergedResult},
    route::{RoutingResult, RoutingUnit, TableUnit},
    statement::StatementContext,
    test_support::order_rule,
    value::Value,
};

/// Shard cursor over integer rows.
fn ints(labels: &[&str], rows: &[&[i64]]) -> MemoryQueryResult {
    let rows = rows
        .iter()
        .map(|row| row.iter().copied().map(Value::Int).collect())
        .collect();

    MemoryQueryResult::with_labels(labels.iter().copied(), rows)
}

/// One table unit per result, `ds_i.t_order_i`.
fn routing(units: usize) -> RoutingResult {
    (0..units)
        .map(|i| {
            let ds = format!("ds_{i}");
            TableUnit::new(
                ds.clone(),
                vec![RoutingUnit::new(ds, "t_order", format!("t_order_{i}"))],
            )
        })
        .collect()
}

fn merged(ctx: &StatementContext, shards: Vec<MemoryQueryResult>) -> Box<dyn MergedResult> {
    let routing = routing(shards.len());
    let results = shards.into_iter().map(ExecutionResult::query).collect();

    MergeEngine::new(&order_rule())
        .merge(ctx, &routing, results)
        .expect("merge")
        .into_rows()
        .expect("merged rows")
}

/// Read every remaining row.
fn drain(result: &mut dyn MergedResult) -> Vec<Vec<Value>> {
    let columns = result.metadata().column_count();
    let mut rows = Vec::new();
    while result.next().expect("next") {
        rows.push(
            (1..=columns)
                .map(|column| result.value(column).expect("value"))
                .collect(),
        );
    }

    rows
}

fn int_rows(rows: &[&[i64]]) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| row.iter().copied().map(Value::Int).collect())
        .collect()
}
