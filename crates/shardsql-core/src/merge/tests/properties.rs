use super::{drain, merged};
use crate::{
    merge::MemoryQueryResult,
    statement::{OrderByItem, StatementContext},
    value::Value,
};
use proptest::prelude::*;

fn shard(values: &[Option<i64>]) -> MemoryQueryResult {
    MemoryQueryResult::with_labels(["v"], values.iter().map(|v| vec![Value::from(*v)]).collect())
}

fn column(rows: Vec<Vec<Value>>) -> Vec<Option<i64>> {
    rows.into_iter()
        .map(|row| row.first().and_then(Value::as_i64))
        .collect()
}

// Each shard pre-sorted ascending with NULLs first, matching `Option`'s order.
fn arb_sorted_shards() -> impl Strategy<Value = Vec<Vec<Option<i64>>>> {
    prop::collection::vec(
        prop::collection::vec(prop::option::weighted(0.9, -50_i64..50), 0..8).prop_map(
            |mut values| {
                values.sort_unstable();
                values
            },
        ),
        2..5,
    )
}

fn arb_shards() -> impl Strategy<Value = Vec<Vec<Option<i64>>>> {
    prop::collection::vec(prop::collection::vec(prop::option::of(0_i64..100), 0..6), 2..5)
}

proptest! {
    #[test]
    fn order_by_merge_equals_sorting_the_concatenation(shards in arb_sorted_shards()) {
        let ctx = StatementContext::select(["t_order"]).with_order_by([OrderByItem::asc(1)]);
        let inputs = shards.iter().map(|values| shard(values)).collect();
        let mut result = merged(&ctx, inputs);

        let mut expected: Vec<Option<i64>> = shards.into_iter().flatten().collect();
        expected.sort_unstable();

        prop_assert_eq!(column(drain(result.as_mut())), expected);
    }

    #[test]
    fn pagination_yields_the_offset_window(
        shards in arb_shards(),
        offset in 0_u64..12,
        row_count in prop::option::of(0_u64..12),
    ) {
        let ctx = StatementContext::select(["t_order"]).with_pagination(offset, row_count);
        let inputs = shards.iter().map(|values| shard(values)).collect();
        let mut result = merged(&ctx, inputs);

        let all: Vec<Option<i64>> = shards.into_iter().flatten().collect();
        let take = row_count.map_or(usize::MAX, |count| count as usize);
        let expected: Vec<Option<i64>> =
            all.into_iter().skip(offset as usize).take(take).collect();

        prop_assert_eq!(column(drain(result.as_mut())), expected);
    }
}
