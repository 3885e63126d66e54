use super::{drain, int_rows, ints, routing};
use crate::{
    error::ErrorClass,
    merge::{ExecutionResult, MemoryQueryResult, MergeEngine, MergeError, MergedResultKind},
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    statement::{OrderByItem, StatementContext, StatementKind},
    test_support::order_rule,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn update(kind: StatementKind) -> StatementContext {
    StatementContext::new(kind, ["t_order"])
}

#[test]
fn misaligned_results_are_rejected_and_closed() {
    let shard = ints(&["id"], &[&[1]]);
    let closes = shard.close_counter();
    let rule = order_rule();

    let err = MergeEngine::new(&rule)
        .merge(
            &StatementContext::select(["t_order"]),
            &routing(2),
            vec![ExecutionResult::query(shard)],
        )
        .expect_err("one result for two units");

    assert!(matches!(
        err,
        MergeError::UnitCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert_eq!(err.class(), ErrorClass::InvariantViolation);
    assert_eq!(closes.get(), 1);
}

#[test]
fn update_counts_are_summed() {
    let rule = order_rule();
    let outcome = MergeEngine::new(&rule)
        .merge(
            &update(StatementKind::Update),
            &routing(3),
            vec![
                ExecutionResult::Update(3),
                ExecutionResult::Update(4),
                ExecutionResult::Update(0),
            ],
        )
        .expect("merge");

    assert_eq!(outcome.update_count(), Some(7));
}

#[test]
fn ignored_statement_merges_to_zero_updates() {
    let rule = order_rule();
    let outcome = MergeEngine::new(&rule)
        .merge(&update(StatementKind::Ddl), &routing(0), Vec::new())
        .expect("merge");

    assert_eq!(outcome.update_count(), Some(0));
}

#[test]
fn transparent_rows_are_concatenated_without_reordering() {
    let rule = order_rule();
    let outcome = MergeEngine::new(&rule)
        .merge(
            &update(StatementKind::Insert),
            &routing(2),
            vec![
                ExecutionResult::query(ints(&["id"], &[&[9]])),
                ExecutionResult::query(ints(&["id"], &[&[1]])),
            ],
        )
        .expect("merge");

    let mut rows = outcome.into_rows().expect("rows");
    assert_eq!(drain(rows.as_mut()), int_rows(&[&[9], &[1]]));
}

#[test]
fn mixed_transparent_results_are_rejected() {
    let shard = ints(&["id"], &[&[1]]);
    let closes = shard.close_counter();
    let rule = order_rule();

    let err = MergeEngine::new(&rule)
        .merge(
            &update(StatementKind::Delete),
            &routing(2),
            vec![ExecutionResult::query(shard), ExecutionResult::Update(1)],
        )
        .expect_err("mixed");

    assert!(matches!(err, MergeError::Internal(_)));
    assert_eq!(closes.get(), 1);
}

#[test]
fn query_statement_rejects_update_counts() {
    let shard = ints(&["id"], &[&[1]]);
    let closes = shard.close_counter();
    let rule = order_rule();

    let err = MergeEngine::new(&rule)
        .merge(
            &StatementContext::select(["t_order"]),
            &routing(2),
            vec![ExecutionResult::query(shard), ExecutionResult::Update(1)],
        )
        .expect_err("update count for a SELECT");

    assert_eq!(err.class(), ErrorClass::InvariantViolation);
    assert_eq!(closes.get(), 1);
}

#[test]
fn read_error_closes_every_cursor_exactly_once() {
    let healthy = ints(&["id"], &[&[1], &[2]]);
    let failing = ints(&["id"], &[&[3]]).failing_at(0);
    let untouched = ints(&["id"], &[&[4]]);
    let closes = [
        healthy.close_counter(),
        failing.close_counter(),
        untouched.close_counter(),
    ];
    let rule = order_rule();

    let mut result = MergeEngine::new(&rule)
        .merge(
            &StatementContext::select(["t_order"]),
            &routing(3),
            vec![
                ExecutionResult::query(healthy),
                ExecutionResult::query(failing),
                ExecutionResult::query(untouched),
            ],
        )
        .expect("merge")
        .into_rows()
        .expect("rows");

    assert!(result.next().expect("row 1"));
    assert!(result.next().expect("row 2"));
    let err = result.next().expect_err("unit 1 fails");
    assert_eq!(err.failed_unit(), Some(1));

    result.close();
    drop(result);
    for (unit, closes) in closes.iter().enumerate() {
        assert_eq!(closes.get(), 1, "unit {unit} closed exactly once");
    }
}

#[test]
fn merge_construction_is_reported_to_the_sink() {
    let sink = Rc::new(CaptureSink::default());
    let rule = order_rule();

    with_metrics_sink(sink.clone(), || {
        let ctx = StatementContext::select(["t_order"])
            .with_order_by([OrderByItem::asc(1)])
            .with_pagination(0, Some(1));
        let mut result = MergeEngine::new(&rule)
            .merge(
                &ctx,
                &routing(2),
                vec![
                    ExecutionResult::query(ints(&["id"], &[&[1]])),
                    ExecutionResult::query(ints(&["id"], &[&[2]])),
                ],
            )
            .expect("merge")
            .into_rows()
            .expect("rows");
        drain(result.as_mut());
    });

    let events = sink.events.borrow();
    assert!(events.contains(&MetricsEvent::MergeBuilt {
        kind: MergedResultKind::Pagination,
        inputs: 2,
    }));
    let closed = events
        .iter()
        .filter(|event| matches!(event, MetricsEvent::CursorClosed { .. }))
        .count();
    assert_eq!(closed, 2);
}

#[test]
fn memory_query_result_counts_every_close() {
    use crate::merge::QueryResult;

    let mut shard = MemoryQueryResult::with_labels(["id"], Vec::new());
    let closes = shard.close_counter();
    shard.close();
    shard.close();

    assert_eq!(closes.get(), 2, "raw cursors do not deduplicate closes");
}
