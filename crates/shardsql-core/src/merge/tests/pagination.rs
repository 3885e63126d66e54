use super::{drain, int_rows, ints, merged};
use crate::{
    merge::{MergeError, MergedResultKind},
    statement::{OrderByItem, StatementContext},
};

fn paged(offset: u64, row_count: Option<u64>) -> StatementContext {
    StatementContext::select(["t_order"]).with_pagination(offset, row_count)
}

#[test]
fn window_stops_before_reading_past_the_limit() {
    // Reading the fifth row would fail; the window must end before it.
    let first = ints(&["id"], &[&[1], &[2], &[3]]);
    let second = ints(&["id"], &[&[4], &[5]]).failing_at(1);
    let closes = [first.close_counter(), second.close_counter()];

    let mut result = merged(&paged(2, Some(2)), vec![first, second]);

    assert_eq!(result.kind(), MergedResultKind::Pagination);
    assert_eq!(drain(result.as_mut()), int_rows(&[&[3], &[4]]));
    assert_eq!(closes[0].get(), 1);
    assert_eq!(closes[1].get(), 1, "remaining cursor closed at the limit");
}

#[test]
fn window_applies_after_the_global_order() {
    let ctx = paged(2, Some(2)).with_order_by([OrderByItem::asc(1)]);
    let mut result = merged(
        &ctx,
        vec![
            ints(&["id"], &[&[1], &[3], &[5]]),
            ints(&["id"], &[&[2], &[4]]),
        ],
    );

    assert_eq!(
        result.inner().map(|inner| inner.kind()),
        Some(MergedResultKind::OrderBy)
    );
    assert_eq!(drain(result.as_mut()), int_rows(&[&[3], &[4]]));
}

#[test]
fn zero_row_count_reads_nothing() {
    let first = ints(&["id"], &[&[1]]).failing_at(0);
    let second = ints(&["id"], &[&[2]]).failing_at(0);

    let mut result = merged(&paged(0, Some(0)), vec![first, second]);

    assert!(!result.next().expect("empty window"));
    assert!(matches!(result.value(1), Err(MergeError::NoCurrentRow)));
}

#[test]
fn offset_beyond_the_end_is_empty() {
    let mut result = merged(
        &paged(10, Some(5)),
        vec![ints(&["id"], &[&[1], &[2]]), ints(&["id"], &[&[3]])],
    );

    assert!(drain(result.as_mut()).is_empty());
}

#[test]
fn offset_without_row_count_runs_to_the_end() {
    let mut result = merged(
        &paged(1, None),
        vec![ints(&["id"], &[&[1], &[2]]), ints(&["id"], &[&[3]])],
    );

    assert_eq!(drain(result.as_mut()), int_rows(&[&[2], &[3]]));
}

#[test]
fn close_is_idempotent() {
    let first = ints(&["id"], &[&[1], &[2]]);
    let second = ints(&["id"], &[&[3]]);
    let closes = [first.close_counter(), second.close_counter()];

    let mut result = merged(&paged(0, Some(1)), vec![first, second]);
    assert!(result.next().expect("first row"));

    result.close();
    result.close();

    assert_eq!(closes[0].get(), 1);
    assert_eq!(closes[1].get(), 1);
    assert!(matches!(result.value(1), Err(MergeError::Closed)));
    assert!(!result.next().expect("next after close"));
}
