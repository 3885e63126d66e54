//! Cross-shard GROUP BY and aggregate recombination.
//!
//! Shards return partial aggregates per group. COUNT and SUM partials are
//! added, MIN/MAX reduced again, and AVG rebuilt from the derived COUNT
//! and SUM columns. Non-aggregate columns keep the group's first row.

use crate::{
    error::InternalError,
    merge::{
        MemoryMergedResult, MergeError, MergedResult, MergedResultKind, ResultMetadata,
        cursor::{UnitCursor, close_all, drain_all},
        order_by::{OrderByStreamMergedResult, RowComparator},
    },
    statement::{AggregationKind, AggregationProjection, OrderByItem, StatementContext},
    value::{TextMode, Value, add_numeric, average, compare_values},
};
use std::cmp::Ordering;

///
/// AggregationPlan
///

#[derive(Clone, Debug)]
struct AggregationPlan {
    aggregations: Vec<AggregationProjection>,
    // Columns folded by addition, with the aggregate that owns them.
    summed: Vec<(usize, AggregationKind)>,
    modes: Vec<TextMode>,
}

impl AggregationPlan {
    fn new(
        aggregations: &[AggregationProjection],
        metadata: &ResultMetadata,
    ) -> Result<Self, MergeError> {
        let mut summed: Vec<(usize, AggregationKind)> = Vec::new();
        let mut add = |column: usize, kind: AggregationKind| {
            if !summed.iter().any(|(c, _)| *c == column) {
                summed.push((column, kind));
            }
        };

        for aggregation in aggregations {
            metadata.check_column(aggregation.index)?;
            match aggregation.kind {
                AggregationKind::Count | AggregationKind::Sum => {
                    add(aggregation.index, aggregation.kind);
                }
                AggregationKind::Avg => {
                    let derived = aggregation.avg.ok_or_else(|| {
                        MergeError::Internal(InternalError::merge_unsupported(format!(
                            "AVG on column {} has no derived COUNT/SUM columns",
                            aggregation.index
                        )))
                    })?;
                    metadata.check_column(derived.count_index)?;
                    metadata.check_column(derived.sum_index)?;
                    add(derived.count_index, AggregationKind::Count);
                    add(derived.sum_index, AggregationKind::Sum);
                }
                AggregationKind::Min | AggregationKind::Max => {}
            }
        }

        let modes = (1..=metadata.column_count())
            .map(|column| TextMode::from_case_sensitive(metadata.is_case_sensitive(column)))
            .collect();

        Ok(Self {
            aggregations: aggregations.to_vec(),
            summed,
            modes,
        })
    }

    /// Fold one more row of the same group into `acc`.
    fn fold(&self, acc: &mut [Value], row: &[Value]) -> Result<(), MergeError> {
        for &(column, kind) in &self.summed {
            let (Some(total), Some(partial)) = (acc.get(column - 1), row.get(column - 1)) else {
                continue;
            };
            let sum = add_numeric(total, partial).map_err(|source| {
                MergeError::UnsupportedAggregation {
                    kind,
                    column,
                    source,
                }
            })?;
            acc[column - 1] = sum;
        }

        for aggregation in &self.aggregations {
            let keep = match aggregation.kind {
                AggregationKind::Min => Ordering::Less,
                AggregationKind::Max => Ordering::Greater,
                _ => continue,
            };
            let index = aggregation.index - 1;
            let (Some(current), Some(candidate)) = (acc.get(index), row.get(index)) else {
                continue;
            };
            if candidate.is_null() {
                continue;
            }

            let mode = self.modes.get(index).copied().unwrap_or_default();
            if current.is_null() || compare_values(candidate, current, mode) == keep {
                acc[index] = candidate.clone();
            }
        }

        Ok(())
    }

    /// Rebuild AVG columns from the folded COUNT/SUM partials.
    fn finish(&self, acc: &mut [Value]) -> Result<(), MergeError> {
        for aggregation in &self.aggregations {
            let Some(derived) = aggregation.avg else {
                continue;
            };
            let (Some(count), Some(sum)) = (
                acc.get(derived.count_index - 1),
                acc.get(derived.sum_index - 1),
            ) else {
                continue;
            };

            let avg = average(sum, count).map_err(|source| MergeError::UnsupportedAggregation {
                kind: AggregationKind::Avg,
                column: aggregation.index,
                source,
            })?;
            if let Some(slot) = acc.get_mut(aggregation.index - 1) {
                *slot = avg;
            }
        }

        Ok(())
    }

    /// The single row an aggregate-only query yields over no input rows.
    fn empty_row(&self, column_count: usize) -> Vec<Value> {
        let mut row = vec![Value::Null; column_count];
        for &(column, kind) in &self.summed {
            if kind == AggregationKind::Count
                && let Some(slot) = row.get_mut(column - 1)
            {
                *slot = Value::Int(0);
            }
        }

        row
    }
}

///
/// GroupByStreamMergedResult
///
/// Folds consecutive rows sharing a group key out of an order-by merge
/// keyed on the GROUP BY items. Holds one group's accumulator at a time.
///

pub struct GroupByStreamMergedResult {
    inner: OrderByStreamMergedResult,
    metadata: ResultMetadata,
    keys: RowComparator,
    plan: AggregationPlan,
    current_row: Option<Vec<Value>>,
    pending: bool,
    closed: bool,
}

impl GroupByStreamMergedResult {
    pub(crate) fn new(
        mut cursors: Vec<UnitCursor>,
        metadata: ResultMetadata,
        group_by: &[OrderByItem],
        aggregations: &[AggregationProjection],
    ) -> Result<Self, MergeError> {
        let prepared = AggregationPlan::new(aggregations, &metadata).and_then(|plan| {
            RowComparator::new(group_by, &metadata).map(|keys| (plan, keys))
        });
        let (plan, keys) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                close_all(&mut cursors);
                return Err(err);
            }
        };

        let mut inner = OrderByStreamMergedResult::new(cursors, metadata.clone(), group_by)?;
        let pending = inner.next()?;

        Ok(Self {
            inner,
            metadata,
            keys,
            plan,
            current_row: None,
            pending,
            closed: false,
        })
    }

    fn inner_row(&self) -> Result<Vec<Value>, MergeError> {
        (1..=self.metadata.column_count())
            .map(|column| self.inner.value(column))
            .collect()
    }

    fn next_group(&mut self) -> Result<bool, MergeError> {
        self.current_row = None;
        if !self.pending {
            return Ok(false);
        }

        let mut acc = self.inner_row()?;
        let key = self.keys.key_of(&acc);
        loop {
            self.pending = self.inner.next()?;
            if !self.pending {
                break;
            }

            let row = self.inner_row()?;
            if self.keys.compare(&key, &self.keys.key_of(&row)) != Ordering::Equal {
                break;
            }
            self.plan.fold(&mut acc, &row)?;
        }
        self.plan.finish(&mut acc)?;

        self.current_row = Some(acc);
        Ok(true)
    }
}

impl MergedResult for GroupByStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.closed {
            return Ok(false);
        }

        let result = self.next_group();
        if result.is_err() {
            self.close();
        }

        result
    }

    fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }
        self.metadata.check_column(column)?;

        self.current_row
            .as_ref()
            .and_then(|row| row.get(column - 1))
            .cloned()
            .ok_or(MergeError::NoCurrentRow)
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn close(&mut self) {
        if !self.closed {
            self.inner.close();
            self.current_row = None;
            self.pending = false;
            self.closed = true;
        }
    }

    fn kind(&self) -> MergedResultKind {
        MergedResultKind::GroupByStream
    }

    fn inner(&self) -> Option<&dyn MergedResult> {
        Some(&self.inner)
    }
}

/// Materialize every row, aggregate per group, then sort groups by the
/// statement's output order. Aggregation without GROUP BY yields exactly
/// one row.
pub(crate) fn group_by_memory(
    mut cursors: Vec<UnitCursor>,
    metadata: ResultMetadata,
    ctx: &StatementContext,
) -> Result<MemoryMergedResult, MergeError> {
    let prepared = AggregationPlan::new(ctx.aggregations(), &metadata).and_then(|plan| {
        let keys = RowComparator::new(ctx.group_by(), &metadata)?;
        let order = RowComparator::new(ctx.output_order(), &metadata)?;
        Ok((plan, keys, order))
    });
    let (plan, keys, order) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            close_all(&mut cursors);
            return Err(err);
        }
    };

    let rows = drain_all(&mut cursors)?;
    drop(cursors);

    let mut groups = if ctx.group_by().is_empty() {
        vec![fold_all(&plan, rows).unwrap_or_else(|| Ok(plan.empty_row(metadata.column_count())))?]
    } else {
        fold_groups(&plan, &keys, rows)?
    };

    for group in &mut groups {
        plan.finish(group)?;
    }
    if !ctx.output_order().is_empty() {
        groups.sort_by(|left, right| order.compare(&order.key_of(left), &order.key_of(right)));
    }

    Ok(MemoryMergedResult::with_kind(
        MergedResultKind::GroupByMemory,
        metadata,
        groups,
    ))
}

// Whole input as one group; `None` when there are no rows.
fn fold_all(
    plan: &AggregationPlan,
    rows: Vec<Vec<Value>>,
) -> Option<Result<Vec<Value>, MergeError>> {
    let mut rows = rows.into_iter();
    let mut acc = rows.next()?;
    for row in rows {
        if let Err(err) = plan.fold(&mut acc, &row) {
            return Some(Err(err));
        }
    }

    Some(Ok(acc))
}

// Stable sort by group key keeps each group's first row in routing order.
fn fold_groups(
    plan: &AggregationPlan,
    keys: &RowComparator,
    rows: Vec<Vec<Value>>,
) -> Result<Vec<Vec<Value>>, MergeError> {
    let mut keyed: Vec<(Vec<Value>, Vec<Value>)> =
        rows.into_iter().map(|row| (keys.key_of(&row), row)).collect();
    keyed.sort_by(|(left, _), (right, _)| keys.compare(left, right));

    let mut groups: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
    for (key, row) in keyed {
        match groups.last_mut() {
            Some((group_key, acc)) if keys.compare(group_key, &key) == Ordering::Equal => {
                plan.fold(acc, &row)?;
            }
            _ => groups.push((key, row)),
        }
    }

    Ok(groups.into_iter().map(|(_, acc)| acc).collect())
}
