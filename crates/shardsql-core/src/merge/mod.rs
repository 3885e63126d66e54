//! Module: merge
//! Responsibility: fold the per-unit results of one routed statement into a
//! single logical result, streaming wherever the statement shape allows.
//! Does not own: statement execution, retries, or result rewriting upstream.
//! Boundary: results arrive aligned to the routing result's table units and
//! every wrapped cursor is closed exactly once.

mod cursor;
mod dal;
mod error;
mod group_by;
mod memory;
mod order_by;
mod pagination;
mod result;
mod stream;

#[cfg(test)]
mod tests;

use crate::{
    error::InternalError,
    obs::sink::{self, MetricsEvent},
    route::RoutingResult,
    rule::ShardingRule,
    statement::{StatementContext, StatementKind},
};
use cursor::{UnitCursor, close_all};

// re-exports
pub use error::MergeError;
pub use group_by::GroupByStreamMergedResult;
pub use memory::{MemoryMergedResult, MemoryQueryResult};
pub use order_by::OrderByStreamMergedResult;
pub use pagination::PaginationMergedResult;
pub use result::{
    ColumnMetadata, ExecutionResult, MergedOutcome, MergedResult, MergedResultKind, QueryResult,
    ResultMetadata,
};
pub use stream::IteratorStreamMergedResult;

///
/// MergeEngine
///
/// Picks the merge for a statement shape: DQL statements get the streaming
/// pipeline, DAL statements their introspection merge, everything else a
/// transparent merge of update counts or rows.
///

#[derive(Clone, Copy, Debug)]
pub struct MergeEngine<'a> {
    rule: &'a ShardingRule,
}

impl<'a> MergeEngine<'a> {
    #[must_use]
    pub const fn new(rule: &'a ShardingRule) -> Self {
        Self { rule }
    }

    /// Merge `results`, which must line up one-to-one with `routing`.
    pub fn merge(
        &self,
        ctx: &StatementContext,
        routing: &RoutingResult,
        mut results: Vec<ExecutionResult>,
    ) -> Result<MergedOutcome, MergeError> {
        if results.len() != routing.len() {
            for result in &mut results {
                result.close();
            }
            return Err(MergeError::UnitCountMismatch {
                expected: routing.len(),
                actual: results.len(),
            });
        }

        let inputs = results.len() as u64;
        let outcome = match ctx.kind() {
            StatementKind::Select => merge_dql(ctx, results).map(MergedOutcome::Rows),
            StatementKind::Dal(kind) => {
                let (cursors, metadata) = into_cursors(results)?;
                dal::merge_dal(kind, cursors, metadata, self.rule).map(MergedOutcome::Rows)
            }
            StatementKind::Insert
            | StatementKind::Update
            | StatementKind::Delete
            | StatementKind::Ddl
            | StatementKind::Tcl => merge_transparent(results),
        }?;

        if let MergedOutcome::Rows(rows) = &outcome {
            sink::record(MetricsEvent::MergeBuilt {
                kind: rows.kind(),
                inputs,
            });
            tracing::debug!(
                statement = ?ctx.kind(),
                merge = rows.kind().as_str(),
                inputs,
                "built merged result"
            );
        }

        Ok(outcome)
    }
}

/// Merge one statement's results against `rule`.
pub fn merge(
    ctx: &StatementContext,
    routing: &RoutingResult,
    results: Vec<ExecutionResult>,
    rule: &ShardingRule,
) -> Result<MergedOutcome, MergeError> {
    MergeEngine::new(rule).merge(ctx, routing, results)
}

// Wrap query results into unit cursors; update counts are a misaligned
// statement and close everything.
fn into_cursors(
    results: Vec<ExecutionResult>,
) -> Result<(Vec<UnitCursor>, ResultMetadata), MergeError> {
    let mut cursors = Vec::with_capacity(results.len());
    let mut stray = Vec::new();
    for (unit, result) in results.into_iter().enumerate() {
        match result {
            ExecutionResult::Query(inner) => cursors.push(UnitCursor::new(unit, inner)),
            ExecutionResult::Update(_) => stray.push(unit),
        }
    }

    if let Some(unit) = stray.first() {
        close_all(&mut cursors);
        return Err(MergeError::Internal(InternalError::merge_invariant(
            format!("table unit #{unit} returned an update count for a row-returning statement"),
        )));
    }

    let metadata = cursors
        .first()
        .map(|cursor| cursor.metadata().clone())
        .unwrap_or_default();

    Ok((cursors, metadata))
}

fn merge_dql(
    ctx: &StatementContext,
    results: Vec<ExecutionResult>,
) -> Result<Box<dyn MergedResult>, MergeError> {
    let (mut cursors, metadata) = into_cursors(results)?;

    if cursors.len() <= 1 {
        return Ok(Box::new(IteratorStreamMergedResult::new(cursors, metadata)));
    }

    let merged: Box<dyn MergedResult> = if ctx.has_group_by_or_aggregation() {
        if ctx.is_group_by_stream_ordered() {
            Box::new(GroupByStreamMergedResult::new(
                cursors,
                metadata,
                ctx.group_by(),
                ctx.aggregations(),
            )?)
        } else {
            Box::new(group_by::group_by_memory(cursors, metadata, ctx)?)
        }
    } else if !ctx.order_by().is_empty() {
        Box::new(OrderByStreamMergedResult::new(
            cursors,
            metadata,
            ctx.order_by(),
        )?)
    } else {
        Box::new(IteratorStreamMergedResult::new(cursors, metadata))
    };

    Ok(match ctx.pagination() {
        Some(pagination) => Box::new(PaginationMergedResult::new(merged, pagination)),
        None => merged,
    })
}

fn merge_transparent(mut results: Vec<ExecutionResult>) -> Result<MergedOutcome, MergeError> {
    if results
        .iter()
        .all(|result| matches!(result, ExecutionResult::Update(_)))
    {
        let total = results
            .iter()
            .map(|result| match result {
                ExecutionResult::Update(count) => *count,
                ExecutionResult::Query(_) => 0,
            })
            .fold(0_u64, u64::saturating_add);

        return Ok(MergedOutcome::UpdateCount(total));
    }

    if results
        .iter()
        .any(|result| matches!(result, ExecutionResult::Update(_)))
    {
        for result in &mut results {
            result.close();
        }
        return Err(MergeError::Internal(InternalError::merge_invariant(
            "table units returned a mix of update counts and rows",
        )));
    }

    let (cursors, metadata) = into_cursors(results)?;
    Ok(MergedOutcome::Rows(Box::new(
        IteratorStreamMergedResult::new(cursors, metadata),
    )))
}
