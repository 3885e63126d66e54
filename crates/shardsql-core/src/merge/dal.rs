use crate::{
    merge::{
        IteratorStreamMergedResult, MemoryMergedResult, MergeError, MergedResult, ResultMetadata,
        cursor::{UnitCursor, close_all, drain_all},
    },
    rule::ShardingRule,
    statement::DalKind,
    value::Value,
};
use std::collections::BTreeSet;

/// Merge administrative statement results.
pub(crate) fn merge_dal(
    kind: DalKind,
    mut cursors: Vec<UnitCursor>,
    metadata: ResultMetadata,
    rule: &ShardingRule,
) -> Result<Box<dyn MergedResult>, MergeError> {
    match kind {
        DalKind::ShowDatabases => {
            close_all(&mut cursors);
            let database = Value::Text(rule.props().logic_database_name.clone());

            Ok(Box::new(MemoryMergedResult::new(
                ResultMetadata::with_labels(["Database"]),
                vec![vec![database]],
            )))
        }
        DalKind::ShowTables => Ok(Box::new(show_tables(cursors, metadata, rule)?)),
        DalKind::ShowCreateTable | DalKind::Set | DalKind::Other => {
            if cursors.len() > 1 {
                close_all(&mut cursors[1..]);
                cursors.truncate(1);
            }

            Ok(Box::new(IteratorStreamMergedResult::new(cursors, metadata)))
        }
    }
}

// Actual table names in the first column are mapped back to their logical
// table; names no rule owns pass through. First occurrence wins.
fn show_tables(
    mut cursors: Vec<UnitCursor>,
    metadata: ResultMetadata,
    rule: &ShardingRule,
) -> Result<MemoryMergedResult, MergeError> {
    metadata.check_column(1).inspect_err(|_| close_all(&mut cursors))?;
    let rows = drain_all(&mut cursors)?;

    let mut seen = BTreeSet::new();
    let mut tables = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(Value::Text(name)) = row.first_mut()
            && let Some(logic) = rule.logic_table_for_actual(name)
        {
            *name = logic.to_string();
        }

        let key = row.first().cloned().unwrap_or(Value::Null);
        if seen.insert(key.to_string()) {
            tables.push(row);
        }
    }

    Ok(MemoryMergedResult::new(metadata, tables))
}
