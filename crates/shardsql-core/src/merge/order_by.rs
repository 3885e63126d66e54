use crate::{
    merge::{
        MergeError, MergedResult, MergedResultKind, ResultMetadata,
        cursor::{UnitCursor, close_all},
    },
    statement::{NullsOrder, OrderByItem, OrderDirection},
    value::{TextMode, Value, compare_values},
};
use std::{cmp::Ordering, collections::BinaryHeap, rc::Rc};

///
/// RowComparator
///
/// Orders rows by a list of order-by items, left to right. NULL placement
/// follows each item's `nulls` setting regardless of direction.
///

#[derive(Clone, Debug)]
pub(crate) struct RowComparator {
    items: Vec<OrderByItem>,
    modes: Vec<TextMode>,
}

impl RowComparator {
    pub(crate) fn new(items: &[OrderByItem], metadata: &ResultMetadata) -> Result<Self, MergeError> {
        for item in items {
            metadata.check_column(item.index)?;
        }
        let modes = items
            .iter()
            .map(|item| TextMode::from_case_sensitive(metadata.is_case_sensitive(item.index)))
            .collect();

        Ok(Self {
            items: items.to_vec(),
            modes,
        })
    }

    /// Sort key of a full row.
    pub(crate) fn key_of(&self, row: &[Value]) -> Vec<Value> {
        self.items
            .iter()
            .map(|item| row.get(item.index - 1).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Sort key of the cursor's current row.
    fn key_of_cursor(&self, cursor: &UnitCursor) -> Result<Vec<Value>, MergeError> {
        self.items
            .iter()
            .map(|item| cursor.value(item.index))
            .collect()
    }

    /// Compare two sort keys produced by this comparator.
    pub(crate) fn compare(&self, left: &[Value], right: &[Value]) -> Ordering {
        for ((item, mode), (l, r)) in self
            .items
            .iter()
            .zip(&self.modes)
            .zip(left.iter().zip(right))
        {
            let ordering = match (l.is_null(), r.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => nulls_ordering(item.nulls),
                (false, true) => nulls_ordering(item.nulls).reverse(),
                (false, false) => {
                    let ordering = compare_values(l, r, *mode);
                    match item.direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

const fn nulls_ordering(nulls: NullsOrder) -> Ordering {
    match nulls {
        NullsOrder::First => Ordering::Less,
        NullsOrder::Last => Ordering::Greater,
    }
}

///
/// HeapEntry
///
/// A cursor's current sort key. `BinaryHeap` is a max-heap, so the ordering
/// is inverted to pop the smallest key; equal keys pop in unit order.
///

struct HeapEntry {
    position: usize,
    key: Vec<Value>,
    comparator: Rc<RowComparator>,
}

impl HeapEntry {
    fn ascending(&self, other: &Self) -> Ordering {
        self.comparator
            .compare(&self.key, &other.key)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.ascending(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.ascending(self)
    }
}

///
/// OrderByStreamMergedResult
///
/// K-way merge of unit cursors that each return rows already sorted by the
/// same order-by items. Holds one row per cursor; each `next` advances only
/// the cursor whose row was handed out last.
///

pub struct OrderByStreamMergedResult {
    cursors: Vec<UnitCursor>,
    metadata: ResultMetadata,
    comparator: Rc<RowComparator>,
    heap: BinaryHeap<HeapEntry>,
    current: Option<usize>,
    started: bool,
    closed: bool,
}

impl OrderByStreamMergedResult {
    /// Prime every cursor with its first row.
    pub(crate) fn new(
        cursors: Vec<UnitCursor>,
        metadata: ResultMetadata,
        items: &[OrderByItem],
    ) -> Result<Self, MergeError> {
        let comparator = match RowComparator::new(items, &metadata) {
            Ok(comparator) => Rc::new(comparator),
            Err(err) => {
                let mut cursors = cursors;
                close_all(&mut cursors);
                return Err(err);
            }
        };

        let mut merged = Self {
            heap: BinaryHeap::with_capacity(cursors.len()),
            cursors,
            metadata,
            comparator,
            current: None,
            started: false,
            closed: false,
        };
        for position in 0..merged.cursors.len() {
            merged.advance(position)?;
        }

        Ok(merged)
    }

    /// Unit index of the cursor holding the current row.
    #[must_use]
    pub fn current_unit(&self) -> Option<usize> {
        self.current
            .and_then(|position| self.cursors.get(position))
            .map(UnitCursor::unit)
    }

    // Move one cursor forward and queue its next row, or retire it.
    fn advance(&mut self, position: usize) -> Result<(), MergeError> {
        let Some(cursor) = self.cursors.get_mut(position) else {
            return Ok(());
        };

        let step = cursor.next().and_then(|more| {
            if more {
                self.comparator.key_of_cursor(cursor).map(Some)
            } else {
                Ok(None)
            }
        });

        match step {
            Ok(Some(key)) => {
                self.heap.push(HeapEntry {
                    position,
                    key,
                    comparator: Rc::clone(&self.comparator),
                });
                Ok(())
            }
            Ok(None) => {
                cursor.close();
                Ok(())
            }
            Err(err) => {
                self.close();
                Err(err)
            }
        }
    }
}

impl MergedResult for OrderByStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.closed {
            return Ok(false);
        }

        if self.started
            && let Some(position) = self.current.take()
        {
            self.advance(position)?;
        }
        self.started = true;

        match self.heap.pop() {
            Some(entry) => {
                self.current = Some(entry.position);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }
        self.metadata.check_column(column)?;

        self.current
            .and_then(|position| self.cursors.get(position))
            .ok_or(MergeError::NoCurrentRow)?
            .value(column)
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn close(&mut self) {
        if !self.closed {
            close_all(&mut self.cursors);
            self.heap.clear();
            self.current = None;
            self.closed = true;
        }
    }

    fn kind(&self) -> MergedResultKind {
        MergedResultKind::OrderBy
    }
}
