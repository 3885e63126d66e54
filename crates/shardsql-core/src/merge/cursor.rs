use crate::{
    error::InternalError,
    merge::{MergeError, QueryResult, ResultMetadata},
    obs::sink::{self, MetricsEvent},
    value::Value,
};
use std::cell::Cell;

///
/// UnitCursor
///
/// One table unit's query result as seen by the merge pipeline. Tags read
/// failures with the unit position, counts rows, and closes the wrapped
/// cursor exactly once (on drop at the latest). A failed cell read poisons
/// the cursor: its next advance closes it and fails.
///

pub(crate) struct UnitCursor {
    unit: usize,
    inner: Box<dyn QueryResult>,
    rows_read: u64,
    poisoned: Cell<bool>,
    closed: bool,
}

impl UnitCursor {
    pub(crate) fn new(unit: usize, inner: Box<dyn QueryResult>) -> Self {
        Self {
            unit,
            inner,
            rows_read: 0,
            poisoned: Cell::new(false),
            closed: false,
        }
    }

    pub(crate) const fn unit(&self) -> usize {
        self.unit
    }

    pub(crate) fn metadata(&self) -> &ResultMetadata {
        self.inner.metadata()
    }

    pub(crate) fn next(&mut self) -> Result<bool, MergeError> {
        if self.closed {
            return Ok(false);
        }
        if self.poisoned.get() {
            self.close();
            return Err(MergeError::Read {
                unit: self.unit,
                source: InternalError::cursor_read("previous row had an unreadable cell"),
            });
        }

        match self.inner.next() {
            Ok(true) => {
                self.rows_read += 1;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(source) => Err(self.read_failed(source)),
        }
    }

    pub(crate) fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }

        self.inner.value(column).map_err(|source| {
            self.poisoned.set(true);
            self.read_failed(source)
        })
    }

    /// Every cell of the current row.
    pub(crate) fn row(&self) -> Result<Vec<Value>, MergeError> {
        (1..=self.metadata().column_count())
            .map(|column| self.value(column))
            .collect()
    }

    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }

        self.inner.close();
        self.closed = true;
        sink::record(MetricsEvent::CursorClosed {
            rows_read: self.rows_read,
        });
    }

    fn read_failed(&self, source: InternalError) -> MergeError {
        tracing::warn!(
            unit = self.unit,
            rows_read = self.rows_read,
            error = %source,
            "table unit cursor failed during merge"
        );
        sink::record(MetricsEvent::MergeReadFailed { unit: self.unit });

        MergeError::Read {
            unit: self.unit,
            source,
        }
    }
}

impl Drop for UnitCursor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Close every cursor; used before surfacing a merge error.
pub(crate) fn close_all(cursors: &mut [UnitCursor]) {
    for cursor in cursors {
        cursor.close();
    }
}

/// Read every remaining row of every cursor in order, closing each once
/// drained. On failure all cursors are closed before the error returns.
pub(crate) fn drain_all(cursors: &mut [UnitCursor]) -> Result<Vec<Vec<Value>>, MergeError> {
    let mut rows = Vec::new();
    for index in 0..cursors.len() {
        loop {
            let cursor = &mut cursors[index];
            match cursor.next().and_then(|more| more.then(|| cursor.row()).transpose()) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    cursor.close();
                    break;
                }
                Err(err) => {
                    close_all(cursors);
                    return Err(err);
                }
            }
        }
    }

    Ok(rows)
}
