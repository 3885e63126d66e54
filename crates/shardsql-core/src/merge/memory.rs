use crate::{
    error::InternalError,
    merge::{MergeError, MergedResult, MergedResultKind, QueryResult, ResultMetadata},
    value::Value,
};
use std::{cell::Cell, rc::Rc};

///
/// MemoryQueryResult
///
/// Vector-backed query result. Useful wherever rows are already in memory
/// (tests, cached shard answers). Can be told to fail when fetching a given
/// row or reading a given cell, and counts `close` calls through a shared
/// counter.
///

#[derive(Debug)]
pub struct MemoryQueryResult {
    metadata: ResultMetadata,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    fail_at: Option<usize>,
    fail_value_at: Option<(usize, usize)>,
    closes: Rc<Cell<usize>>,
}

impl MemoryQueryResult {
    #[must_use]
    pub fn new(metadata: ResultMetadata, rows: Vec<Vec<Value>>) -> Self {
        Self {
            metadata,
            rows,
            position: None,
            fail_at: None,
            fail_value_at: None,
            closes: Rc::new(Cell::new(0)),
        }
    }

    /// Case-sensitive columns labelled `labels`.
    #[must_use]
    pub fn with_labels<I, S>(labels: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ResultMetadata::with_labels(labels), rows)
    }

    /// Fail when advancing onto the 0-based row `row`.
    #[must_use]
    pub const fn failing_at(mut self, row: usize) -> Self {
        self.fail_at = Some(row);
        self
    }

    /// Fail reading the 1-based `column` of the 0-based row `row`.
    #[must_use]
    pub const fn failing_value_at(mut self, row: usize, column: usize) -> Self {
        self.fail_value_at = Some((row, column));
        self
    }

    /// Shared count of `close` calls, readable after the cursor moved away.
    #[must_use]
    pub fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }
}

impl QueryResult for MemoryQueryResult {
    fn next(&mut self) -> Result<bool, InternalError> {
        let next = self.position.map_or(0, |position| position + 1);
        if self.fail_at == Some(next) {
            return Err(InternalError::cursor_read(format!(
                "failed fetching row {next}"
            )));
        }

        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value(&self, column: usize) -> Result<Value, InternalError> {
        let row = self
            .position
            .and_then(|position| self.rows.get(position))
            .ok_or_else(|| InternalError::cursor_read("cursor is not positioned on a row"))?;
        if self.fail_value_at == self.position.map(|position| (position, column)) {
            return Err(InternalError::cursor_read(format!(
                "failed reading column {column}"
            )));
        }

        column
            .checked_sub(1)
            .and_then(|index| row.get(index))
            .cloned()
            .ok_or_else(|| InternalError::cursor_column(column, row.len()))
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

///
/// MemoryMergedResult
///
/// Fully materialized merged rows. Backs the memory group-by merge and the
/// DAL merges that rewrite rows.
///

#[derive(Debug)]
pub struct MemoryMergedResult {
    kind: MergedResultKind,
    metadata: ResultMetadata,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    closed: bool,
}

impl MemoryMergedResult {
    #[must_use]
    pub const fn new(metadata: ResultMetadata, rows: Vec<Vec<Value>>) -> Self {
        Self::with_kind(MergedResultKind::Memory, metadata, rows)
    }

    pub(crate) const fn with_kind(
        kind: MergedResultKind,
        metadata: ResultMetadata,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        Self {
            kind,
            metadata,
            rows,
            position: None,
            closed: false,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl MergedResult for MemoryMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.closed {
            return Ok(false);
        }

        let next = self.position.map_or(0, |position| position + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }
        self.metadata.check_column(column)?;

        self.position
            .and_then(|position| self.rows.get(position))
            .and_then(|row| row.get(column - 1))
            .cloned()
            .ok_or(MergeError::NoCurrentRow)
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }

    fn kind(&self) -> MergedResultKind {
        self.kind
    }
}
