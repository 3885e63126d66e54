use crate::{
    merge::{
        MergeError, MergedResult, MergedResultKind, ResultMetadata,
        cursor::{UnitCursor, close_all},
    },
    value::Value,
};

///
/// IteratorStreamMergedResult
///
/// Concatenates unit cursors in routing order. Each cursor is drained and
/// closed before the next one is touched.
///

pub struct IteratorStreamMergedResult {
    cursors: Vec<UnitCursor>,
    metadata: ResultMetadata,
    current: usize,
    on_row: bool,
    closed: bool,
}

impl IteratorStreamMergedResult {
    pub(crate) fn new(cursors: Vec<UnitCursor>, metadata: ResultMetadata) -> Self {
        Self {
            cursors,
            metadata,
            current: 0,
            on_row: false,
            closed: false,
        }
    }
}

impl MergedResult for IteratorStreamMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        self.on_row = false;
        if self.closed {
            return Ok(false);
        }

        while let Some(cursor) = self.cursors.get_mut(self.current) {
            match cursor.next() {
                Ok(true) => {
                    self.on_row = true;
                    return Ok(true);
                }
                Ok(false) => {
                    cursor.close();
                    self.current += 1;
                }
                Err(err) => {
                    self.close();
                    return Err(err);
                }
            }
        }

        Ok(false)
    }

    fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }
        self.metadata.check_column(column)?;
        if !self.on_row {
            return Err(MergeError::NoCurrentRow);
        }

        self.cursors
            .get(self.current)
            .ok_or(MergeError::NoCurrentRow)?
            .value(column)
    }

    fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    fn close(&mut self) {
        if !self.closed {
            close_all(&mut self.cursors);
            self.closed = true;
        }
    }

    fn kind(&self) -> MergedResultKind {
        MergedResultKind::Iterator
    }
}
