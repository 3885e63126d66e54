use crate::{
    merge::{MergeError, MergedResult, MergedResultKind, ResultMetadata},
    statement::Pagination,
    value::Value,
};

///
/// PaginationMergedResult
///
/// LIMIT/OFFSET over a fully ordered merged stream. The offset is skipped
/// lazily on the first `next`; once `row_count` rows were handed out the
/// stream ends without reading further and the inner result is closed.
///

pub struct PaginationMergedResult {
    inner: Box<dyn MergedResult>,
    pagination: Pagination,
    skipped: bool,
    emitted: u64,
    done: bool,
    closed: bool,
}

impl PaginationMergedResult {
    #[must_use]
    pub fn new(inner: Box<dyn MergedResult>, pagination: Pagination) -> Self {
        Self {
            inner,
            pagination,
            skipped: false,
            emitted: 0,
            done: false,
            closed: false,
        }
    }

    fn finish(&mut self) -> Result<bool, MergeError> {
        self.done = true;
        self.inner.close();

        Ok(false)
    }

    fn step(&mut self) -> Result<bool, MergeError> {
        if let Some(limit) = self.pagination.row_count
            && self.emitted >= limit
        {
            return self.finish();
        }

        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.pagination.offset {
                if !self.inner.next()? {
                    return self.finish();
                }
            }
        }

        if self.inner.next()? {
            self.emitted += 1;
            Ok(true)
        } else {
            self.finish()
        }
    }
}

impl MergedResult for PaginationMergedResult {
    fn next(&mut self) -> Result<bool, MergeError> {
        if self.done {
            return Ok(false);
        }

        let result = self.step();
        if result.is_err() {
            self.done = true;
            self.inner.close();
        }

        result
    }

    fn value(&self, column: usize) -> Result<Value, MergeError> {
        if self.closed {
            return Err(MergeError::Closed);
        }
        if self.done {
            self.inner.metadata().check_column(column)?;
            return Err(MergeError::NoCurrentRow);
        }

        self.inner.value(column)
    }

    fn metadata(&self) -> &ResultMetadata {
        self.inner.metadata()
    }

    fn close(&mut self) {
        self.done = true;
        self.closed = true;
        self.inner.close();
    }

    fn kind(&self) -> MergedResultKind {
        MergedResultKind::Pagination
    }

    fn inner(&self) -> Option<&dyn MergedResult> {
        Some(self.inner.as_ref())
    }
}
