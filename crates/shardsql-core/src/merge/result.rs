use crate::{
    error::InternalError,
    merge::MergeError,
    value::{Value, ValueConversionError},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;

///
/// ColumnMetadata
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnMetadata {
    pub label: String,
    pub case_sensitive: bool,
}

impl ColumnMetadata {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            case_sensitive: true,
        }
    }

    #[must_use]
    pub const fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

///
/// ResultMetadata
///
/// Column layout of one result set. Columns are addressed 1-based.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultMetadata {
    columns: Vec<ColumnMetadata>,
}

impl ResultMetadata {
    #[must_use]
    pub const fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    /// Case-sensitive columns with the given labels.
    #[must_use]
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels.into_iter().map(ColumnMetadata::new).collect())
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnMetadata> {
        index.checked_sub(1).and_then(|i| self.columns.get(i))
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// 1-based index of the column labelled `label`, ignoring case.
    #[must_use]
    pub fn find_index(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.label.eq_ignore_ascii_case(label))
            .map(|i| i + 1)
    }

    pub(crate) fn check_column(&self, column: usize) -> Result<(), MergeError> {
        if column == 0 || column > self.columns.len() {
            return Err(MergeError::ColumnOutOfRange {
                column,
                column_count: self.columns.len(),
            });
        }

        Ok(())
    }

    /// Case sensitivity of `column`; unknown columns compare case-sensitively.
    #[must_use]
    pub fn is_case_sensitive(&self, column: usize) -> bool {
        self.column(column).is_none_or(|c| c.case_sensitive)
    }
}

///
/// QueryResult
///
/// Forward-only cursor over the rows one table unit returned. Owned by the
/// execution layer; the merge pipeline only advances, reads and closes it.
///

pub trait QueryResult {
    /// Advance to the next row. `Ok(false)` once exhausted.
    fn next(&mut self) -> Result<bool, InternalError>;

    /// Cell of the current row, 1-based.
    fn value(&self, column: usize) -> Result<Value, InternalError>;

    fn metadata(&self) -> &ResultMetadata;

    fn close(&mut self);
}

///
/// MergedResultKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MergedResultKind {
    Iterator,
    OrderBy,
    GroupByStream,
    GroupByMemory,
    Pagination,
    Memory,
}

impl MergedResultKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iterator => "iterator",
            Self::OrderBy => "order_by",
            Self::GroupByStream => "group_by_stream",
            Self::GroupByMemory => "group_by_memory",
            Self::Pagination => "pagination",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for MergedResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// MergedResult
///
/// The single logical cursor handed back to the caller. Decorators own the
/// result they wrap and are the only code that advances it. `close` is
/// idempotent and `next` after `close` reports end of stream.
///

pub trait MergedResult {
    fn next(&mut self) -> Result<bool, MergeError>;

    /// Cell of the current row, 1-based.
    fn value(&self, column: usize) -> Result<Value, MergeError>;

    fn metadata(&self) -> &ResultMetadata;

    fn close(&mut self);

    fn kind(&self) -> MergedResultKind;

    /// The result this one decorates, if any.
    fn inner(&self) -> Option<&dyn MergedResult> {
        None
    }

    fn is_null(&self, column: usize) -> Result<bool, MergeError> {
        Ok(self.value(column)?.is_null())
    }

    fn get_bool(&self, column: usize) -> Result<Option<bool>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_i64(&self, column: usize) -> Result<Option<i64>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_u64(&self, column: usize) -> Result<Option<u64>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_f64(&self, column: usize) -> Result<Option<f64>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_decimal(&self, column: usize) -> Result<Option<Decimal>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_text(&self, column: usize) -> Result<Option<String>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_bytes(&self, column: usize) -> Result<Option<Vec<u8>>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_date(&self, column: usize) -> Result<Option<NaiveDate>, MergeError> {
        typed(self.value(column)?, column)
    }

    fn get_timestamp(&self, column: usize) -> Result<Option<NaiveDateTime>, MergeError> {
        typed(self.value(column)?, column)
    }
}

// SQL NULL reads as `None` for every type.
fn typed<T>(value: Value, column: usize) -> Result<Option<T>, MergeError>
where
    T: for<'v> TryFrom<&'v Value, Error = ValueConversionError>,
{
    if value.is_null() {
        return Ok(None);
    }

    T::try_from(&value)
        .map(Some)
        .map_err(|err| MergeError::type_mismatch(column, err))
}

///
/// ExecutionResult
///
/// What executing one table unit produced.
///

pub enum ExecutionResult {
    Query(Box<dyn QueryResult>),
    Update(u64),
}

impl ExecutionResult {
    #[must_use]
    pub fn query(result: impl QueryResult + 'static) -> Self {
        Self::Query(Box::new(result))
    }

    pub(crate) fn close(&mut self) {
        if let Self::Query(result) = self {
            result.close();
        }
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(result) => f
                .debug_tuple("Query")
                .field(&result.metadata().column_count())
                .finish(),
            Self::Update(count) => f.debug_tuple("Update").field(count).finish(),
        }
    }
}

///
/// MergedOutcome
///

pub enum MergedOutcome {
    Rows(Box<dyn MergedResult>),
    UpdateCount(u64),
}

impl MergedOutcome {
    /// Merged rows, or `None` for update counts.
    #[must_use]
    pub fn into_rows(self) -> Option<Box<dyn MergedResult>> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::UpdateCount(_) => None,
        }
    }

    #[must_use]
    pub const fn update_count(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::UpdateCount(count) => Some(*count),
        }
    }
}

impl fmt::Debug for MergedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(rows) => f.debug_tuple("Rows").field(&rows.kind()).finish(),
            Self::UpdateCount(count) => f.debug_tuple("UpdateCount").field(count).finish(),
        }
    }
}
