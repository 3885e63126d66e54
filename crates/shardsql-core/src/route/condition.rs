//! Module: route::condition
//! Responsibility: immutable sharding predicate values extracted from WHERE
//! clauses and INSERT rows.
//! Does not own: predicate extraction or value-to-shard mapping.
//! Boundary: produced by the binder, read by routing engines and strategy adapters.

use crate::value::{Value, canonical_cmp};
use std::{cmp::Ordering, fmt, ops::Bound};

///
/// ValueRange
///
/// Bounded or unbounded interval over comparable sharding values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ValueRange {
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

impl ValueRange {
    #[must_use]
    pub const fn new(lower: Bound<Value>, upper: Bound<Value>) -> Self {
        Self { lower, upper }
    }

    /// `BETWEEN low AND high`.
    #[must_use]
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(Bound::Included(low.into()), Bound::Included(high.into()))
    }

    #[must_use]
    pub fn at_least(low: impl Into<Value>) -> Self {
        Self::new(Bound::Included(low.into()), Bound::Unbounded)
    }

    #[must_use]
    pub fn greater_than(low: impl Into<Value>) -> Self {
        Self::new(Bound::Excluded(low.into()), Bound::Unbounded)
    }

    #[must_use]
    pub fn at_most(high: impl Into<Value>) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(high.into()))
    }

    #[must_use]
    pub fn less_than(high: impl Into<Value>) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(high.into()))
    }

    /// Check whether `value` lies inside this interval.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        let above_lower = match &self.lower {
            Bound::Included(low) => canonical_cmp(value, low) != Ordering::Less,
            Bound::Excluded(low) => canonical_cmp(value, low) == Ordering::Greater,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(high) => canonical_cmp(value, high) != Ordering::Greater,
            Bound::Excluded(high) => canonical_cmp(value, high) == Ordering::Less,
            Bound::Unbounded => true,
        };

        above_lower && below_upper
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{v}")?,
            Bound::Excluded(v) => write!(f, "({v}")?,
            Bound::Unbounded => write!(f, "(-inf")?,
        }
        write!(f, "..")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{v}]"),
            Bound::Excluded(v) => write!(f, "{v})"),
            Bound::Unbounded => write!(f, "+inf)"),
        }
    }
}

///
/// ShardingValue
///
/// Precise → `=` or `IN` list; adapters must return exact matches.
/// Range   → interval; adapters may return a superset.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ShardingValue {
    Precise(Vec<Value>),
    Range(ValueRange),
}

impl ShardingValue {
    #[must_use]
    pub const fn is_range(&self) -> bool {
        matches!(self, Self::Range(_))
    }
}

///
/// ShardingConditionValue
///
/// One sharding-column predicate for one logical table.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ShardingConditionValue {
    table: String,
    column: String,
    value: ShardingValue,
}

impl ShardingConditionValue {
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>, value: ShardingValue) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value,
        }
    }

    /// `column = value`.
    #[must_use]
    pub fn equal(table: impl Into<String>, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(table, column, ShardingValue::Precise(vec![value.into()]))
    }

    /// `column IN (values...)`.
    #[must_use]
    pub fn in_list<I, V>(table: impl Into<String>, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();

        Self::new(table, column, ShardingValue::Precise(values))
    }

    #[must_use]
    pub fn range(table: impl Into<String>, column: impl Into<String>, range: ValueRange) -> Self {
        Self::new(table, column, ShardingValue::Range(range))
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn value(&self) -> &ShardingValue {
        &self.value
    }

    /// Table and column names compare case-insensitively, as in SQL.
    #[must_use]
    pub fn matches(&self, table: &str, column: &str) -> bool {
        self.table.eq_ignore_ascii_case(table) && self.column.eq_ignore_ascii_case(column)
    }
}

impl fmt::Display for ShardingConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ShardingValue::Precise(values) => {
                write!(f, "{}.{} in (", self.table, self.column)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
            ShardingValue::Range(range) => write!(f, "{}.{} in {range}", self.table, self.column),
        }
    }
}

///
/// ShardingCondition
///
/// Conjunction of sharding predicates for one logical row or one OR branch.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShardingCondition {
    values: Vec<ShardingConditionValue>,
}

impl ShardingCondition {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = ShardingConditionValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[ShardingConditionValue] {
        &self.values
    }

    /// Collect the predicates on `columns` of any table in `tables`.
    ///
    /// Binding-group members share sharding columns, so a predicate on a
    /// bound companion narrows the representative as well.
    #[must_use]
    pub fn values_for<'a>(
        &'a self,
        tables: &[&str],
        columns: &[String],
    ) -> Vec<&'a ShardingConditionValue> {
        self.values
            .iter()
            .filter(|value| {
                tables.iter().any(|table| {
                    columns
                        .iter()
                        .any(|column| value.matches(table, column.as_str()))
                })
            })
            .collect()
    }
}

///
/// ShardingConditions
///
/// Every independently satisfiable condition of a statement. Routing takes
/// the union across conditions. `always_false` marks contradictory
/// predicates, so no real shard needs to be consulted.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShardingConditions {
    conditions: Vec<ShardingCondition>,
    always_false: bool,
}

impl ShardingConditions {
    #[must_use]
    pub fn new(conditions: impl IntoIterator<Item = ShardingCondition>) -> Self {
        Self {
            conditions: conditions.into_iter().collect(),
            always_false: false,
        }
    }

    /// Conditions for a single conjunction of predicates.
    #[must_use]
    pub fn single(values: impl IntoIterator<Item = ShardingConditionValue>) -> Self {
        Self::new([ShardingCondition::new(values)])
    }

    #[must_use]
    pub const fn always_false() -> Self {
        Self {
            conditions: Vec::new(),
            always_false: true,
        }
    }

    #[must_use]
    pub const fn is_always_false(&self) -> bool {
        self.always_false
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShardingCondition> {
        self.conditions.iter()
    }

    /// Check whether any condition constrains `columns` on `tables`.
    #[must_use]
    pub fn touches(&self, tables: &[&str], columns: &[String]) -> bool {
        self.conditions
            .iter()
            .any(|condition| !condition.values_for(tables, columns).is_empty())
    }

    /// First table named by any predicate, in condition order.
    #[must_use]
    pub fn first_table(&self) -> Option<&str> {
        self.conditions
            .iter()
            .flat_map(ShardingCondition::values)
            .map(ShardingConditionValue::table)
            .next()
    }
}

impl<'a> IntoIterator for &'a ShardingConditions {
    type Item = &'a ShardingCondition;
    type IntoIter = std::slice::Iter<'a, ShardingCondition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

///
/// TESTS
///
