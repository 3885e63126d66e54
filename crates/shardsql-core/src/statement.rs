//! Module: statement
//! Responsibility: bound statement descriptor consumed by routing and merge.
//! Does not own: SQL parsing, semantic binding, or rewrite.
//! Boundary: produced by the parser layer; read-only inside the core.

use crate::route::ShardingConditions;

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Dal(DalKind),
    Tcl,
}

impl StatementKind {
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::Select)
    }

    #[must_use]
    pub const fn is_dml(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    #[must_use]
    pub const fn is_dal(self) -> bool {
        matches!(self, Self::Dal(_))
    }
}

///
/// DalKind
/// Administrative/introspection statement shapes with distinct routing.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DalKind {
    ShowDatabases,
    ShowTables,
    ShowCreateTable,
    Set,
    Other,
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// NullsOrder
/// Position of NULL keys in the merged output, independent of direction.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullsOrder {
    First,
    Last,
}

///
/// OrderByItem
///
/// One ORDER BY / GROUP BY key: a 1-based projected column index, a
/// direction, and a null placement. NULL sorts as the smallest value by
/// default, so ASC places it first and DESC places it last.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OrderByItem {
    pub index: usize,
    pub direction: OrderDirection,
    pub nulls: NullsOrder,
}

impl OrderByItem {
    #[must_use]
    pub const fn new(index: usize, direction: OrderDirection) -> Self {
        let nulls = match direction {
            OrderDirection::Asc => NullsOrder::First,
            OrderDirection::Desc => NullsOrder::Last,
        };

        Self {
            index,
            direction,
            nulls,
        }
    }

    #[must_use]
    pub const fn asc(index: usize) -> Self {
        Self::new(index, OrderDirection::Asc)
    }

    #[must_use]
    pub const fn desc(index: usize) -> Self {
        Self::new(index, OrderDirection::Desc)
    }

    #[must_use]
    pub const fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = nulls;
        self
    }
}

///
/// AggregationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum AggregationKind {
    #[display("COUNT")]
    Count,
    #[display("SUM")]
    Sum,
    #[display("MIN")]
    Min,
    #[display("MAX")]
    Max,
    #[display("AVG")]
    Avg,
}

///
/// AvgDerivedColumns
///
/// Hidden COUNT/SUM columns the rewriter appended so AVG can be rebuilt
/// from per-shard partials.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AvgDerivedColumns {
    pub count_index: usize,
    pub sum_index: usize,
}

///
/// AggregationProjection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AggregationProjection {
    pub kind: AggregationKind,
    pub index: usize,
    pub avg: Option<AvgDerivedColumns>,
}

impl AggregationProjection {
    #[must_use]
    pub const fn new(kind: AggregationKind, index: usize) -> Self {
        Self {
            kind,
            index,
            avg: None,
        }
    }

    #[must_use]
    pub const fn count(index: usize) -> Self {
        Self::new(AggregationKind::Count, index)
    }

    #[must_use]
    pub const fn sum(index: usize) -> Self {
        Self::new(AggregationKind::Sum, index)
    }

    #[must_use]
    pub const fn min(index: usize) -> Self {
        Self::new(AggregationKind::Min, index)
    }

    #[must_use]
    pub const fn max(index: usize) -> Self {
        Self::new(AggregationKind::Max, index)
    }

    #[must_use]
    pub const fn avg(index: usize, count_index: usize, sum_index: usize) -> Self {
        Self {
            kind: AggregationKind::Avg,
            index,
            avg: Some(AvgDerivedColumns {
                count_index,
                sum_index,
            }),
        }
    }
}

///
/// Pagination
/// LIMIT/OFFSET window applied to the fully merged stream.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Pagination {
    pub offset: u64,
    pub row_count: Option<u64>,
}

///
/// StatementContext
///
/// Shape of one bound statement: kind, referenced logical tables, routing
/// conditions, and the GROUP BY / ORDER BY / aggregate / LIMIT descriptors
/// the merge pipeline reconstructs across shards.
///

#[derive(Clone, Debug)]
pub struct StatementContext {
    kind: StatementKind,
    tables: Vec<String>,
    conditions: ShardingConditions,
    aggregations: Vec<AggregationProjection>,
    group_by: Vec<OrderByItem>,
    order_by: Vec<OrderByItem>,
    pagination: Option<Pagination>,
}

impl StatementContext {
    #[must_use]
    pub fn new<I, S>(kind: StatementKind, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            tables: tables.into_iter().map(Into::into).collect(),
            conditions: ShardingConditions::default(),
            aggregations: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            pagination: None,
        }
    }

    #[must_use]
    pub fn select<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(StatementKind::Select, tables)
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: ShardingConditions) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: AggregationProjection) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    #[must_use]
    pub fn with_group_by(mut self, items: impl IntoIterator<Item = OrderByItem>) -> Self {
        self.group_by = items.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, items: impl IntoIterator<Item = OrderByItem>) -> Self {
        self.order_by = items.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, offset: u64, row_count: Option<u64>) -> Self {
        self.pagination = Some(Pagination { offset, row_count });
        self
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    #[must_use]
    pub const fn conditions(&self) -> &ShardingConditions {
        &self.conditions
    }

    #[must_use]
    pub fn aggregations(&self) -> &[AggregationProjection] {
        &self.aggregations
    }

    #[must_use]
    pub fn group_by(&self) -> &[OrderByItem] {
        &self.group_by
    }

    #[must_use]
    pub fn order_by(&self) -> &[OrderByItem] {
        &self.order_by
    }

    #[must_use]
    pub const fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    #[must_use]
    pub fn has_group_by_or_aggregation(&self) -> bool {
        !self.group_by.is_empty() || !self.aggregations.is_empty()
    }

    /// True when shards already return rows sorted by the GROUP BY key,
    /// either implicitly (no ORDER BY) or because ORDER BY repeats it.
    #[must_use]
    pub fn is_group_by_stream_ordered(&self) -> bool {
        !self.group_by.is_empty() && (self.order_by.is_empty() || self.order_by == self.group_by)
    }

    /// Order in which merged rows must leave the pipeline.
    #[must_use]
    pub fn output_order(&self) -> &[OrderByItem] {
        if self.order_by.is_empty() {
            &self.group_by
        } else {
            &self.order_by
        }
    }
}

///
/// TESTS
///
