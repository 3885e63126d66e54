use derive_more::{Deref, IntoIterator};
use std::{collections::BTreeSet, fmt};

///
/// RoutingUnit
///
/// One logical table bound to one physical table inside a data source.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RoutingUnit {
    pub data_source: String,
    pub logical_table: String,
    pub actual_table: String,
}

impl RoutingUnit {
    #[must_use]
    pub fn new(
        data_source: impl Into<String>,
        logical_table: impl Into<String>,
        actual_table: impl Into<String>,
    ) -> Self {
        Self {
            data_source: data_source.into(),
            logical_table: logical_table.into(),
            actual_table: actual_table.into(),
        }
    }
}

///
/// TableUnit
///
/// Everything one physical statement execution touches: a data source and
/// one routing unit per participating logical table. Database-level units
/// (broadcast DAL/TCL) carry no routing units.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TableUnit {
    data_source: String,
    routing_units: Vec<RoutingUnit>,
}

impl TableUnit {
    #[must_use]
    pub fn new(data_source: impl Into<String>, routing_units: Vec<RoutingUnit>) -> Self {
        Self {
            data_source: data_source.into(),
            routing_units,
        }
    }

    /// Database-level unit with no table mapping.
    #[must_use]
    pub fn database(data_source: impl Into<String>) -> Self {
        Self::new(data_source, Vec::new())
    }

    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    #[must_use]
    pub fn routing_units(&self) -> &[RoutingUnit] {
        &self.routing_units
    }

    /// Actual table bound to `logical_table` in this unit.
    #[must_use]
    pub fn actual_table(&self, logical_table: &str) -> Option<&str> {
        self.routing_units
            .iter()
            .find(|unit| unit.logical_table.eq_ignore_ascii_case(logical_table))
            .map(|unit| unit.actual_table.as_str())
    }

    /// Logical table that `actual_table` stands for in this unit.
    #[must_use]
    pub fn logical_table(&self, actual_table: &str) -> Option<&str> {
        self.routing_units
            .iter()
            .find(|unit| unit.actual_table.eq_ignore_ascii_case(actual_table))
            .map(|unit| unit.logical_table.as_str())
    }
}

impl fmt::Display for TableUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.data_source)?;
        for (i, unit) in self.routing_units.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}->{}", unit.logical_table, unit.actual_table)?;
        }
        write!(f, "]")
    }
}

///
/// RoutingResult
///
/// Insertion-ordered, duplicate-free set of table units. Ordering is stable
/// for identical inputs; merge input alignment and pagination push-down
/// depend on it.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct RoutingResult {
    #[into_iterator(owned, ref)]
    table_units: Vec<TableUnit>,
}

impl RoutingResult {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            table_units: Vec::new(),
        }
    }

    /// Append `unit` unless an identical unit is already present.
    pub fn push(&mut self, unit: TableUnit) {
        if !self.table_units.contains(&unit) {
            self.table_units.push(unit);
        }
    }

    #[must_use]
    pub fn table_units(&self) -> &[TableUnit] {
        &self.table_units
    }

    #[must_use]
    pub fn into_table_units(self) -> Vec<TableUnit> {
        self.table_units
    }

    #[must_use]
    pub fn is_single_routing(&self) -> bool {
        self.table_units.len() == 1
    }

    /// Distinct data sources in first-seen order.
    #[must_use]
    pub fn data_source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for unit in &self.table_units {
            if !names.contains(&unit.data_source()) {
                names.push(unit.data_source());
            }
        }

        names
    }

    pub fn table_units_in<'a>(&'a self, data_source: &str) -> impl Iterator<Item = &'a TableUnit> {
        self.table_units
            .iter()
            .filter(move |unit| unit.data_source == data_source)
    }

    /// Distinct actual tables routed for `logical_table` in `data_source`.
    #[must_use]
    pub fn actual_tables(&self, data_source: &str, logical_table: &str) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for unit in self.table_units_in(data_source) {
            if let Some(actual) = unit.actual_table(logical_table)
                && !tables.contains(&actual)
            {
                tables.push(actual);
            }
        }

        tables
    }

    /// Table unit in `data_source` that binds `actual_table`.
    #[must_use]
    pub fn find_table_unit(&self, data_source: &str, actual_table: &str) -> Option<&TableUnit> {
        self.table_units
            .iter()
            .find(|unit| unit.data_source == data_source && unit.logical_table(actual_table).is_some())
    }

    /// Order-insensitive view, for set-equality checks.
    #[must_use]
    pub fn to_set(&self) -> BTreeSet<&TableUnit> {
        self.table_units.iter().collect()
    }
}

impl FromIterator<TableUnit> for RoutingResult {
    fn from_iter<I: IntoIterator<Item = TableUnit>>(iter: I) -> Self {
        let mut result = Self::new();
        for unit in iter {
            result.push(unit);
        }

        result
    }
}

///
/// TESTS
///
