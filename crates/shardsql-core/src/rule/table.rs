use crate::rule::{RuleError, StrategyLevel, StrategyRule};
use std::{collections::BTreeSet, fmt, str::FromStr};

///
/// DataNode
///
/// One physical (data source, actual table) placement of a logical table.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    #[must_use]
    pub fn new(data_source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

impl FromStr for DataNode {
    type Err = RuleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || RuleError::MalformedDataNode {
            text: text.to_string(),
        };
        let (data_source, table) = text.trim().split_once('.').ok_or_else(malformed)?;
        if data_source.is_empty() || table.is_empty() || table.contains('.') {
            return Err(malformed());
        }

        Ok(Self::new(data_source, table))
    }
}

///
/// TableRule
///
/// Placement and strategies of one logical table. Data nodes keep their
/// declaration order; actual tables of one data source are indexed by their
/// position among that source's nodes, which is what binding correspondence
/// relies on.
///

#[derive(Clone, Debug)]
pub struct TableRule {
    logic_table: String,
    data_nodes: Vec<DataNode>,
    data_sources: Vec<String>,
    database_strategy: Option<StrategyRule>,
    table_strategy: Option<StrategyRule>,
}

impl TableRule {
    pub fn new(
        logic_table: impl Into<String>,
        data_nodes: impl IntoIterator<Item = DataNode>,
    ) -> Result<Self, RuleError> {
        let logic_table = logic_table.into();
        let data_nodes: Vec<DataNode> = data_nodes.into_iter().collect();
        if data_nodes.is_empty() {
            return Err(RuleError::EmptyDataNodes { table: logic_table });
        }

        let mut seen = BTreeSet::new();
        let mut data_sources = Vec::new();
        for node in &data_nodes {
            if !seen.insert(node) {
                return Err(RuleError::DuplicateDataNode {
                    table: logic_table,
                    node: node.to_string(),
                });
            }
            if !data_sources.contains(&node.data_source) {
                data_sources.push(node.data_source.clone());
            }
        }

        Ok(Self {
            logic_table,
            data_nodes,
            data_sources,
            database_strategy: None,
            table_strategy: None,
        })
    }

    pub fn with_database_strategy(mut self, strategy: StrategyRule) -> Result<Self, RuleError> {
        self.check_columns(&strategy, StrategyLevel::Database)?;
        self.database_strategy = Some(strategy);

        Ok(self)
    }

    pub fn with_table_strategy(mut self, strategy: StrategyRule) -> Result<Self, RuleError> {
        self.check_columns(&strategy, StrategyLevel::Table)?;
        self.table_strategy = Some(strategy);

        Ok(self)
    }

    fn check_columns(&self, strategy: &StrategyRule, level: StrategyLevel) -> Result<(), RuleError> {
        if strategy.columns().is_empty() {
            return Err(RuleError::EmptyStrategyColumns {
                table: self.logic_table.clone(),
                level,
            });
        }

        Ok(())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn logic_table(&self) -> &str {
        &self.logic_table
    }

    #[must_use]
    pub fn data_nodes(&self) -> &[DataNode] {
        &self.data_nodes
    }

    /// Data sources hosting this table, in first-declared order.
    #[must_use]
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    #[must_use]
    pub const fn database_strategy(&self) -> Option<&StrategyRule> {
        self.database_strategy.as_ref()
    }

    #[must_use]
    pub const fn table_strategy(&self) -> Option<&StrategyRule> {
        self.table_strategy.as_ref()
    }

    /// Actual tables configured in `data_source`, in declaration order.
    pub fn actual_tables<'s>(&'s self, data_source: &str) -> impl Iterator<Item = &'s str> {
        self.data_nodes
            .iter()
            .filter(move |node| node.data_source == data_source)
            .map(|node| node.table.as_str())
    }

    /// Position of `actual_table` among the actual tables of `data_source`.
    #[must_use]
    pub fn actual_table_index(&self, data_source: &str, actual_table: &str) -> Option<usize> {
        self.actual_tables(data_source)
            .position(|table| table.eq_ignore_ascii_case(actual_table))
    }

    #[must_use]
    pub fn actual_table_at(&self, data_source: &str, index: usize) -> Option<&str> {
        self.actual_tables(data_source).nth(index)
    }

    #[must_use]
    pub fn contains_actual_table(&self, actual_table: &str) -> bool {
        self.data_nodes
            .iter()
            .any(|node| node.table.eq_ignore_ascii_case(actual_table))
    }

    /// Position of the node in declaration order, used to keep routing
    /// output ordered by configuration.
    #[must_use]
    pub fn node_position(&self, data_source: &str, actual_table: &str) -> Option<usize> {
        self.data_nodes
            .iter()
            .position(|node| node.data_source == data_source && node.table == actual_table)
    }

    /// Per-source actual-table counts, used for binding co-partition checks.
    pub(crate) fn partition_shape(&self) -> Vec<(&str, usize)> {
        self.data_sources
            .iter()
            .map(|ds| (ds.as_str(), self.actual_tables(ds).count()))
            .collect()
    }
}

///
/// TESTS
///
