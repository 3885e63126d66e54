//! Module: rule
//! Responsibility: immutable sharding-rule snapshot read by routing and merge.
//! Does not own: configuration loading or strategy algorithm resolution.
//! Boundary: built once through `ShardingRuleBuilder`, then shared by reference.

mod binding;
mod error;
mod strategy;
mod table;

use crate::{props::ShardingProps, route::RouteError};
use std::collections::BTreeMap;

// re-exports
pub use binding::BindingTableGroup;
pub use error::RuleError;
pub use strategy::{ShardingStrategyAdapter, StrategyLevel, StrategyRule};
pub use table::{DataNode, TableRule};

///
/// ShardingRule
///
/// Complete rule snapshot: data sources, per-table placement and strategies,
/// binding groups (transitively closed), broadcast tables, default strategies,
/// and runtime props. Table lookups are case-insensitive.
///

#[derive(Clone, Debug)]
pub struct ShardingRule {
    data_sources: Vec<String>,
    table_rules: Vec<TableRule>,
    table_index: BTreeMap<String, usize>,
    binding_groups: Vec<BindingTableGroup>,
    broadcast_tables: Vec<String>,
    default_database_strategy: Option<StrategyRule>,
    default_table_strategy: Option<StrategyRule>,
    props: ShardingProps,
}

impl ShardingRule {
    #[must_use]
    pub fn builder() -> ShardingRuleBuilder {
        ShardingRuleBuilder::default()
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    #[must_use]
    pub fn table_rules(&self) -> &[TableRule] {
        &self.table_rules
    }

    #[must_use]
    pub fn binding_groups(&self) -> &[BindingTableGroup] {
        &self.binding_groups
    }

    #[must_use]
    pub fn broadcast_tables(&self) -> &[String] {
        &self.broadcast_tables
    }

    #[must_use]
    pub const fn props(&self) -> &ShardingProps {
        &self.props
    }

    ///
    /// LOOKUPS
    ///

    #[must_use]
    pub fn find_table_rule(&self, logic_table: &str) -> Option<&TableRule> {
        self.table_index
            .get(&logic_table.to_ascii_lowercase())
            .and_then(|&index| self.table_rules.get(index))
    }

    /// Table rule for `logic_table`, or a fatal rule-not-found error.
    pub fn table_rule(&self, logic_table: &str) -> Result<&TableRule, RouteError> {
        self.find_table_rule(logic_table)
            .ok_or_else(|| RouteError::RuleNotFound {
                tables: vec![logic_table.to_string()],
            })
    }

    #[must_use]
    pub fn find_binding_group(&self, logic_table: &str) -> Option<&BindingTableGroup> {
        self.binding_groups
            .iter()
            .find(|group| group.contains(logic_table))
    }

    #[must_use]
    pub fn is_sharding_table(&self, logic_table: &str) -> bool {
        self.find_table_rule(logic_table).is_some()
    }

    #[must_use]
    pub fn is_broadcast_table(&self, logic_table: &str) -> bool {
        self.broadcast_tables
            .iter()
            .any(|table| table.eq_ignore_ascii_case(logic_table))
    }

    #[must_use]
    pub fn is_all_broadcast_tables(&self, logic_tables: &[String]) -> bool {
        !logic_tables.is_empty() && logic_tables.iter().all(|t| self.is_broadcast_table(t))
    }

    /// Referenced tables that have a table rule, in statement order.
    #[must_use]
    pub fn sharding_logic_tables<'a>(&self, logic_tables: &'a [String]) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::new();
        for table in logic_tables {
            if self.is_sharding_table(table) && !out.iter().any(|t| t.eq_ignore_ascii_case(table)) {
                out.push(table.as_str());
            }
        }

        out
    }

    /// Referenced tables that are neither sharded nor broadcast.
    #[must_use]
    pub fn unconfigured_tables(&self, logic_tables: &[String]) -> Vec<String> {
        logic_tables
            .iter()
            .filter(|t| !self.is_sharding_table(t) && !self.is_broadcast_table(t))
            .cloned()
            .collect()
    }

    /// True when every table is sharded and all share one binding group.
    #[must_use]
    pub fn is_all_binding_tables(&self, logic_tables: &[&str]) -> bool {
        let Some(first) = logic_tables.first() else {
            return false;
        };
        let Some(group) = self.find_binding_group(first) else {
            return false;
        };

        logic_tables
            .iter()
            .all(|table| group.contains(table) && self.is_sharding_table(table))
    }

    /// Database strategy for `table_rule`, falling back to the default.
    #[must_use]
    pub fn database_strategy<'a>(&'a self, table_rule: &'a TableRule) -> Option<&'a StrategyRule> {
        table_rule
            .database_strategy()
            .or(self.default_database_strategy.as_ref())
    }

    /// Table strategy for `table_rule`, falling back to the default.
    #[must_use]
    pub fn table_strategy<'a>(&'a self, table_rule: &'a TableRule) -> Option<&'a StrategyRule> {
        table_rule
            .table_strategy()
            .or(self.default_table_strategy.as_ref())
    }

    /// Actual table of `bound_table` co-partitioned with `actual_table` of
    /// `logic_table` inside `data_source`.
    pub fn bound_actual_table(
        &self,
        data_source: &str,
        logic_table: &str,
        actual_table: &str,
        bound_table: &str,
    ) -> Result<&str, RouteError> {
        let index = self
            .table_rule(logic_table)?
            .actual_table_index(data_source, actual_table)
            .ok_or_else(|| RouteError::InvalidActualTable {
                table: logic_table.to_string(),
                data_source: data_source.to_string(),
                actual_table: actual_table.to_string(),
            })?;

        self.table_rule(bound_table)?
            .actual_table_at(data_source, index)
            .ok_or_else(|| RouteError::InvalidActualTable {
                table: bound_table.to_string(),
                data_source: data_source.to_string(),
                actual_table: format!("#{index}"),
            })
    }

    /// Logical table owning `actual_table`, if any.
    #[must_use]
    pub fn logic_table_for_actual(&self, actual_table: &str) -> Option<&str> {
        self.table_rules
            .iter()
            .find(|rule| rule.contains_actual_table(actual_table))
            .map(TableRule::logic_table)
    }
}

///
/// ShardingRuleBuilder
///

#[derive(Debug, Default)]
pub struct ShardingRuleBuilder {
    data_sources: Vec<String>,
    table_rules: Vec<TableRule>,
    binding_groups: Vec<BindingTableGroup>,
    broadcast_tables: Vec<String>,
    default_database_strategy: Option<StrategyRule>,
    default_table_strategy: Option<StrategyRule>,
    props: ShardingProps,
}

impl ShardingRuleBuilder {
    /// Declare data sources explicitly. When omitted, they are collected
    /// from table data nodes in declaration order.
    #[must_use]
    pub fn data_sources<I, S>(mut self, data_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_sources = data_sources.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn table(mut self, rule: TableRule) -> Self {
        self.table_rules.push(rule);
        self
    }

    #[must_use]
    pub fn binding_group<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binding_groups.push(BindingTableGroup::new(tables));
        self
    }

    #[must_use]
    pub fn broadcast_table(mut self, table: impl Into<String>) -> Self {
        self.broadcast_tables.push(table.into());
        self
    }

    #[must_use]
    pub fn default_database_strategy(mut self, strategy: StrategyRule) -> Self {
        self.default_database_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn default_table_strategy(mut self, strategy: StrategyRule) -> Self {
        self.default_table_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn props(mut self, props: ShardingProps) -> Self {
        self.props = props;
        self
    }

    /// Validate and freeze the snapshot.
    pub fn build(self) -> Result<ShardingRule, RuleError> {
        let data_sources = self.resolve_data_sources()?;

        let mut table_index = BTreeMap::new();
        for (index, rule) in self.table_rules.iter().enumerate() {
            let key = rule.logic_table().to_ascii_lowercase();
            if table_index.insert(key, index).is_some() {
                return Err(RuleError::DuplicateTable {
                    table: rule.logic_table().to_string(),
                });
            }
        }

        for table in &self.broadcast_tables {
            if table_index.contains_key(&table.to_ascii_lowercase()) {
                return Err(RuleError::BroadcastConflict {
                    table: table.clone(),
                });
            }
        }

        let binding_groups = binding::close_groups(self.binding_groups);
        for group in &binding_groups {
            validate_binding_group(group, &self.table_rules, &table_index)?;
        }

        Ok(ShardingRule {
            data_sources,
            table_rules: self.table_rules,
            table_index,
            binding_groups,
            broadcast_tables: self.broadcast_tables,
            default_database_strategy: self.default_database_strategy,
            default_table_strategy: self.default_table_strategy,
            props: self.props,
        })
    }

    fn resolve_data_sources(&self) -> Result<Vec<String>, RuleError> {
        if self.data_sources.is_empty() {
            let mut collected: Vec<String> = Vec::new();
            for rule in &self.table_rules {
                for ds in rule.data_sources() {
                    if !collected.contains(ds) {
                        collected.push(ds.clone());
                    }
                }
            }

            return Ok(collected);
        }

        for rule in &self.table_rules {
            if let Some(ds) = rule
                .data_sources()
                .iter()
                .find(|ds| !self.data_sources.contains(ds))
            {
                return Err(RuleError::UnknownDataSource {
                    table: rule.logic_table().to_string(),
                    data_source: ds.clone(),
                });
            }
        }

        Ok(self.data_sources.clone())
    }
}

// Members must exist and share one partition shape (same data sources, same
// per-source actual-table counts) for index correspondence to hold.
fn validate_binding_group(
    group: &BindingTableGroup,
    table_rules: &[TableRule],
    table_index: &BTreeMap<String, usize>,
) -> Result<(), RuleError> {
    let mut members = Vec::with_capacity(group.tables().len());
    for table in group.tables() {
        let rule = table_index
            .get(&table.to_ascii_lowercase())
            .and_then(|&index| table_rules.get(index))
            .ok_or_else(|| RuleError::BindingTableNotFound {
                group: group.tables().to_vec(),
                table: table.clone(),
            })?;
        members.push(rule);
    }

    let Some((representative, rest)) = members.split_first() else {
        return Ok(());
    };
    let expected = representative.partition_shape();
    for member in rest {
        let actual = member.partition_shape();
        if actual != expected {
            return Err(RuleError::BindingMismatch {
                group: group.tables().to_vec(),
                representative: representative.logic_table().to_string(),
                table: member.logic_table().to_string(),
                expected: describe_shape(&expected),
                actual: describe_shape(&actual),
            });
        }
    }

    Ok(())
}

fn describe_shape(shape: &[(&str, usize)]) -> String {
    shape
        .iter()
        .map(|(ds, count)| format!("{ds}:{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

///
/// TESTS
///
