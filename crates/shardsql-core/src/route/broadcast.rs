//! Broadcast and unicast routes. None of these consult a strategy.

use crate::{
    route::{RouteError, RoutingResult, RoutingUnit, TableUnit},
    rule::ShardingRule,
};

/// One database-level unit per data source.
pub(super) fn route_databases(rule: &ShardingRule) -> RoutingResult {
    rule.data_sources()
        .iter()
        .map(|ds| TableUnit::database(ds.as_str()))
        .collect()
}

/// One unit per data node of every listed sharded table.
pub(super) fn route_tables(
    rule: &ShardingRule,
    tables: &[&str],
) -> Result<RoutingResult, RouteError> {
    let mut result = RoutingResult::new();
    for table in tables {
        let table_rule = rule.table_rule(table)?;
        for node in table_rule.data_nodes() {
            result.push(TableUnit::new(
                &node.data_source,
                vec![RoutingUnit::new(
                    &node.data_source,
                    table_rule.logic_table(),
                    &node.table,
                )],
            ));
        }
    }

    Ok(result)
}

/// One unit per data source, used when each source answers for itself.
pub(super) fn route_data_source_groups(rule: &ShardingRule) -> RoutingResult {
    route_databases(rule)
}

///
/// UnicastRoutingEngine
///
/// Picks a single table unit: the first data source, in configuration
/// order, that hosts every referenced table. Sharded tables map to their
/// first actual table there; broadcast tables keep their own name.
///

#[derive(Clone, Debug)]
pub struct UnicastRoutingEngine<'a> {
    tables: Vec<&'a str>,
}

impl<'a> UnicastRoutingEngine<'a> {
    #[must_use]
    pub const fn new(tables: Vec<&'a str>) -> Self {
        Self { tables }
    }

    pub fn route(&self, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
        let unconfigured: Vec<String> = self
            .tables
            .iter()
            .filter(|table| !rule.is_sharding_table(table) && !rule.is_broadcast_table(table))
            .map(ToString::to_string)
            .collect();
        if !unconfigured.is_empty() {
            return Err(RouteError::RuleNotFound {
                tables: unconfigured,
            });
        }

        let Some(ds) = self.pick_data_source(rule) else {
            return Err(RouteError::DisjointDataSources {
                tables: self.tables.iter().map(ToString::to_string).collect(),
            });
        };

        let mut units = Vec::new();
        for &table in &self.tables {
            if let Some(table_rule) = rule.find_table_rule(table) {
                let actual = table_rule.actual_tables(ds).next().ok_or_else(|| {
                    RouteError::InvalidActualTable {
                        table: table.to_string(),
                        data_source: ds.to_string(),
                        actual_table: "#0".to_string(),
                    }
                })?;
                units.push(RoutingUnit::new(ds, table_rule.logic_table(), actual));
            } else {
                units.push(RoutingUnit::new(ds, table, table));
            }
        }

        let mut result = RoutingResult::new();
        result.push(TableUnit::new(ds, units));

        Ok(result)
    }

    fn pick_data_source<'r>(&self, rule: &'r ShardingRule) -> Option<&'r str> {
        rule.data_sources()
            .iter()
            .map(String::as_str)
            .find(|ds| {
                self.tables.iter().all(|table| {
                    rule.find_table_rule(table).is_none_or(|table_rule| {
                        table_rule.data_sources().iter().any(|d| d.as_str() == *ds)
                    })
                })
            })
    }
}
