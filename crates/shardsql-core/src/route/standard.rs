use crate::{
    obs::sink::{self, MetricsEvent},
    route::{
        RouteError, RoutingResult, RoutingUnit, ShardingCondition, ShardingConditions, TableUnit,
    },
    rule::{DataNode, ShardingRule, StrategyLevel, StrategyRule, TableRule},
};
use std::collections::BTreeSet;

///
/// StandardRoutingEngine
///
/// Routes one logical table, plus any tables bound to it, to data nodes.
/// Strategies run only for the representative table; bound tables follow
/// by actual-table index inside each routed data source.
///

#[derive(Clone, Debug)]
pub struct StandardRoutingEngine<'a> {
    logic_table: &'a str,
    bound_tables: Vec<&'a str>,
    conditions: &'a ShardingConditions,
}

impl<'a> StandardRoutingEngine<'a> {
    #[must_use]
    pub const fn new(logic_table: &'a str, conditions: &'a ShardingConditions) -> Self {
        Self {
            logic_table,
            bound_tables: Vec::new(),
            conditions,
        }
    }

    #[must_use]
    pub fn with_bound_tables(mut self, bound_tables: Vec<&'a str>) -> Self {
        self.bound_tables = bound_tables;
        self
    }

    #[must_use]
    pub const fn logic_table(&self) -> &'a str {
        self.logic_table
    }

    #[must_use]
    pub fn bound_tables(&self) -> &[&'a str] {
        &self.bound_tables
    }

    pub fn route(&self, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
        let table_rule = rule.table_rule(self.logic_table)?;
        let bound_rules = self
            .bound_tables
            .iter()
            .map(|table| rule.table_rule(table))
            .collect::<Result<Vec<_>, _>>()?;

        if rule.props().check_binding_consistency {
            self.check_binding_consistency(rule, table_rule, &bound_rules)?;
        }
        let nodes = self.route_data_nodes(rule, table_rule)?;

        let mut result = RoutingResult::new();
        for node in nodes {
            let mut units = Vec::with_capacity(1 + bound_rules.len());
            units.push(RoutingUnit::new(
                &node.data_source,
                table_rule.logic_table(),
                &node.table,
            ));
            for bound in &bound_rules {
                let actual = rule.bound_actual_table(
                    &node.data_source,
                    table_rule.logic_table(),
                    &node.table,
                    bound.logic_table(),
                )?;
                units.push(RoutingUnit::new(&node.data_source, bound.logic_table(), actual));
            }
            result.push(TableUnit::new(node.data_source, units));
        }

        Ok(result)
    }

    // Tables whose predicates may narrow the representative.
    fn scope(&self) -> Vec<&'a str> {
        let mut scope = Vec::with_capacity(1 + self.bound_tables.len());
        scope.push(self.logic_table);
        scope.extend(self.bound_tables.iter().copied());

        scope
    }

    /// Data nodes of the representative, in configuration order.
    fn route_data_nodes(
        &self,
        rule: &ShardingRule,
        table_rule: &TableRule,
    ) -> Result<Vec<DataNode>, RouteError> {
        let scope = self.scope();
        route_table_nodes(rule, table_rule, self.conditions, &scope)
    }

    // Every member constrained by its own predicates is routed alone, and all
    // of them must land on the same data sources. Members the statement does
    // not constrain inherit the representative's placement.
    fn check_binding_consistency(
        &self,
        rule: &ShardingRule,
        table_rule: &TableRule,
        bound_rules: &[&TableRule],
    ) -> Result<(), RouteError> {
        if self.conditions.is_empty() || bound_rules.is_empty() {
            return Ok(());
        }

        let mut baseline: Option<BTreeSet<String>> = None;
        for member in std::iter::once(table_rule).chain(bound_rules.iter().copied()) {
            let own = [member.logic_table()];
            if !constrains(rule, member, self.conditions, &own) {
                continue;
            }

            let nodes = route_table_nodes(rule, member, self.conditions, &own)?;
            let actual = data_source_set(&nodes);
            match &baseline {
                None => baseline = Some(actual),
                Some(expected) if *expected != actual => {
                    let group = rule.find_binding_group(self.logic_table).map_or_else(
                        || self.scope().iter().map(ToString::to_string).collect(),
                        |group| group.tables().to_vec(),
                    );

                    return Err(RouteError::BindingInconsistent {
                        group,
                        table: member.logic_table().to_string(),
                        expected: expected.iter().cloned().collect(),
                        actual: actual.into_iter().collect(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Route `table_rule` using predicates on any table in `scope`.
fn route_table_nodes(
    rule: &ShardingRule,
    table_rule: &TableRule,
    conditions: &ShardingConditions,
    scope: &[&str],
) -> Result<Vec<DataNode>, RouteError> {
    if !constrains(rule, table_rule, conditions, scope) {
        return Ok(table_rule.data_nodes().to_vec());
    }

    let database_strategy = rule.database_strategy(table_rule);
    let table_strategy = rule.table_strategy(table_rule);

    let mut positions = BTreeSet::new();
    for condition in conditions {
        let data_sources = route_level(
            table_rule,
            StrategyLevel::Database,
            database_strategy,
            table_rule.data_sources().to_vec(),
            condition,
            scope,
        )?;

        for data_source in data_sources {
            let candidates = table_rule
                .actual_tables(&data_source)
                .map(ToString::to_string)
                .collect();
            let tables = route_level(
                table_rule,
                StrategyLevel::Table,
                table_strategy,
                candidates,
                condition,
                scope,
            )?;

            positions.extend(
                tables
                    .iter()
                    .filter_map(|table| table_rule.node_position(&data_source, table)),
            );
        }
    }

    Ok(positions
        .into_iter()
        .filter_map(|position| table_rule.data_nodes().get(position).cloned())
        .collect())
}

/// Narrow `candidates` through the strategy at `level`. Without a strategy
/// or without matching predicates every candidate stays.
fn route_level(
    table_rule: &TableRule,
    level: StrategyLevel,
    strategy: Option<&StrategyRule>,
    candidates: Vec<String>,
    condition: &ShardingCondition,
    scope: &[&str],
) -> Result<Vec<String>, RouteError> {
    let Some(strategy) = strategy else {
        return Ok(candidates);
    };
    let values = condition.values_for(scope, strategy.columns());
    if values.is_empty() {
        return Ok(candidates);
    }

    sink::record(MetricsEvent::StrategyInvocation { level });
    let matched = strategy
        .adapter()
        .do_sharding(&candidates, &values)
        .map_err(|source| RouteError::Strategy {
            table: table_rule.logic_table().to_string(),
            level,
            source,
        })?;

    if let Some(target) = matched.iter().find(|target| !candidates.contains(target)) {
        return Err(RouteError::FabricatedTarget {
            table: table_rule.logic_table().to_string(),
            level,
            target: target.clone(),
        });
    }

    let routed: Vec<String> = candidates
        .into_iter()
        .filter(|candidate| matched.contains(candidate))
        .collect();
    if routed.is_empty() {
        return Err(RouteError::NoRouteTarget {
            table: table_rule.logic_table().to_string(),
            level,
        });
    }

    Ok(routed)
}

/// Whether any condition carries a value for either strategy's columns.
fn constrains(
    rule: &ShardingRule,
    table_rule: &TableRule,
    conditions: &ShardingConditions,
    scope: &[&str],
) -> bool {
    [rule.database_strategy(table_rule), rule.table_strategy(table_rule)]
        .into_iter()
        .flatten()
        .any(|strategy| conditions.touches(scope, strategy.columns()))
}

fn data_source_set(nodes: &[DataNode]) -> BTreeSet<String> {
    nodes.iter().map(|node| node.data_source.clone()).collect()
}
