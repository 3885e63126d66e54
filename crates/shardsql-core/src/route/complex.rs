use crate::{
    route::{
        CartesianRoutingEngine, RouteError, RoutingResult, ShardingConditions,
        StandardRoutingEngine,
    },
    rule::ShardingRule,
};

///
/// ComplexRoutingEngine
///
/// Routes a statement over several sharded tables. Tables bound together
/// share one standard route; independent routes are combined per data
/// source by the cartesian engine.
///

#[derive(Clone, Debug)]
pub struct ComplexRoutingEngine<'a> {
    tables: Vec<&'a str>,
    conditions: &'a ShardingConditions,
}

impl<'a> ComplexRoutingEngine<'a> {
    #[must_use]
    pub const fn new(tables: Vec<&'a str>, conditions: &'a ShardingConditions) -> Self {
        Self { tables, conditions }
    }

    #[must_use]
    pub fn tables(&self) -> &[&'a str] {
        &self.tables
    }

    pub fn route(&self, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
        let mut covered: Vec<&str> = Vec::new();
        let mut results = Vec::new();

        for &table in &self.tables {
            if rule.is_broadcast_table(table) || is_covered(&covered, table) {
                continue;
            }
            if !rule.is_sharding_table(table) {
                return Err(RouteError::RuleNotFound {
                    tables: vec![table.to_string()],
                });
            }

            let bound: Vec<&str> = rule
                .find_binding_group(table)
                .map(|group| group.members_in(&self.tables))
                .unwrap_or_default()
                .into_iter()
                .filter(|member| !member.eq_ignore_ascii_case(table))
                .collect();

            covered.push(table);
            covered.extend(bound.iter().copied());

            let engine =
                StandardRoutingEngine::new(table, self.conditions).with_bound_tables(bound);
            results.push(engine.route(rule)?);
        }

        match results.len() {
            0 => Err(RouteError::RuleNotFound {
                tables: self.tables.iter().map(ToString::to_string).collect(),
            }),
            1 => Ok(results.remove(0)),
            _ => CartesianRoutingEngine::new(results).route(rule),
        }
    }
}

fn is_covered(covered: &[&str], table: &str) -> bool {
    covered.iter().any(|seen| seen.eq_ignore_ascii_case(table))
}
