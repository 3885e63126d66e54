use crate::{
    obs::sink::{self, MetricsEvent},
    route::{RouteError, RoutingResult, RoutingUnit, TableUnit},
    rule::ShardingRule,
};

///
/// CartesianRoutingEngine
///
/// Combines independent routing results into the per-data-source cross
/// product of their table units. Output grows with the product of every
/// input's branching factor, so the size is computed before any unit is
/// materialized.
///

#[derive(Clone, Debug)]
pub struct CartesianRoutingEngine {
    inputs: Vec<RoutingResult>,
}

impl CartesianRoutingEngine {
    #[must_use]
    pub const fn new(inputs: Vec<RoutingResult>) -> Self {
        Self { inputs }
    }

    /// Data sources every input reaches, in the first input's order.
    #[must_use]
    pub fn data_source_intersection(&self) -> Vec<&str> {
        let Some((first, rest)) = self.inputs.split_first() else {
            return Vec::new();
        };

        first
            .data_source_names()
            .into_iter()
            .filter(|ds| rest.iter().all(|input| input.table_units_in(ds).next().is_some()))
            .collect()
    }

    /// Number of table units `route` would emit. Saturates at `usize::MAX`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data_source_intersection()
            .into_iter()
            .map(|ds| {
                self.inputs
                    .iter()
                    .map(|input| input.table_units_in(ds).count())
                    .fold(1_usize, usize::saturating_mul)
            })
            .fold(0_usize, usize::saturating_add)
    }

    pub fn route(&self, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
        let data_sources = self.data_source_intersection();
        if data_sources.is_empty() {
            return Err(RouteError::DisjointDataSources {
                tables: self.logic_tables(),
            });
        }

        let size = self.size();
        let props = rule.props();
        let above_threshold = props
            .cartesian_warn_threshold
            .is_some_and(|threshold| size > threshold);
        sink::record(MetricsEvent::CartesianProduct {
            units: size as u64,
            above_threshold,
        });

        if let Some(limit) = props.max_cartesian_units
            && size > limit
        {
            return Err(RouteError::CartesianLimitExceeded { size, limit });
        }
        if above_threshold {
            tracing::warn!(
                size,
                tables = ?self.logic_tables(),
                "cartesian routing produced a large number of table units"
            );
        }

        let mut result = RoutingResult::new();
        for ds in data_sources {
            let alternatives: Vec<Vec<&TableUnit>> = self
                .inputs
                .iter()
                .map(|input| input.table_units_in(ds).collect())
                .collect();

            for combination in Odometer::new(&alternatives) {
                let units: Vec<RoutingUnit> = combination
                    .iter()
                    .flat_map(|unit| unit.routing_units().iter().cloned())
                    .collect();
                result.push(TableUnit::new(ds, units));
            }
        }

        Ok(result)
    }

    // Logical tables across every input, first-seen order.
    fn logic_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for unit in self.inputs.iter().flat_map(RoutingResult::table_units) {
            for routing in unit.routing_units() {
                if !tables.contains(&routing.logical_table) {
                    tables.push(routing.logical_table.clone());
                }
            }
        }

        tables
    }
}

///
/// Odometer
///
/// Walks the cross product of `alternatives` with the first slot varying
/// slowest. Yields nothing when any slot is empty.
///

struct Odometer<'a, T> {
    alternatives: &'a [Vec<T>],
    cursor: Vec<usize>,
    done: bool,
}

impl<'a, T> Odometer<'a, T> {
    fn new(alternatives: &'a [Vec<T>]) -> Self {
        Self {
            alternatives,
            cursor: vec![0; alternatives.len()],
            done: alternatives.iter().any(Vec::is_empty),
        }
    }
}

impl<T: Copy> Iterator for Odometer<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = self
            .cursor
            .iter()
            .zip(self.alternatives)
            .map(|(&index, slot)| slot[index])
            .collect();

        // advance the last slot, carrying leftwards
        self.done = true;
        for (index, slot) in self.cursor.iter_mut().zip(self.alternatives).rev() {
            *index += 1;
            if *index < slot.len() {
                self.done = false;
                break;
            }
            *index = 0;
        }

        Some(item)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odometer_varies_last_slot_fastest() {
        let alternatives = vec![vec![1, 2], vec![10, 20, 30]];

        let product: Vec<Vec<i32>> = Odometer::new(&alternatives).collect();

        assert_eq!(
            product,
            vec![
                vec![1, 10],
                vec![1, 20],
                vec![1, 30],
                vec![2, 10],
                vec![2, 20],
                vec![2, 30],
            ]
        );
    }

    #[test]
    fn odometer_with_empty_slot_yields_nothing() {
        let alternatives: Vec<Vec<i32>> = vec![vec![1], Vec::new()];

        assert_eq!(Odometer::new(&alternatives).count(), 0);
    }
}
