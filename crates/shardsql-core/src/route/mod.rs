//! Module: route
//! Responsibility: turn a statement context and a rule snapshot into the
//! physical table units the statement must run against.
//! Does not own: statement parsing, strategy algorithms, or execution.
//! Boundary: pure and synchronous; every failure surfaces before execution.

mod broadcast;
mod cartesian;
mod complex;
mod condition;
mod error;
mod result;
mod standard;

#[cfg(test)]
mod tests;

use crate::{
    obs::sink::RouteSpan,
    rule::ShardingRule,
    statement::{DalKind, StatementContext, StatementKind},
};

// re-exports
pub use broadcast::UnicastRoutingEngine;
pub use cartesian::CartesianRoutingEngine;
pub use complex::ComplexRoutingEngine;
pub use condition::{
    ShardingCondition, ShardingConditionValue, ShardingConditions, ShardingValue, ValueRange,
};
pub use error::RouteError;
pub use result::{RoutingResult, RoutingUnit, TableUnit};
pub use standard::StandardRoutingEngine;

///
/// RouteEngineKind
///
/// Stable label for each routing engine, used by metrics and logs.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RouteEngineKind {
    Standard,
    Complex,
    DatabaseBroadcast,
    TableBroadcast,
    DataSourceGroupBroadcast,
    Unicast,
    Ignore,
}

impl RouteEngineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Complex => "complex",
            Self::DatabaseBroadcast => "database_broadcast",
            Self::TableBroadcast => "table_broadcast",
            Self::DataSourceGroupBroadcast => "data_source_group_broadcast",
            Self::Unicast => "unicast",
            Self::Ignore => "ignore",
        }
    }
}

///
/// RoutingEngine
///
/// Engine chosen for one statement. Each variant carries exactly what its
/// `route` needs; selection never touches a strategy adapter.
///

#[derive(Debug)]
pub enum RoutingEngine<'a> {
    Standard(StandardRoutingEngine<'a>),
    Complex(ComplexRoutingEngine<'a>),
    DatabaseBroadcast,
    TableBroadcast { tables: Vec<&'a str> },
    DataSourceGroupBroadcast,
    Unicast(UnicastRoutingEngine<'a>),
    Ignore,
}

impl<'a> RoutingEngine<'a> {
    /// Pick the engine for `ctx`.
    pub fn select(ctx: &'a StatementContext, rule: &ShardingRule) -> Result<Self, RouteError> {
        let tables = ctx.tables();

        match ctx.kind() {
            StatementKind::Tcl => Ok(Self::DatabaseBroadcast),
            StatementKind::Ddl => {
                let sharded = rule.sharding_logic_tables(tables);
                if sharded.is_empty() {
                    Ok(Self::Ignore)
                } else {
                    Ok(Self::TableBroadcast { tables: sharded })
                }
            }
            StatementKind::Dal(dal) => Ok(match dal {
                DalKind::ShowDatabases | DalKind::Set => Self::DatabaseBroadcast,
                DalKind::ShowTables => Self::DataSourceGroupBroadcast,
                DalKind::ShowCreateTable | DalKind::Other => {
                    Self::Unicast(UnicastRoutingEngine::new(table_refs(tables)))
                }
            }),
            StatementKind::Select
            | StatementKind::Insert
            | StatementKind::Update
            | StatementKind::Delete => Self::select_dml(ctx, rule),
        }
    }

    fn select_dml(ctx: &'a StatementContext, rule: &ShardingRule) -> Result<Self, RouteError> {
        let tables = ctx.tables();
        if rule.is_all_broadcast_tables(tables) {
            return Ok(if ctx.kind().is_query() {
                Self::Unicast(UnicastRoutingEngine::new(table_refs(tables)))
            } else {
                Self::DatabaseBroadcast
            });
        }

        let unconfigured = rule.unconfigured_tables(tables);
        if !unconfigured.is_empty() {
            return Err(RouteError::RuleNotFound {
                tables: unconfigured,
            });
        }

        if tables.is_empty() || ctx.conditions().is_always_false() {
            return Ok(Self::Unicast(UnicastRoutingEngine::new(table_refs(tables))));
        }

        let sharded = rule.sharding_logic_tables(tables);
        let conditions = ctx.conditions();
        match sharded.as_slice() {
            [single] => Ok(Self::Standard(StandardRoutingEngine::new(*single, conditions))),
            _ if rule.is_all_binding_tables(&sharded) => {
                let representative = binding_representative(ctx, &sharded);
                let bound = sharded
                    .iter()
                    .copied()
                    .filter(|table| !table.eq_ignore_ascii_case(representative))
                    .collect();

                Ok(Self::Standard(
                    StandardRoutingEngine::new(representative, conditions).with_bound_tables(bound),
                ))
            }
            _ => Ok(Self::Complex(ComplexRoutingEngine::new(sharded, conditions))),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RouteEngineKind {
        match self {
            Self::Standard(_) => RouteEngineKind::Standard,
            Self::Complex(_) => RouteEngineKind::Complex,
            Self::DatabaseBroadcast => RouteEngineKind::DatabaseBroadcast,
            Self::TableBroadcast { .. } => RouteEngineKind::TableBroadcast,
            Self::DataSourceGroupBroadcast => RouteEngineKind::DataSourceGroupBroadcast,
            Self::Unicast(_) => RouteEngineKind::Unicast,
            Self::Ignore => RouteEngineKind::Ignore,
        }
    }

    pub fn route(&self, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
        match self {
            Self::Standard(engine) => engine.route(rule),
            Self::Complex(engine) => engine.route(rule),
            Self::DatabaseBroadcast => Ok(broadcast::route_databases(rule)),
            Self::TableBroadcast { tables } => broadcast::route_tables(rule, tables),
            Self::DataSourceGroupBroadcast => Ok(broadcast::route_data_source_groups(rule)),
            Self::Unicast(engine) => engine.route(rule),
            Self::Ignore => Ok(RoutingResult::new()),
        }
    }
}

/// Route one statement against one rule snapshot.
pub fn route(ctx: &StatementContext, rule: &ShardingRule) -> Result<RoutingResult, RouteError> {
    let engine = RoutingEngine::select(ctx, rule).inspect_err(|err| {
        tracing::debug!(error = %err, "route engine selection failed");
    })?;
    let kind = engine.kind();

    let mut span = RouteSpan::new(kind);
    let result = engine.route(rule).inspect_err(|err| {
        tracing::debug!(engine = kind.as_str(), error = %err, "routing failed");
    })?;
    span.set_table_units(result.len() as u64);

    tracing::debug!(
        engine = kind.as_str(),
        table_units = result.len(),
        data_sources = result.data_source_names().len(),
        "routed statement"
    );

    Ok(result)
}

fn table_refs(tables: &[String]) -> Vec<&str> {
    tables.iter().map(String::as_str).collect()
}

// The representative is the first bound table a predicate names, so the
// strategy runs against the table the values were written for.
fn binding_representative<'a>(ctx: &StatementContext, sharded: &[&'a str]) -> &'a str {
    ctx.conditions()
        .first_table()
        .and_then(|named| {
            sharded
                .iter()
                .copied()
                .find(|table| table.eq_ignore_ascii_case(named))
        })
        .or_else(|| sharded.first().copied())
        .unwrap_or_default()
}
