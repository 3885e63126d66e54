use crate::{ConfigError, StrategyRegistry, inline, registry::StrategyProps};
use serde::Deserialize;
use shardsql_core::{
    props::ShardingProps,
    rule::{DataNode, ShardingRule, StrategyRule, TableRule},
};
use std::collections::BTreeMap;

///
/// RuleConfig
///
/// Declarative form of a sharding rule, as written in TOML.
///

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub props: ShardingProps,

    #[serde(default)]
    pub data_sources: Vec<String>,

    #[serde(default)]
    pub tables: Vec<TableConfig>,

    #[serde(default)]
    pub binding_groups: Vec<Vec<String>>,

    #[serde(default)]
    pub broadcast_tables: Vec<String>,

    #[serde(default)]
    pub default_database_strategy: Option<StrategyConfig>,

    #[serde(default)]
    pub default_table_strategy: Option<StrategyConfig>,
}

///
/// TableConfig
///
/// One sharded logical table. Without `actual_data_nodes` the table lives
/// under its own name in every configured data source.
///

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,

    #[serde(default)]
    pub actual_data_nodes: Option<String>,

    #[serde(default)]
    pub database_strategy: Option<StrategyConfig>,

    #[serde(default)]
    pub table_strategy: Option<StrategyConfig>,
}

///
/// StrategyConfig
///

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub props: BTreeMap<String, toml::Value>,
}

impl StrategyConfig {
    // TOML strings keep their text; other values use their TOML rendering.
    fn props(&self) -> StrategyProps {
        self.props
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }

    fn resolve(
        &self,
        owner: &str,
        registry: &StrategyRegistry,
    ) -> Result<Option<StrategyRule>, ConfigError> {
        let adapter = registry.resolve(owner, &self.kind, &self.props())?;

        Ok(adapter.map(|adapter| StrategyRule::new(self.columns.iter().cloned(), adapter)))
    }
}

impl RuleConfig {
    /// Resolve strategies, expand data nodes, and build the rule snapshot.
    pub fn into_rule(self, registry: &StrategyRegistry) -> Result<ShardingRule, ConfigError> {
        let mut builder = ShardingRule::builder()
            .data_sources(self.data_sources.iter().cloned())
            .props(self.props);

        for table in &self.tables {
            builder = builder.table(table.to_table_rule(&self.data_sources, registry)?);
        }
        for group in self.binding_groups {
            builder = builder.binding_group(group);
        }
        for table in self.broadcast_tables {
            builder = builder.broadcast_table(table);
        }
        if let Some(strategy) = &self.default_database_strategy
            && let Some(rule) = strategy.resolve("the default database strategy", registry)?
        {
            builder = builder.default_database_strategy(rule);
        }
        if let Some(strategy) = &self.default_table_strategy
            && let Some(rule) = strategy.resolve("the default table strategy", registry)?
        {
            builder = builder.default_table_strategy(rule);
        }

        let rule = builder.build()?;
        tracing::debug!(
            data_sources = rule.data_sources().len(),
            tables = rule.table_rules().len(),
            binding_groups = rule.binding_groups().len(),
            broadcast_tables = rule.broadcast_tables().len(),
            "loaded sharding rule"
        );

        Ok(rule)
    }
}

impl TableConfig {
    fn data_nodes(&self, data_sources: &[String]) -> Result<Vec<DataNode>, ConfigError> {
        match &self.actual_data_nodes {
            Some(expression) => inline::expand(expression)?
                .iter()
                .map(|node| node.parse::<DataNode>().map_err(ConfigError::from))
                .collect(),
            None if data_sources.is_empty() => Err(ConfigError::MissingDataNodes {
                table: self.name.clone(),
            }),
            None => Ok(data_sources
                .iter()
                .map(|ds| DataNode::new(ds.clone(), self.name.clone()))
                .collect()),
        }
    }

    fn to_table_rule(
        &self,
        data_sources: &[String],
        registry: &StrategyRegistry,
    ) -> Result<TableRule, ConfigError> {
        let owner = format!("table '{}'", self.name);
        let mut rule = TableRule::new(self.name.clone(), self.data_nodes(data_sources)?)?;

        if let Some(strategy) = &self.database_strategy
            && let Some(resolved) = strategy.resolve(&owner, registry)?
        {
            rule = rule.with_database_strategy(resolved)?;
        }
        if let Some(strategy) = &self.table_strategy
            && let Some(resolved) = strategy.resolve(&owner, registry)?
        {
            rule = rule.with_table_strategy(resolved)?;
        }

        Ok(rule)
    }
}
