//! Declarative sharding-rule configuration for shardsql.
//!
//! A TOML document describes data sources, sharded tables with their data
//! nodes and strategies, binding groups, and broadcast tables. Strategy type
//! tags resolve through an explicit [`StrategyRegistry`] when the document
//! is loaded; nothing is looked up later.

mod error;
pub mod inline;
mod model;
mod registry;


use shardsql_core::rule::ShardingRule;
use std::path::Path;

// re-exports
pub use error::ConfigError;
pub use model::{RuleConfig, StrategyConfig, TableConfig};
pub use registry::{NONE_STRATEGY, StrategyProps, StrategyRegistry};

/// Parse a TOML rule document.
pub fn parse_config(text: &str) -> Result<RuleConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Parse and build a rule snapshot from TOML text.
pub fn load_rule(text: &str, registry: &StrategyRegistry) -> Result<ShardingRule, ConfigError> {
    parse_config(text)?.into_rule(registry)
}

/// Read and build a rule snapshot from a TOML file.
pub fn load_rule_from_path(
    path: impl AsRef<Path>,
    registry: &StrategyRegistry,
) -> Result<ShardingRule, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_rule(&text, registry)
}
