use crate::ConfigError;
use shardsql_core::{error::InternalError, rule::ShardingStrategyAdapter};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Tag meaning "no narrowing at this level".
pub const NONE_STRATEGY: &str = "none";

/// Free-form `props` of one strategy declaration, values rendered as text.
pub type StrategyProps = BTreeMap<String, String>;

type StrategyFactory =
    dyn Fn(&StrategyProps) -> Result<Arc<dyn ShardingStrategyAdapter>, InternalError> + Send + Sync;

///
/// StrategyRegistry
///
/// Explicit map from strategy type tags to adapter factories. Tags are
/// matched case-insensitively. Every tag in a rule config is resolved once,
/// at load time; the registry ships only `none`.
///

pub struct StrategyRegistry {
    factories: BTreeMap<String, Box<StrategyFactory>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register `factory` under `tag`. Tags, `none` included, register once.
    pub fn register<F>(&mut self, tag: &str, factory: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&StrategyProps) -> Result<Arc<dyn ShardingStrategyAdapter>, InternalError>
            + Send
            + Sync
            + 'static,
    {
        let key = tag.to_ascii_lowercase();
        if key == NONE_STRATEGY || self.factories.contains_key(&key) {
            return Err(ConfigError::DuplicateStrategy {
                tag: tag.to_string(),
            });
        }
        self.factories.insert(key, Box::new(factory));

        Ok(self)
    }

    /// Builder-style `register`.
    pub fn with<F>(mut self, tag: &str, factory: F) -> Result<Self, ConfigError>
    where
        F: Fn(&StrategyProps) -> Result<Arc<dyn ShardingStrategyAdapter>, InternalError>
            + Send
            + Sync
            + 'static,
    {
        self.register(tag, factory)?;
        Ok(self)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        let key = tag.to_ascii_lowercase();
        key == NONE_STRATEGY || self.factories.contains_key(&key)
    }

    /// Registered tags, `none` first.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        std::iter::once(NONE_STRATEGY).chain(self.factories.keys().map(String::as_str))
    }

    /// Build the adapter for `tag`. `Ok(None)` for `none`.
    pub fn resolve(
        &self,
        owner: &str,
        tag: &str,
        props: &StrategyProps,
    ) -> Result<Option<Arc<dyn ShardingStrategyAdapter>>, ConfigError> {
        let key = tag.to_ascii_lowercase();
        if key == NONE_STRATEGY {
            return Ok(None);
        }

        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| ConfigError::UnknownStrategy {
                owner: owner.to_string(),
                tag: tag.to_string(),
            })?;

        factory(props)
            .map(Some)
            .map_err(|source| ConfigError::StrategyInit {
                owner: owner.to_string(),
                tag: tag.to_string(),
                source,
            })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags()).finish()
    }
}

///
/// TESTS
///
