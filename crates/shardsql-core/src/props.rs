use serde::Deserialize;

/// Default logical database name reported by `SHOW DATABASES`.
pub const DEFAULT_LOGIC_DATABASE_NAME: &str = "logic_db";

/// Cartesian unit count above which a warning is logged.
pub const DEFAULT_CARTESIAN_WARN_THRESHOLD: usize = 1024;

///
/// ShardingProps
///
/// Runtime policy knobs carried by a rule snapshot.
/// Every field has a default so partial config tables deserialize.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShardingProps {
    /// Re-route every binding-group member independently and fail on
    /// data-source disagreement.
    pub check_binding_consistency: bool,

    /// Cartesian products larger than this log a warning.
    pub cartesian_warn_threshold: Option<usize>,

    /// Cartesian products larger than this are rejected before
    /// materialization. `None` computes unconditionally.
    pub max_cartesian_units: Option<usize>,

    pub logic_database_name: String,
}

impl ShardingProps {
    #[must_use]
    pub fn with_binding_consistency_check(mut self, enabled: bool) -> Self {
        self.check_binding_consistency = enabled;
        self
    }

    #[must_use]
    pub fn with_max_cartesian_units(mut self, limit: Option<usize>) -> Self {
        self.max_cartesian_units = limit;
        self
    }

    #[must_use]
    pub fn with_cartesian_warn_threshold(mut self, threshold: Option<usize>) -> Self {
        self.cartesian_warn_threshold = threshold;
        self
    }
}

impl Default for ShardingProps {
    fn default() -> Self {
        Self {
            check_binding_consistency: false,
            cartesian_warn_threshold: Some(DEFAULT_CARTESIAN_WARN_THRESHOLD),
            max_cartesian_units: None,
            logic_database_name: DEFAULT_LOGIC_DATABASE_NAME.to_string(),
        }
    }
}
