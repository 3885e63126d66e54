//! Observability: routing and merge telemetry plus sink abstractions.
//!
//! Routing and merge code never touch counter state directly; every
//! observation flows through `MetricsEvent` into the active `MetricsSink`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EngineCounters, EngineSummary, EventOps, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
