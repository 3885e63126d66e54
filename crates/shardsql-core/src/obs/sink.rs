//! Metrics sink boundary.
//!
//! Routing and merge logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between engine logic
//! and the thread-local metrics state.
use crate::{merge::MergedResultKind, obs::metrics, route::RouteEngineKind, rule::StrategyLevel};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    RouteStart {
        engine: RouteEngineKind,
    },
    RouteFinish {
        engine: RouteEngineKind,
        table_units: u64,
    },
    RouteFailed {
        engine: RouteEngineKind,
    },
    StrategyInvocation {
        level: StrategyLevel,
    },
    CartesianProduct {
        units: u64,
        above_threshold: bool,
    },
    MergeBuilt {
        kind: MergedResultKind,
        inputs: u64,
    },
    MergeReadFailed {
        unit: usize,
    },
    CursorClosed {
        rows_read: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::RouteStart { engine } => {
                metrics::with_state_mut(|m| {
                    m.ops.route_calls = m.ops.route_calls.saturating_add(1);
                    let entry = m.engines.entry(engine.as_str().to_string()).or_default();
                    entry.calls = entry.calls.saturating_add(1);
                });
            }

            MetricsEvent::RouteFinish {
                engine,
                table_units,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.table_units_routed = m.ops.table_units_routed.saturating_add(table_units);
                    let entry = m.engines.entry(engine.as_str().to_string()).or_default();
                    entry.table_units = entry.table_units.saturating_add(table_units);
                });
            }

            MetricsEvent::RouteFailed { engine } => {
                metrics::with_state_mut(|m| {
                    m.ops.route_failures = m.ops.route_failures.saturating_add(1);
                    let entry = m.engines.entry(engine.as_str().to_string()).or_default();
                    entry.failures = entry.failures.saturating_add(1);
                });
            }

            MetricsEvent::StrategyInvocation { level } => {
                metrics::with_state_mut(|m| match level {
                    StrategyLevel::Database => {
                        m.ops.database_strategy_calls =
                            m.ops.database_strategy_calls.saturating_add(1);
                    }
                    StrategyLevel::Table => {
                        m.ops.table_strategy_calls = m.ops.table_strategy_calls.saturating_add(1);
                    }
                });
            }

            MetricsEvent::CartesianProduct {
                units,
                above_threshold,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.cartesian_products = m.ops.cartesian_products.saturating_add(1);
                    m.ops.cartesian_units_max = m.ops.cartesian_units_max.max(units);
                    if above_threshold {
                        m.ops.cartesian_warnings = m.ops.cartesian_warnings.saturating_add(1);
                    }
                });
            }

            MetricsEvent::MergeBuilt { kind, inputs } => {
                metrics::with_state_mut(|m| {
                    m.ops.merges_built = m.ops.merges_built.saturating_add(1);
                    m.ops.merge_inputs = m.ops.merge_inputs.saturating_add(inputs);
                    let entry = m.merges.entry(kind.as_str().to_string()).or_default();
                    *entry = entry.saturating_add(1);
                });
            }

            MetricsEvent::MergeReadFailed { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.merge_read_failures = m.ops.merge_read_failures.saturating_add(1);
                });
            }

            MetricsEvent::CursorClosed { rows_read } => {
                metrics::with_state_mut(|m| {
                    m.ops.cursors_closed = m.ops.cursors_closed.saturating_add(1);
                    m.ops.shard_rows_read = m.ops.shard_rows_read.saturating_add(rows_read);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    // Clone out of the slot so a sink may itself record without re-borrowing.
    let installed = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match installed {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for reporting and test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// RouteSpan
/// RAII guard that emits start/finish metrics events for one routing call.
/// A span dropped without recorded units counts as a failure.
///

pub(crate) struct RouteSpan {
    engine: RouteEngineKind,
    table_units: Option<u64>,
}

impl RouteSpan {
    #[must_use]
    pub(crate) fn new(engine: RouteEngineKind) -> Self {
        record(MetricsEvent::RouteStart { engine });

        Self {
            engine,
            table_units: None,
        }
    }

    pub(crate) const fn set_table_units(&mut self, table_units: u64) {
        self.table_units = Some(table_units);
    }
}

impl Drop for RouteSpan {
    fn drop(&mut self) {
        let event = match self.table_units {
            Some(table_units) => MetricsEvent::RouteFinish {
                engine: self.engine,
                table_units,
            },
            None => MetricsEvent::RouteFailed {
                engine: self.engine,
            },
        };
        record(event);
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink {
        events: RefCell<Vec<MetricsEvent>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[test]
    fn override_captures_events_and_restores_global_sink() {
        metrics_reset_all();
        let capture = Rc::new(CaptureSink::default());

        with_metrics_sink(capture.clone(), || {
            let mut span = RouteSpan::new(RouteEngineKind::Standard);
            span.set_table_units(4);
        });

        assert_eq!(
            capture.events.borrow().as_slice(),
            &[
                MetricsEvent::RouteStart {
                    engine: RouteEngineKind::Standard
                },
                MetricsEvent::RouteFinish {
                    engine: RouteEngineKind::Standard,
                    table_units: 4
                },
            ]
        );
        assert_eq!(
            metrics_report().counters.ops.route_calls,
            0,
            "override must shadow the global sink"
        );

        drop(RouteSpan::new(RouteEngineKind::Complex));

        let report = metrics_report();
        assert_eq!(report.counters.ops.route_calls, 1);
        assert_eq!(report.counters.ops.route_failures, 1);
        assert_eq!(report.engine_summaries[0].engine, "complex");
    }

    #[test]
    fn global_sink_tracks_cartesian_maximum() {
        metrics_reset_all();

        record(MetricsEvent::CartesianProduct {
            units: 8,
            above_threshold: false,
        });
        record(MetricsEvent::CartesianProduct {
            units: 3,
            above_threshold: true,
        });

        let ops = metrics_report().counters.ops;
        assert_eq!(ops.cartesian_products, 2);
        assert_eq!(ops.cartesian_units_max, 8);
        assert_eq!(ops.cartesian_warnings, 1);
    }

    #[test]
    fn report_exports_as_json_keyed_by_merge_kind() {
        metrics_reset_all();

        record(MetricsEvent::MergeBuilt {
            kind: MergedResultKind::OrderBy,
            inputs: 3,
        });
        record(MetricsEvent::CursorClosed { rows_read: 5 });

        let json = serde_json::to_value(metrics_report()).expect("serialize report");
        assert_eq!(json["counters"]["merges"]["order_by"], 1);
        assert_eq!(json["counters"]["ops"]["merge_inputs"], 3);
        assert_eq!(json["counters"]["ops"]["shard_rows_read"], 5);

        let back: metrics::EventReport = serde_json::from_value(json).expect("deserialize report");
        assert_eq!(back.counters.ops.cursors_closed, 1);
    }
}
