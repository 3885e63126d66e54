use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for routing and merge work on this thread.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub engines: BTreeMap<String, EngineCounters>,
    pub merges: BTreeMap<String, u64>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Routing entrypoints
    pub route_calls: u64,
    pub route_failures: u64,
    pub table_units_routed: u64,

    // Strategy adapter invocations
    pub database_strategy_calls: u64,
    pub table_strategy_calls: u64,

    // Cartesian volume
    pub cartesian_products: u64,
    pub cartesian_units_max: u64,
    pub cartesian_warnings: u64,

    // Merge pipeline
    pub merges_built: u64,
    pub merge_inputs: u64,
    pub merge_read_failures: u64,
    pub cursors_closed: u64,
    pub shard_rows_read: u64,
}

///
/// EngineCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EngineCounters {
    pub calls: u64,
    pub failures: u64,
    pub table_units: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
/// Counter snapshot plus derived per-engine summaries.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    pub engine_summaries: Vec<EngineSummary>,
}

///
/// EngineSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EngineSummary {
    pub engine: String,
    pub calls: u64,
    pub failures: u64,
    pub table_units: u64,
    pub avg_units_per_route: f64,
}

/// Build a metrics report by inspecting in-memory counters only.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let engine_summaries = snap
        .engines
        .iter()
        .map(|(engine, counters)| {
            let succeeded = counters.calls.saturating_sub(counters.failures);
            let avg_units_per_route = if succeeded > 0 {
                counters.table_units as f64 / succeeded as f64
            } else {
                0.0
            };

            EngineSummary {
                engine: engine.clone(),
                calls: counters.calls,
                failures: counters.failures,
                table_units: counters.table_units,
                avg_units_per_route,
            }
        })
        .collect();

    EventReport {
        counters: snap,
        engine_summaries,
    }
}
