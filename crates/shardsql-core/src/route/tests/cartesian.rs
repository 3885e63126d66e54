use super::rendered;
use crate::{
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    props::ShardingProps,
    route::{
        CartesianRoutingEngine, RouteError, RoutingResult, RoutingUnit, TableUnit, route,
    },
    statement::StatementContext,
    test_support::{order_fixture, order_rule},
};
use std::{cell::RefCell, rc::Rc};

fn single(ds: &str, logical: &str, actual: &str) -> TableUnit {
    TableUnit::new(ds, vec![RoutingUnit::new(ds, logical, actual)])
}

fn routed(units: &[(&str, &str, &str)]) -> RoutingResult {
    units
        .iter()
        .map(|(ds, logical, actual)| single(ds, logical, actual))
        .collect()
}

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
fn product_counts_branching_per_data_source() {
    let engine = CartesianRoutingEngine::new(vec![
        routed(&[("ds_0", "a", "a_0"), ("ds_0", "a", "a_1")]),
        routed(&[("ds_0", "b", "b_0"), ("ds_0", "b", "b_1")]),
    ]);

    assert_eq!(engine.size(), 4);
    let result = engine.route(&order_rule()).expect("route");

    assert_eq!(
        rendered(&result),
        vec![
            "ds_0[a->a_0, b->b_0]",
            "ds_0[a->a_0, b->b_1]",
            "ds_0[a->a_1, b->b_0]",
            "ds_0[a->a_1, b->b_1]",
        ]
    );
}

#[test]
fn data_sources_outside_the_intersection_are_dropped() {
    let engine = CartesianRoutingEngine::new(vec![
        routed(&[("ds_0", "a", "a_0"), ("ds_1", "a", "a_0"), ("ds_2", "a", "a_0")]),
        routed(&[("ds_2", "b", "b_0"), ("ds_1", "b", "b_0"), ("ds_1", "b", "b_1")]),
    ]);

    assert_eq!(engine.data_source_intersection(), vec!["ds_1", "ds_2"]);
    assert_eq!(engine.size(), 3);

    let result = engine.route(&order_rule()).expect("route");
    assert_eq!(result.data_source_names(), vec!["ds_1", "ds_2"]);
}

#[test]
fn disjoint_inputs_name_every_table() {
    let engine = CartesianRoutingEngine::new(vec![
        routed(&[("ds_0", "a", "a_0")]),
        routed(&[("ds_1", "b", "b_0")]),
    ]);

    let err = engine.route(&order_rule()).expect_err("disjoint");

    assert!(matches!(err, RouteError::DisjointDataSources { ref tables } if tables == &["a", "b"]));
}

#[test]
fn cap_rejects_before_materializing() {
    let fixture = order_fixture(ShardingProps::default().with_max_cartesian_units(Some(3)));

    let err = route(&StatementContext::select(["t_order", "t_user"]), &fixture.rule)
        .expect_err("over the cap");

    assert!(matches!(
        err,
        RouteError::CartesianLimitExceeded { size: 8, limit: 3 }
    ));
}

#[test]
fn warn_threshold_is_reported_without_failing() {
    let fixture = order_fixture(ShardingProps::default().with_cartesian_warn_threshold(Some(4)));
    let sink = Rc::new(CaptureSink::default());

    let result = with_metrics_sink(sink.clone(), || {
        route(&StatementContext::select(["t_order", "t_user"]), &fixture.rule)
    })
    .expect("route");

    assert_eq!(result.len(), 8);
    assert!(
        sink.events.borrow().contains(&MetricsEvent::CartesianProduct {
            units: 8,
            above_threshold: true,
        }),
        "cartesian size must be reported: {:?}",
        sink.events.borrow()
    );
}
