use super::{eq, rendered, select_where};
use crate::{
    error::ErrorClass,
    props::ShardingProps,
    route::{
        RouteError, ShardingCondition, ShardingConditionValue, ShardingConditions, ValueRange,
        route,
    },
    rule::{ShardingRule, StrategyLevel, TableRule},
    statement::StatementContext,
    test_support::{
        FabricatingAdapter, FailingAdapter, ModuloAdapter, nodes, order_fixture, order_rule,
        strategy,
    },
};

fn single_table_rule(table_rule: TableRule) -> ShardingRule {
    ShardingRule::builder()
        .table(table_rule)
        .build()
        .expect("sharding rule")
}

#[test]
fn no_conditions_broadcasts_in_configuration_order() {
    let rule = order_rule();

    let result = route(&StatementContext::select(["t_order"]), &rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec![
            "ds_0[t_order->t_order_0]",
            "ds_0[t_order->t_order_1]",
            "ds_1[t_order->t_order_0]",
            "ds_1[t_order->t_order_1]",
        ]
    );
}

#[test]
fn precise_values_route_to_one_node() {
    let rule = order_rule();
    let ctx = select_where(
        ["t_order"],
        [eq("t_order", "user_id", 1), eq("t_order", "order_id", 2)],
    );

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(rendered(&result), vec!["ds_1[t_order->t_order_0]"]);
}

#[test]
fn in_list_unions_data_sources() {
    let rule = order_rule();
    let ctx = select_where(
        ["t_order"],
        [
            ShardingConditionValue::in_list("t_order", "user_id", [1_i64, 2]),
            eq("t_order", "order_id", 1),
        ],
    );

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_0[t_order->t_order_1]", "ds_1[t_order->t_order_1]"]
    );
}

#[test]
fn separate_conditions_are_unioned() {
    let rule = order_rule();
    let ctx = StatementContext::select(["t_order"]).with_conditions(ShardingConditions::new([
        ShardingCondition::new([eq("t_order", "user_id", 1), eq("t_order", "order_id", 1)]),
        ShardingCondition::new([eq("t_order", "user_id", 0), eq("t_order", "order_id", 0)]),
    ]));

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_0[t_order->t_order_0]", "ds_1[t_order->t_order_1]"],
        "output follows configuration order, not condition order"
    );
}

#[test]
fn range_values_keep_every_candidate_the_adapter_keeps() {
    let rule = order_rule();
    let ctx = select_where(
        ["t_order"],
        [
            ShardingConditionValue::range("t_order", "user_id", ValueRange::between(1_i64, 10_i64)),
            eq("t_order", "order_id", 0),
        ],
    );

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_0[t_order->t_order_0]", "ds_1[t_order->t_order_0]"]
    );
}

#[test]
fn predicates_on_other_columns_broadcast() {
    let rule = order_rule();
    let ctx = select_where(["t_order"], [eq("t_order", "status", 1)]);

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(result.len(), 4);
}

#[test]
fn bound_table_follows_representative_without_strategy_calls() {
    let fixture = order_fixture(ShardingProps::default());
    let ctx = select_where(
        ["t_order", "t_order_item"],
        [eq("t_order", "user_id", 1), eq("t_order", "order_id", 1)],
    );

    let result = route(&ctx, &fixture.rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_1[t_order->t_order_1, t_order_item->t_order_item_1]"]
    );
    assert_eq!(fixture.order_calls(), 2, "one database and one table invocation");
    assert_eq!(fixture.item_calls(), 0, "bound table must not invoke its strategies");
}

#[test]
fn predicates_on_bound_member_narrow_the_representative() {
    let fixture = order_fixture(ShardingProps::default());
    let ctx = select_where(
        ["t_order_item", "t_order"],
        [
            eq("t_order_item", "user_id", 0),
            eq("t_order_item", "order_id", 1),
        ],
    );

    let result = route(&ctx, &fixture.rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_0[t_order_item->t_order_item_1, t_order->t_order_1]"]
    );
    assert_eq!(fixture.order_calls(), 0);
}

#[test]
fn conflicting_bound_predicates_fail_consistency_check() {
    let fixture = order_fixture(ShardingProps::default().with_binding_consistency_check(true));
    let ctx = select_where(
        ["t_order", "t_order_item"],
        [eq("t_order", "user_id", 1), eq("t_order_item", "user_id", 2)],
    );

    let err = route(&ctx, &fixture.rule).expect_err("inconsistent binding");

    match err {
        RouteError::BindingInconsistent {
            group,
            table,
            expected,
            actual,
        } => {
            assert_eq!(group, vec!["t_order", "t_order_item"]);
            assert_eq!(table, "t_order_item");
            assert_eq!(expected, vec!["ds_1"]);
            assert_eq!(actual, vec!["ds_0"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn conflicting_bound_predicates_without_check_match_nothing() {
    let rule = order_rule();
    let ctx = select_where(
        ["t_order", "t_order_item"],
        [eq("t_order", "user_id", 1), eq("t_order_item", "user_id", 2)],
    );

    let err = route(&ctx, &rule).expect_err("no target");

    assert!(matches!(
        err,
        RouteError::NoRouteTarget { ref table, level: StrategyLevel::Database } if table == "t_order"
    ));
}

#[test]
fn consistency_check_passes_for_agreeing_members() {
    let fixture = order_fixture(ShardingProps::default().with_binding_consistency_check(true));
    let ctx = select_where(
        ["t_order", "t_order_item"],
        [eq("t_order", "user_id", 3), eq("t_order_item", "user_id", 5)],
    );

    let result = route(&ctx, &fixture.rule).expect("route");

    assert_eq!(result.data_source_names(), vec!["ds_1"]);
    assert_eq!(result.len(), 2);
}

#[test]
fn strategy_failure_is_wrapped_with_table_and_level() {
    let rule = single_table_rule(
        TableRule::new("t_log", nodes(&["ds_0", "ds_1"], "t_log", 1))
            .and_then(|rule| rule.with_database_strategy(strategy("id", FailingAdapter)))
            .expect("table rule"),
    );
    let ctx = select_where(["t_log"], [eq("t_log", "id", 1)]);

    let err = route(&ctx, &rule).expect_err("strategy failure");

    assert_eq!(err.class(), ErrorClass::Internal);
    assert!(matches!(
        err,
        RouteError::Strategy { ref table, level: StrategyLevel::Database, .. } if table == "t_log"
    ));
}

#[test]
fn fabricated_targets_are_rejected() {
    let rule = single_table_rule(
        TableRule::new("t_log", nodes(&["ds_0", "ds_1"], "t_log", 1))
            .and_then(|rule| rule.with_database_strategy(strategy("id", FabricatingAdapter)))
            .expect("table rule"),
    );
    let ctx = select_where(["t_log"], [eq("t_log", "id", 1)]);

    let err = route(&ctx, &rule).expect_err("fabricated target");

    assert!(err.is_configuration());
    assert!(matches!(err, RouteError::FabricatedTarget { ref target, .. } if target == "ds_9"));
}

#[test]
fn empty_strategy_match_is_not_found() {
    let rule = single_table_rule(
        TableRule::new("t_log", nodes(&["ds_0", "ds_1"], "t_log", 2))
            .and_then(|rule| rule.with_table_strategy(strategy("id", ModuloAdapter::new(4))))
            .expect("table rule"),
    );
    let ctx = select_where(["t_log"], [eq("t_log", "id", 3)]);

    let err = route(&ctx, &rule).expect_err("no target");

    assert_eq!(err.class(), ErrorClass::NotFound);
    assert!(matches!(
        err,
        RouteError::NoRouteTarget { level: StrategyLevel::Table, .. }
    ));
}

#[test]
fn missing_database_strategy_keeps_every_data_source() {
    let rule = single_table_rule(
        TableRule::new("t_log", nodes(&["ds_0", "ds_1"], "t_log", 2))
            .and_then(|rule| rule.with_table_strategy(strategy("id", ModuloAdapter::new(2))))
            .expect("table rule"),
    );
    let ctx = select_where(["t_log"], [eq("t_log", "id", 7)]);

    let result = route(&ctx, &rule).expect("route");

    assert_eq!(
        rendered(&result),
        vec!["ds_0[t_log->t_log_1]", "ds_1[t_log->t_log_1]"]
    );
}
