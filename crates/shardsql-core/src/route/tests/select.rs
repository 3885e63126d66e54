use super::{eq, rendered, select_where};
use crate::{
    route::{RouteEngineKind, RouteError, RoutingEngine, ShardingConditions, route},
    statement::{DalKind, StatementContext, StatementKind},
    test_support::order_rule,
};

fn engine_kind(ctx: &StatementContext) -> RouteEngineKind {
    RoutingEngine::select(ctx, &order_rule())
        .expect("engine selection")
        .kind()
}

#[test]
fn statement_shapes_pick_expected_engines() {
    let cases = [
        (StatementContext::new(StatementKind::Tcl, Vec::<String>::new()), RouteEngineKind::DatabaseBroadcast),
        (StatementContext::new(StatementKind::Ddl, ["t_order"]), RouteEngineKind::TableBroadcast),
        (StatementContext::new(StatementKind::Ddl, ["t_unknown"]), RouteEngineKind::Ignore),
        (
            StatementContext::new(StatementKind::Dal(DalKind::ShowDatabases), Vec::<String>::new()),
            RouteEngineKind::DatabaseBroadcast,
        ),
        (
            StatementContext::new(StatementKind::Dal(DalKind::ShowTables), Vec::<String>::new()),
            RouteEngineKind::DataSourceGroupBroadcast,
        ),
        (
            StatementContext::new(StatementKind::Dal(DalKind::ShowCreateTable), ["t_order"]),
            RouteEngineKind::Unicast,
        ),
        (StatementContext::select(["t_config"]), RouteEngineKind::Unicast),
        (StatementContext::new(StatementKind::Insert, ["t_config"]), RouteEngineKind::DatabaseBroadcast),
        (StatementContext::select(Vec::<String>::new()), RouteEngineKind::Unicast),
        (StatementContext::select(["t_order"]), RouteEngineKind::Standard),
        (StatementContext::select(["t_order", "t_config"]), RouteEngineKind::Standard),
        (StatementContext::select(["t_order", "t_order_item"]), RouteEngineKind::Standard),
        (StatementContext::select(["t_order", "t_user"]), RouteEngineKind::Complex),
    ];

    for (ctx, expected) in cases {
        assert_eq!(engine_kind(&ctx), expected, "engine for {ctx:?}");
    }
}

#[test]
fn unconfigured_table_fails_before_routing() {
    let err = RoutingEngine::select(&StatementContext::select(["t_order", "t_missing"]), &order_rule())
        .expect_err("unknown table");

    assert!(matches!(err, RouteError::RuleNotFound { ref tables } if tables == &["t_missing"]));
}

#[test]
fn always_false_conditions_unicast_to_first_node() {
    let ctx = StatementContext::new(StatementKind::Delete, ["t_order"])
        .with_conditions(ShardingConditions::always_false());

    let result = route(&ctx, &order_rule()).expect("route");

    assert_eq!(rendered(&result), vec!["ds_0[t_order->t_order_0]"]);
}

#[test]
fn broadcast_read_hits_one_data_source_and_writes_hit_all() {
    let rule = order_rule();

    let read = route(&StatementContext::select(["t_config"]), &rule).expect("read");
    assert_eq!(rendered(&read), vec!["ds_0[t_config->t_config]"]);

    let write = route(&StatementContext::new(StatementKind::Update, ["t_config"]), &rule).expect("write");
    assert_eq!(rendered(&write), vec!["ds_0[]", "ds_1[]"]);
}

#[test]
fn ddl_broadcasts_to_every_data_node() {
    let ctx = StatementContext::new(StatementKind::Ddl, ["t_order", "t_order_item"]);

    let result = route(&ctx, &order_rule()).expect("route");

    assert_eq!(result.len(), 8);
    assert_eq!(
        result.actual_tables("ds_1", "t_order_item"),
        vec!["t_order_item_0", "t_order_item_1"]
    );
}

#[test]
fn show_tables_reaches_each_data_source_once() {
    let ctx = StatementContext::new(StatementKind::Dal(DalKind::ShowTables), Vec::<String>::new());

    let result = route(&ctx, &order_rule()).expect("route");

    assert_eq!(rendered(&result), vec!["ds_0[]", "ds_1[]"]);
}

#[test]
fn ignored_statement_routes_nowhere() {
    let ctx = StatementContext::new(StatementKind::Ddl, ["t_unknown"]);

    let result = route(&ctx, &order_rule()).expect("route");

    assert!(result.is_empty());
}

#[test]
fn representative_is_the_first_table_a_predicate_names() {
    let rule = order_rule();
    let ctx = select_where(["t_order", "t_order_item"], [eq("t_order_item", "user_id", 2)]);

    let RoutingEngine::Standard(engine) = RoutingEngine::select(&ctx, &rule).expect("selection") else {
        panic!("binding tables should route through the standard engine");
    };

    assert_eq!(engine.logic_table(), "t_order_item");
    assert_eq!(engine.bound_tables(), &["t_order"]);
}
