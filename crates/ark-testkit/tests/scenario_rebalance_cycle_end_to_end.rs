use ark_execution::{GoalPosition, Side};
use ark_portfolio::PortfolioManager;
use ark_strategy::{Models, NoCost, NoRisk, RebalancePhase, StaticScores, Strategy};
use ark_testkit::{paper_strategy, prices, settle, strategy_config, symbols, PaperGateway};
use serde_json::json;

fn equal_weight_models() -> Models {
    Models::new(StaticScores::default(), NoRisk, NoCost)
}

#[test]
fn scenario_three_days_of_equal_weight_rebalancing() {
    let cfg = strategy_config(&["A", "B"], 100_000.0, json!({}));
    let mut s = paper_strategy(&cfg, equal_weight_models(), PaperGateway::new(), 20240102);

    // ── Day 1: buy into an empty book ──────────────────────────────────────
    let w = s.rebalance_before_open().unwrap().clone();
    assert_eq!(w["A"], 0.5);
    assert_eq!(w["B"], 0.5);

    let summary = s
        .rebalance_after_open(&prices(&[("A", 10.0), ("B", 25.0)]), &symbols(&[]))
        .unwrap();
    assert_eq!(
        summary.goals,
        vec![GoalPosition::new("A", 5_000), GoalPosition::new("B", 2_000)]
    );
    assert_eq!(summary.cash, 0.0);

    let report = s.send_orders().unwrap();
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 2);
    assert!(s.gateway().placed().iter().all(|o| o.side == Side::Buy));
    assert_eq!(settle(&mut s, 150000), 2);
    assert_eq!(s.cash(), 0.0);

    // ── Day 2: B suspended; A absorbs everything, B is left alone ──────────
    s.on_new_day(20240103);
    assert_eq!(s.phase(), RebalancePhase::Idle);
    s.rebalance_before_open().unwrap();
    let summary = s
        .rebalance_after_open(&prices(&[("A", 11.0), ("B", 25.0)]), &symbols(&["B"]))
        .unwrap();

    assert_eq!(s.weights()["B"], 0.0);
    assert_eq!(s.weights()["A"], 1.0);
    assert_eq!(summary.market_value, 55_000.0);
    assert_eq!(
        summary.goals,
        vec![GoalPosition::new("A", 5_000), GoalPosition::new("B", 2_000)]
    );
    let report = s.send_orders().unwrap();
    assert!(report.outcomes.is_empty(), "goals equal holdings; nothing to trade");

    // ── Day 3: both tradable again ─────────────────────────────────────────
    s.on_new_day(20240104);
    s.rebalance_before_open().unwrap();
    let summary = s
        .rebalance_after_open(&prices(&[("A", 11.0), ("B", 20.0)]), &symbols(&[]))
        .unwrap();

    assert_eq!(summary.market_value, 95_000.0);
    // 47_500 / 11 = 4318.2 -> 43 lots; 47_500 / 20 = 2375 -> 23.75 lots -> 24
    assert_eq!(summary.goals[0], GoalPosition::new("A", 4_300));
    assert_eq!(summary.goals[1], GoalPosition::new("B", 2_400));
    // Nearest-lot rounding may overshoot the budget.
    assert!((summary.cash - -300.0).abs() < 1e-9);

    s.send_orders().unwrap();
    let day3: Vec<_> = s
        .gateway()
        .open_orders()
        .iter()
        .map(|o| (o.symbol.clone(), o.side, o.size))
        .collect();
    assert_eq!(
        day3,
        vec![("A".to_string(), Side::Sell, 700), ("B".to_string(), Side::Buy, 400)]
    );
    settle(&mut s, 150000);

    let book = s.ledger().position_book(20240104);
    assert_eq!(book["A"], 4_300);
    assert_eq!(book["B"], 2_400);
    assert_eq!(
        s.market_values(),
        &[(20240102, 0.0), (20240103, 55_000.0), (20240104, 95_000.0)]
    );
}

#[test]
fn scenario_slippage_and_fees_hit_cash_after_fills() {
    let cfg = strategy_config(&["A", "B"], 100_000.0, json!({}));
    let gw = PaperGateway::new().with_slippage(0.01).with_commission_rate(0.0);
    let mut s = paper_strategy(&cfg, equal_weight_models(), gw, 20240102);

    s.rebalance_before_open().unwrap();
    s.rebalance_after_open(&prices(&[("A", 10.0), ("B", 25.0)]), &symbols(&[]))
        .unwrap();
    s.send_orders().unwrap();
    settle(&mut s, 150000);

    // 5_000 * 0.01 + 2_000 * 0.01
    assert!((s.cash() - -70.0).abs() < 1e-6);
}

#[test]
fn scenario_entrust_ids_carry_the_trade_date() {
    let cfg = strategy_config(&["A", "B"], 100_000.0, json!({}));
    let mut s = paper_strategy(&cfg, equal_weight_models(), PaperGateway::new(), 20240102);
    s.rebalance_before_open().unwrap();
    s.rebalance_after_open(&prices(&[("A", 10.0), ("B", 25.0)]), &symbols(&[]))
        .unwrap();
    let report = s.send_orders().unwrap();

    assert_eq!(report.task_id.0, 202401020001);
    let ids: Vec<u64> = report.outcomes.iter().map(|o| o.entrust_id.0).collect();
    assert_eq!(ids, vec![202401020001, 202401020002]);
}

#[test]
fn scenario_finished_tasks_are_retired_on_new_day() {
    let cfg = strategy_config(&["A", "B"], 100_000.0, json!({}));
    let mut s = paper_strategy(&cfg, equal_weight_models(), PaperGateway::new(), 20240102);

    // Day 1: submitted and fully filled.
    s.rebalance_before_open().unwrap();
    s.rebalance_after_open(&prices(&[("A", 10.0), ("B", 25.0)]), &symbols(&[]))
        .unwrap();
    s.send_orders().unwrap();
    settle(&mut s, 150000);
    assert_eq!(s.order_manager().task_count(), 1);

    s.on_new_day(20240103);
    assert_eq!(s.order_manager().task_count(), 0);

    // Day 2: A moves, the batch stays open over the date change.
    s.rebalance_before_open().unwrap();
    s.rebalance_after_open(&prices(&[("A", 12.5), ("B", 25.0)]), &symbols(&[]))
        .unwrap();
    let report = s.send_orders().unwrap();
    assert!(!report.outcomes.is_empty());
    let cash_before = s.cash();

    s.on_new_day(20240104);
    assert_eq!(s.order_manager().task_count(), 1);
    assert!(s.order_manager().task_orders(report.task_id).is_some());

    // A late fill at the order price is still treated as budgeted.
    let fills = s.gateway_mut().fill_all(93000);
    for f in &fills {
        s.on_trade_ind(f);
    }
    assert!((s.cash() - cash_before).abs() < 1e-9);

    s.on_new_day(20240105);
    assert_eq!(s.order_manager().task_count(), 0);
}
