use ark_portfolio::{l1_norm, Ledger, WeightMap};
use ark_strategy::{AlphaStrategy, Models, Strategy};
use ark_testkit::{strategy_config, ConstRisk, FavourSymbol, PaperGateway, RecordingCost};
use serde_json::json;

fn mc_engine(seed: u64, cost: RecordingCost) -> AlphaStrategy<Ledger, PaperGateway> {
    let cfg = strategy_config(
        &["A", "B", "C"],
        1_000_000.0,
        json!({"pc_method": "mc", "mc": {"seed": seed}}),
    );
    let mut s = AlphaStrategy::new(
        Ledger::new().with_position("A", 500, 12.0),
        PaperGateway::new(),
        Models::new(FavourSymbol::new("B"), ConstRisk(0.1), cost),
    );
    s.init_from_config(&cfg).unwrap();
    s.on_new_day(20240102);
    s
}

#[test]
fn scenario_same_seed_same_weights() {
    let mut a = mc_engine(7, RecordingCost::new());
    let mut b = mc_engine(7, RecordingCost::new());

    let wa: WeightMap = a.rebalance_before_open().unwrap().clone();
    let wb: WeightMap = b.rebalance_before_open().unwrap().clone();

    assert_eq!(wa, wb);
    assert_eq!(wa.len(), 3);
    assert!((l1_norm(&wa) - 1.0).abs() < 1e-9);
    assert!(wa.values().all(|w| *w >= 0.0));
}

#[test]
fn scenario_cost_model_sees_held_sizes() {
    let cost = RecordingCost::new();
    let seen = cost.handle();
    let mut s = mc_engine(1, cost);

    s.rebalance_before_open().unwrap();

    let calls = seen.borrow();
    assert_eq!(calls.len(), 5, "one utility call per sample");
    for last in calls.iter() {
        assert_eq!(last["A"], 500.0);
        assert_eq!(last["B"], 0.0);
        assert_eq!(last["C"], 0.0);
    }
}

#[test]
fn scenario_sample_count_is_configurable() {
    let cfg = strategy_config(
        &["A", "B"],
        1_000.0,
        json!({"pc_method": "mc", "mc": {"n_samples": 12, "seed": 3}}),
    );
    let cost = RecordingCost::new();
    let seen = cost.handle();
    let mut s = AlphaStrategy::new(
        Ledger::new(),
        PaperGateway::new(),
        Models::new(FavourSymbol::new("A"), ConstRisk(0.0), cost),
    );
    s.init_from_config(&cfg).unwrap();
    s.on_new_day(20240102);
    s.rebalance_before_open().unwrap();

    assert_eq!(seen.borrow().len(), 12);
}
