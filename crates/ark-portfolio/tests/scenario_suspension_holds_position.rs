use std::collections::BTreeSet;

use ark_execution::{ExecStyle, OrderLedger, Side, TradeInd, EntrustId};
use ark_portfolio::{
    reweight_suspensions, AllocationRequest, Ledger, OrderAllocator, PortfolioManager, PriceMap,
    ReweightError, WeightMap,
};

fn map(items: &[(&str, f64)]) -> WeightMap {
    items.iter().map(|(s, v)| (s.to_string(), *v)).collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scenario_suspended_symbol_keeps_held_size() {
    // GIVEN B is held at 50 shares (odd lot from an earlier corporate action)
    let mut ledger = Ledger::new();
    ledger.on_new_day(20240102, 0);
    ledger.on_trade_ind(&TradeInd {
        entrust_id: EntrustId(202401020001),
        symbol: "B".to_string(),
        side: Side::Buy,
        fill_price: 20.0,
        fill_size: 50,
        fill_date: 20240102,
        fill_time: 93000,
        commission: 0.0,
    });
    ledger.on_new_day(20240103, 20240102);

    let universe = vec!["A".to_string(), "B".to_string()];
    let mut weights = map(&[("A", 0.2), ("B", 0.8)]);
    let suspended = set(&["B"]);

    // WHEN B is suspended
    reweight_suspensions(&mut weights, &suspended, &universe).unwrap();

    // THEN B's weight is gone and A takes everything
    assert_eq!(weights["B"], 0.0);
    assert!((weights["A"] - 1.0).abs() < 1e-12);

    let prices: PriceMap = map(&[("A", 10.0)]);
    let held = ledger.position_book(20240103);
    let req = AllocationRequest {
        universe: &universe,
        weights: &weights,
        budget: 10_000.0,
        prices: &prices,
        style: ExecStyle::Close,
        suspended: &suspended,
        held: &held,
    };
    let alloc = OrderAllocator::default().allocate(&req).unwrap();

    // AND B's goal equals what is held; A absorbs the full budget
    assert_eq!(alloc.goal("B"), Some(50));
    assert_eq!(alloc.goal("A"), Some(1_000));
    assert!(alloc.cash_left.abs() < 1e-6);
    // B has no price but is suspended, so it is not a gap
    assert!(alloc.price_gaps.is_empty());
}

#[test]
fn scenario_whole_universe_suspended_is_fatal_to_the_cycle() {
    let universe = vec!["A".to_string(), "B".to_string()];
    let mut weights = map(&[("A", 0.5), ("B", 0.5)]);

    let err = reweight_suspensions(&mut weights, &set(&["A", "B", "C"]), &universe).unwrap_err();
    assert!(matches!(err, ReweightError::AllSuspended { universe_size: 2 }));
}
