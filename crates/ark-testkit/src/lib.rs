//! ark-testkit
//!
//! Shared doubles and fixtures for scenario tests: a deterministic paper
//! gateway, tiny forecasting models, and builders for prices, symbol sets
//! and strategy configs.

mod models;
mod paper_gateway;

pub use models::{ConstRisk, FavourSymbol, RecordingCost};
pub use paper_gateway::PaperGateway;

use std::collections::BTreeSet;

use ark_portfolio::{Ledger, PriceMap};
use ark_strategy::{AlphaStrategy, Models, Strategy};
use serde_json::{json, Value};

pub fn prices(items: &[(&str, f64)]) -> PriceMap {
    items.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

pub fn symbols(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Minimal valid config over `universe`; `overrides` is merged on top.
pub fn strategy_config(universe: &[&str], init_balance: f64, overrides: Value) -> Value {
    let mut cfg = json!({
        "init_balance": init_balance,
        "period": "day",
        "days_delay": 0,
        "position_ratio": 1.0,
        "universe": universe,
    });
    if let (Some(base), Some(over)) = (cfg.as_object_mut(), overrides.as_object()) {
        for (k, v) in over {
            base.insert(k.clone(), v.clone());
        }
    }
    cfg
}

/// Configured engine over an in-memory ledger and a paper gateway, rolled to
/// `trade_date`.
pub fn paper_strategy(
    config: &Value,
    models: Models,
    gateway: PaperGateway,
    trade_date: u32,
) -> AlphaStrategy<Ledger, PaperGateway> {
    let mut s = AlphaStrategy::new(Ledger::new(), gateway, models);
    if let Err(e) = s.init_from_config(config) {
        panic!("fixture config rejected: {e}");
    }
    s.on_new_day(trade_date);
    s
}

/// Fill everything the paper gateway holds and feed the fills back.
pub fn settle(strategy: &mut AlphaStrategy<Ledger, PaperGateway>, fill_time: u32) -> usize {
    let fills = strategy.gateway_mut().fill_all(fill_time);
    for f in &fills {
        strategy.on_trade_ind(f);
    }
    fills.len()
}
