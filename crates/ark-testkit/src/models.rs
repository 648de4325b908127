use std::cell::RefCell;
use std::rc::Rc;

use ark_portfolio::WeightMap;
use ark_strategy::{CostModel, RevenueModel, RiskModel};

/// Revenue equals the weight put on one symbol; scores are fixed.
#[derive(Clone, Debug)]
pub struct FavourSymbol {
    pub symbol: String,
    pub scores: WeightMap,
}

impl FavourSymbol {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            scores: WeightMap::new(),
        }
    }
}

impl RevenueModel for FavourSymbol {
    fn forecast_revenue(&self, weights: &WeightMap) -> f64 {
        weights.get(&self.symbol).copied().unwrap_or(0.0)
    }

    fn forecast(&mut self, _trade_date: u32) -> WeightMap {
        self.scores.clone()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConstRisk(pub f64);

impl RiskModel for ConstRisk {
    fn calc_risk(&self, _weights: &WeightMap) -> f64 {
        self.0
    }
}

/// Zero cost; remembers every `last` it was shown.
#[derive(Clone, Debug, Default)]
pub struct RecordingCost {
    seen: Rc<RefCell<Vec<WeightMap>>>,
}

impl RecordingCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded calls; keep it before boxing the model.
    pub fn handle(&self) -> Rc<RefCell<Vec<WeightMap>>> {
        Rc::clone(&self.seen)
    }
}

impl CostModel for RecordingCost {
    fn calc_cost(&self, last: &WeightMap, _target: &WeightMap) -> f64 {
        self.seen.borrow_mut().push(last.clone());
        0.0
    }
}
