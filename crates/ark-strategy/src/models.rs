//! Forecasting model contracts.
//!
//! The models themselves live outside this crate; the engine only calls
//! them. Weight maps handed to `calc_cost` as `last` carry held share sizes
//! (0.0 for untraded universe symbols), not fractions.

use ark_portfolio::WeightMap;

pub trait RevenueModel {
    /// Expected revenue of holding `weights`.
    fn forecast_revenue(&self, weights: &WeightMap) -> f64;

    /// Per-symbol scores for `trade_date`, used as raw factor weights.
    fn forecast(&mut self, trade_date: u32) -> WeightMap;
}

pub trait RiskModel {
    fn calc_risk(&self, weights: &WeightMap) -> f64;
}

pub trait CostModel {
    fn calc_cost(&self, last: &WeightMap, target: &WeightMap) -> f64;
}

/// The three models one strategy instance consults.
pub struct Models {
    pub revenue: Box<dyn RevenueModel>,
    pub risk: Box<dyn RiskModel>,
    pub cost: Box<dyn CostModel>,
}

impl Models {
    pub fn new<R, K, C>(revenue: R, risk: K, cost: C) -> Self
    where
        R: RevenueModel + 'static,
        K: RiskModel + 'static,
        C: CostModel + 'static,
    {
        Self {
            revenue: Box::new(revenue),
            risk: Box::new(risk),
            cost: Box::new(cost),
        }
    }

    /// Static scores, no risk, no cost.
    pub fn scores_only(scores: WeightMap) -> Self {
        Self::new(StaticScores::new(scores), NoRisk, NoCost)
    }
}

impl std::fmt::Debug for Models {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Built-in models
// ---------------------------------------------------------------------------

/// Fixed per-symbol scores; revenue is Σ weight·score.
#[derive(Clone, Debug, Default)]
pub struct StaticScores {
    scores: WeightMap,
}

impl StaticScores {
    pub fn new(scores: WeightMap) -> Self {
        Self { scores }
    }
}

impl RevenueModel for StaticScores {
    fn forecast_revenue(&self, weights: &WeightMap) -> f64 {
        weights
            .iter()
            .filter_map(|(s, w)| self.scores.get(s).map(|score| w * score))
            .filter(|v| v.is_finite())
            .sum()
    }

    fn forecast(&mut self, _trade_date: u32) -> WeightMap {
        self.scores.clone()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoRisk;

impl RiskModel for NoRisk {
    fn calc_risk(&self, _weights: &WeightMap) -> f64 {
        0.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoCost;

impl CostModel for NoCost {
    fn calc_cost(&self, _last: &WeightMap, _target: &WeightMap) -> f64 {
        0.0
    }
}
