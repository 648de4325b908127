//! Portfolio construction: raw target weights for the universe.
//!
//! Each [`ConstructionMethod`] produces *raw* weights; the caller runs
//! `ark_portfolio::normalize_weights` on the result.
//!
//! The Monte Carlo search draws `n_samples` non-negative vectors, scales each
//! to unit L1 and keeps the one with the largest utility. Ties keep the
//! earliest draw. An optional incumbent (`initial_value`) is scored before
//! any draw, so a draw must strictly beat it to replace it.

use std::collections::BTreeMap;

use ark_execution::PositionBook;
use ark_portfolio::{zero_weights, WeightMap};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Models;

pub const DEFAULT_MC_SAMPLES: usize = 5;

/// Starting point of the minimisation; `-utility` must drop below it.
const MC_SENTINEL: f64 = 1e30;

pub const RISK_COEF: f64 = 1.0;
pub const COST_COEF: f64 = 1.0;

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloOptions {
    #[serde(default = "default_mc_samples")]
    pub n_samples: usize,
    /// Fixed seed for reproducible draws; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub initial_value: Option<WeightMap>,
}

fn default_mc_samples() -> usize {
    DEFAULT_MC_SAMPLES
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            n_samples: DEFAULT_MC_SAMPLES,
            seed: None,
            initial_value: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConstructionMethod {
    /// 1/N over the universe.
    EqualWeight,
    /// Revenue model scores as raw weights.
    FactorValueWeight,
    /// Random search maximising net revenue.
    #[serde(rename = "mc")]
    MonteCarlo(MonteCarloOptions),
}

impl Default for ConstructionMethod {
    fn default() -> Self {
        Self::EqualWeight
    }
}

impl ConstructionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EqualWeight => "equal_weight",
            Self::FactorValueWeight => "factor_value_weight",
            Self::MonteCarlo(_) => "mc",
        }
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Held sizes per symbol, zero-filled over `universe`.
///
/// Holdings outside the universe are kept so the cost model sees everything
/// that would be traded away.
pub fn weights_last(universe: &[String], held: &PositionBook) -> WeightMap {
    let mut last: WeightMap = held.iter().map(|(s, q)| (s.clone(), *q as f64)).collect();
    for sym in universe {
        last.entry(sym.clone()).or_insert(0.0);
    }
    last
}

/// `revenue(target) - RISK_COEF * risk(target) - COST_COEF * cost(last, target)`.
pub fn util_net_revenue(models: &Models, last: &WeightMap, target: &WeightMap) -> f64 {
    let revenue = models.revenue.forecast_revenue(target);
    let risk = models.risk.calc_risk(target);
    let cost = models.cost.calc_cost(last, target);
    revenue - RISK_COEF * risk - COST_COEF * cost
}

// ---------------------------------------------------------------------------
// Monte Carlo search
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    pub weights: WeightMap,
    /// Utility of `weights`; `None` when nothing beat the sentinel.
    pub utility: Option<f64>,
    /// Set when the search found no usable vector.
    pub diagnostic: Option<String>,
}

/// Draw `opts.n_samples` unit-L1 non-negative vectors over `universe` and
/// keep the best by `utility`.
///
/// When nothing qualifies (every utility NaN or below `-1e30`) the incumbent
/// is returned if given, else zeros, with a diagnostic.
pub fn monte_carlo_search<R, F>(
    universe: &[String],
    opts: &MonteCarloOptions,
    rng: &mut R,
    mut utility: F,
) -> SearchOutcome
where
    R: Rng + ?Sized,
    F: FnMut(&WeightMap) -> f64,
{
    if universe.is_empty() {
        return SearchOutcome {
            weights: WeightMap::new(),
            utility: None,
            diagnostic: Some("empty universe, nothing to search".to_string()),
        };
    }

    let mut best_f = MC_SENTINEL;
    let mut best: Option<WeightMap> = None;

    if let Some(init) = &opts.initial_value {
        let f = -utility(init);
        if f < best_f {
            best_f = f;
            best = Some(init.clone());
        }
    }

    for _ in 0..opts.n_samples {
        let draws: Vec<f64> = universe.iter().map(|_| rng.gen::<f64>()).collect();
        let total: f64 = draws.iter().sum();
        let candidate: WeightMap = if total > 0.0 {
            universe
                .iter()
                .zip(&draws)
                .map(|(s, d)| (s.clone(), d / total))
                .collect()
        } else {
            let w = 1.0 / universe.len() as f64;
            universe.iter().map(|s| (s.clone(), w)).collect()
        };

        let f = -utility(&candidate);
        if f < best_f {
            best_f = f;
            best = Some(candidate);
        }
    }

    match best {
        Some(weights) => SearchOutcome {
            weights,
            utility: Some(-best_f),
            diagnostic: None,
        },
        None => SearchOutcome {
            weights: opts
                .initial_value
                .clone()
                .unwrap_or_else(|| zero_weights(universe)),
            utility: None,
            diagnostic: Some(format!(
                "no weights can make f < {best_f:.2e} in this search"
            )),
        },
    }
}

/// Keep only universe symbols; missing ones get 0.0.
pub fn restrict_to_universe(mut raw: WeightMap, universe: &[String]) -> WeightMap {
    let mut out = BTreeMap::new();
    for sym in universe {
        out.insert(sym.clone(), raw.remove(sym).unwrap_or(0.0));
    }
    out
}
