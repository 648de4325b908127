//! ark-strategy
//!
//! The rebalance engine: portfolio construction, the per-date cycle, the
//! rebalance calendar and [`AlphaStrategy`], which ties the ledger, the
//! allocator and the order manager together.

mod alpha;
mod config;
mod construction;
mod cycle;
mod models;
mod schedule;

pub use alpha::{AlphaStrategy, RebalanceSummary, Strategy, StrategyError};
pub use config::{StrategyConfig, REQUIRED_KEYS};
pub use construction::{
    monte_carlo_search, restrict_to_universe, util_net_revenue, weights_last, ConstructionMethod,
    MonteCarloOptions, SearchOutcome, COST_COEF, DEFAULT_MC_SAMPLES, RISK_COEF,
};
pub use cycle::{CycleViolation, RebalanceCycle, RebalancePhase};
pub use models::{CostModel, Models, NoCost, NoRisk, RevenueModel, RiskModel, StaticScores};
pub use schedule::{parse_trade_date, rebalance_dates, RebalancePeriod, ScheduleError};
