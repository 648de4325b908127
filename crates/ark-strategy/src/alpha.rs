//! Alpha rebalance engine.
//!
//! [`AlphaStrategy`] owns the ledger, the gateway, the order manager and the
//! cash balance for one strategy instance. A rebalance date runs:
//!
//! ```text
//! on_new_day(d)
//!   rebalance_before_open()            raw weights -> normalize
//!   rebalance_after_open(prices, susp)  reweight -> market value -> allocate -> cash
//!   send_orders()                      diff goals vs holdings -> one batch
//! on_trade_ind / on_order_status        fills and status flow into the ledger
//! ```
//!
//! Cash model: after allocation `cash = cash_left + unused`, i.e. the cash
//! that would remain if every goal filled at its allocation price. Fills of
//! rebalance orders only move cash by the price slippage and the commission.
//! Fills of orders placed outside a rebalance move cash by their full value.

use std::collections::BTreeSet;
use std::fmt;

use ark_config::ConfigError;
use ark_execution::{
    goals_to_orders, BatchReport, CancelReport, ExecAlgo, ExecutionError, GoalPosition, Order,
    OrderManager, OrderStatusInd, OrderGateway, Side, TaskId, TradeInd,
};
use ark_portfolio::{
    equal_weights, fill_cash_flow, normalize_weights, reweight_suspensions, AllocationError,
    AllocationRequest, OrderAllocator, PortfolioManager, Position, PriceMap, ReweightError,
    WeightMap,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::construction::{
    monte_carlo_search, restrict_to_universe, util_net_revenue, weights_last, ConstructionMethod,
};
use crate::cycle::{CycleViolation, RebalanceCycle, RebalancePhase};
use crate::models::Models;
use crate::schedule::{rebalance_dates, ScheduleError};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Callbacks every strategy answers.
pub trait Strategy {
    fn init_from_config(&mut self, config: &Value) -> Result<(), StrategyError>;
    fn on_new_day(&mut self, trade_date: u32);
    fn on_trade_ind(&mut self, ind: &TradeInd);
    fn on_order_status(&mut self, ind: &OrderStatusInd);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum StrategyError {
    /// A rebalance stage ran before `init_from_config`.
    NotInitialized,
    Config(ConfigError),
    Cycle(CycleViolation),
    Execution(ExecutionError),
    Reweight(ReweightError),
    Allocation(AllocationError),
    Schedule(ScheduleError),
    /// Goals handed to `goal_portfolio` must cover the universe exactly.
    IncompleteGoals { expected: usize, got: usize },
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "strategy used before init_from_config"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Cycle(e) => write!(f, "rebalance cycle: {e}"),
            Self::Execution(e) => write!(f, "execution: {e}"),
            Self::Reweight(e) => write!(f, "reweight: {e}"),
            Self::Allocation(e) => write!(f, "allocation: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::IncompleteGoals { expected, got } => {
                write!(f, "goals must cover the universe: expected {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for StrategyError {}

impl From<ConfigError> for StrategyError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CycleViolation> for StrategyError {
    fn from(e: CycleViolation) -> Self {
        Self::Cycle(e)
    }
}

impl From<ExecutionError> for StrategyError {
    fn from(e: ExecutionError) -> Self {
        Self::Execution(e)
    }
}

impl From<ReweightError> for StrategyError {
    fn from(e: ReweightError) -> Self {
        Self::Reweight(e)
    }
}

impl From<AllocationError> for StrategyError {
    fn from(e: AllocationError) -> Self {
        Self::Allocation(e)
    }
}

impl From<ScheduleError> for StrategyError {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What one after-open rebalance decided.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RebalanceSummary {
    pub trade_date: u32,
    /// Market value of tradable holdings (suspended excluded).
    pub market_value: f64,
    /// `cash + market_value` before allocation.
    pub cash_available: f64,
    /// `cash_available * position_ratio`.
    pub budget: f64,
    pub cash_committed: f64,
    /// Strategy cash after allocation.
    pub cash: f64,
    pub goals: Vec<GoalPosition>,
    pub price_gaps: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct AlphaStrategy<L, G> {
    config: Option<StrategyConfig>,
    ledger: L,
    gateway: G,
    models: Models,
    orders: OrderManager,
    allocator: OrderAllocator,
    rng: StdRng,
    cycle: RebalanceCycle,
    trade_date: u32,
    last_date: u32,
    cash: f64,
    weights: WeightMap,
    goals: Vec<GoalPosition>,
    goal_prices: PriceMap,
    market_values: Vec<(u32, f64)>,
    rebalance_tasks: BTreeSet<TaskId>,
}

impl<L, G> AlphaStrategy<L, G>
where
    L: PortfolioManager,
    G: OrderGateway,
{
    /// Engine with no config; call [`Strategy::init_from_config`] or use
    /// [`AlphaStrategy::with_config`].
    pub fn new(ledger: L, gateway: G, models: Models) -> Self {
        Self {
            config: None,
            ledger,
            gateway,
            models,
            orders: OrderManager::new(),
            allocator: OrderAllocator::default(),
            rng: StdRng::from_entropy(),
            cycle: RebalanceCycle::default(),
            trade_date: 0,
            last_date: 0,
            cash: 0.0,
            weights: WeightMap::new(),
            goals: Vec::new(),
            goal_prices: PriceMap::new(),
            market_values: Vec::new(),
            rebalance_tasks: BTreeSet::new(),
        }
    }

    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.apply_config(config);
        self
    }

    fn apply_config(&mut self, config: StrategyConfig) {
        self.cash = config.init_balance;
        if let ConstructionMethod::MonteCarlo(opts) = &config.method {
            if let Some(seed) = opts.seed {
                self.rng = StdRng::seed_from_u64(seed);
            }
        }
        info!(
            method = config.method.name(),
            period = %config.period,
            days_delay = config.days_delay,
            universe = config.universe.len(),
            init_balance = config.init_balance,
            "strategy configured"
        );
        self.config = Some(config);
    }

    fn config(&self) -> Result<&StrategyConfig, StrategyError> {
        self.config.as_ref().ok_or(StrategyError::NotInitialized)
    }

    // ----- accessors -----

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn goal_positions(&self) -> &[GoalPosition] {
        &self.goals
    }

    /// `(trade_date, market_value)` per after-open rebalance.
    pub fn market_values(&self) -> &[(u32, f64)] {
        &self.market_values
    }

    pub fn phase(&self) -> RebalancePhase {
        self.cycle.phase()
    }

    pub fn trade_date(&self) -> u32 {
        self.trade_date
    }

    pub fn last_date(&self) -> u32 {
        self.last_date
    }

    pub fn universe(&self) -> &[String] {
        self.config
            .as_ref()
            .map(|c| c.universe.as_slice())
            .unwrap_or(&[])
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn order_manager(&self) -> &OrderManager {
        &self.orders
    }

    /// Rebalance dates among `trading_dates` for the configured period.
    pub fn rebalance_schedule(&self, trading_dates: &[u32]) -> Result<Vec<u32>, StrategyError> {
        let cfg = self.config()?;
        Ok(rebalance_dates(trading_dates, cfg.period, cfg.days_delay)?)
    }

    // ----- rebalance stages -----

    /// Compute and normalize target weights. Prices and suspensions are not
    /// known yet.
    pub fn rebalance_before_open(&mut self) -> Result<&WeightMap, StrategyError> {
        self.cycle
            .require("rebalance_before_open", RebalancePhase::Idle)?;
        let cfg = self.config.as_ref().ok_or(StrategyError::NotInitialized)?;
        let universe = &cfg.universe;

        let mut raw = match &cfg.method {
            ConstructionMethod::EqualWeight => equal_weights(universe),
            ConstructionMethod::FactorValueWeight => {
                restrict_to_universe(self.models.revenue.forecast(self.trade_date), universe)
            }
            ConstructionMethod::MonteCarlo(opts) => {
                let last = weights_last(universe, &self.ledger.position_book(self.trade_date));
                let models = &self.models;
                let outcome = monte_carlo_search(universe, opts, &mut self.rng, |w| {
                    util_net_revenue(models, &last, w)
                });
                if let Some(msg) = &outcome.diagnostic {
                    warn!(trade_date = self.trade_date, "{msg}");
                }
                outcome.weights
            }
        };

        normalize_weights(&mut raw);
        info!(
            trade_date = self.trade_date,
            method = cfg.method.name(),
            symbols = raw.len(),
            "weights computed before open"
        );

        self.weights = raw;
        self.cycle.advance(RebalancePhase::BeforeOpen);
        Ok(&self.weights)
    }

    /// Reweight around suspensions, size the goals and update cash.
    pub fn rebalance_after_open(
        &mut self,
        prices: &PriceMap,
        suspended: &BTreeSet<String>,
    ) -> Result<RebalanceSummary, StrategyError> {
        self.cycle
            .require("rebalance_after_open", RebalancePhase::BeforeOpen)?;
        let cfg = self.config.as_ref().ok_or(StrategyError::NotInitialized)?;
        let trade_date = self.trade_date;

        for sym in &cfg.universe {
            let priced = prices.get(sym).map(|p| !p.is_nan()).unwrap_or(false);
            if !priced && !suspended.contains(sym) {
                warn!(
                    trade_date,
                    symbol = %sym,
                    "PriceDataInconsistency: no price but not suspended"
                );
            }
        }

        let mut weights = self.weights.clone();
        reweight_suspensions(&mut weights, suspended, &cfg.universe)?;

        let market_value = self.ledger.market_value(trade_date, prices, suspended);
        let cash_available = self.cash + market_value;
        let budget = cash_available * cfg.position_ratio;
        let unused = cash_available - budget;

        let held = self.ledger.position_book(trade_date);
        let allocation = self.allocator.allocate(&AllocationRequest {
            universe: &cfg.universe,
            weights: &weights,
            budget,
            prices,
            style: cfg.exec_style,
            suspended,
            held: &held,
        })?;

        for sym in &allocation.price_gaps {
            warn!(trade_date, symbol = %sym, "no usable price; position held");
        }

        self.weights = weights;
        self.market_values.push((trade_date, market_value));
        self.cash = allocation.cash_left + unused;
        self.goals = allocation.goals;
        self.goal_prices = prices.clone();
        self.cycle.advance(RebalancePhase::AfterOpen);

        info!(
            trade_date,
            market_value,
            cash_available,
            committed = allocation.cash_committed,
            cash = self.cash,
            "rebalanced after open"
        );

        Ok(RebalanceSummary {
            trade_date,
            market_value,
            cash_available,
            budget,
            cash_committed: allocation.cash_committed,
            cash: self.cash,
            goals: self.goals.clone(),
            price_gaps: allocation.price_gaps,
        })
    }

    /// Submit the goals of this cycle as one batch.
    pub fn send_orders(&mut self) -> Result<BatchReport, StrategyError> {
        self.cycle.require("send_orders", RebalancePhase::AfterOpen)?;
        let goals = self.goals.clone();
        let report = self.goal_portfolio(&goals)?;
        self.cycle.advance(RebalancePhase::Submitted);
        Ok(report)
    }

    /// Diff `goals` against holdings and submit the difference as one batch.
    ///
    /// `goals` must hold one entry per universe symbol. Orders are priced at
    /// the prices of the last after-open rebalance.
    pub fn goal_portfolio(&mut self, goals: &[GoalPosition]) -> Result<BatchReport, StrategyError> {
        let cfg = self.config()?;
        let expected = cfg.universe.len();
        let covered: BTreeSet<&str> = goals.iter().map(|g| g.symbol.as_str()).collect();
        if goals.len() != expected || !cfg.universe.iter().all(|s| covered.contains(s.as_str())) {
            return Err(StrategyError::IncompleteGoals {
                expected,
                got: goals.len(),
            });
        }
        let exec_style = cfg.exec_style;

        let book = self.ledger.position_book(self.trade_date);
        let orders = goals_to_orders(&book, goals, &self.goal_prices, self.trade_date, exec_style);
        let count = orders.len();

        let report = self
            .orders
            .place_batch_order(&mut self.ledger, &mut self.gateway, orders)?;
        self.rebalance_tasks.insert(report.task_id);

        if report.is_success() {
            info!(task_id = %report.task_id, orders = count, "goal batch submitted");
        } else {
            warn!(
                task_id = %report.task_id,
                orders = count,
                failed = report.failure_count(),
                errors = %report.aggregated_message(),
                "goal batch partially refused"
            );
        }
        Ok(report)
    }

    // ----- direct order entry -----

    pub fn place_order(
        &mut self,
        symbol: &str,
        side: Side,
        price: f64,
        size: i64,
        algo: ExecAlgo,
    ) -> Result<TaskId, StrategyError> {
        Ok(self.orders.place_order(
            &mut self.ledger,
            &mut self.gateway,
            symbol,
            side,
            price,
            size,
            algo,
        )?)
    }

    pub fn cancel_order(&mut self, task_id: TaskId) -> Result<CancelReport, StrategyError> {
        Ok(self.orders.cancel_order(&mut self.gateway, task_id)?)
    }

    pub fn place_batch_order(&mut self, orders: Vec<Order>) -> Result<BatchReport, StrategyError> {
        Ok(self
            .orders
            .place_batch_order(&mut self.ledger, &mut self.gateway, orders)?)
    }

    /// Close every holding with one order per symbol.
    ///
    /// Orders are priced at the last rebalance price, else the average cost.
    /// Gateway refusals are logged and skipped; other errors abort.
    pub fn liquidate_all(&mut self) -> Result<Vec<TaskId>, StrategyError> {
        let mut tasks = Vec::new();
        for pos in self.query_portfolio() {
            let side = if pos.curr_size > 0 { Side::Sell } else { Side::Buy };
            let price = self
                .goal_prices
                .get(&pos.symbol)
                .copied()
                .filter(|p| p.is_finite() && *p > 0.0)
                .unwrap_or(pos.avg_cost);

            match self.place_order(&pos.symbol, side, price, pos.curr_size.abs(), ExecAlgo::Default) {
                Ok(task_id) => tasks.push(task_id),
                Err(StrategyError::Execution(ExecutionError::Gateway { message, .. })) => {
                    warn!(symbol = %pos.symbol, error = %message, "liquidation order refused");
                }
                Err(e) => return Err(e),
            }
        }
        info!(tasks = tasks.len(), "liquidate_all");
        Ok(tasks)
    }

    /// Drop tasks whose orders have all reached a terminal status.
    fn retire_finished_tasks(&mut self) {
        let ledger = &self.ledger;
        self.orders.retain_tasks(|_, entrusts| {
            entrusts.iter().any(|id| {
                ledger
                    .get_order(*id)
                    .map_or(false, |o| !o.status.is_terminal())
            })
        });
        let orders = &self.orders;
        self.rebalance_tasks
            .retain(|task_id| orders.task_orders(*task_id).is_some());
    }

    /// Non-flat positions as of the current date.
    pub fn query_portfolio(&self) -> Vec<Position> {
        self.ledger
            .holding_securities()
            .into_iter()
            .filter_map(|s| self.ledger.get_position(&s, self.trade_date))
            .filter(|p| !p.is_flat())
            .collect()
    }
}

impl<L, G> Strategy for AlphaStrategy<L, G>
where
    L: PortfolioManager,
    G: OrderGateway,
{
    fn init_from_config(&mut self, config: &Value) -> Result<(), StrategyError> {
        let cfg = StrategyConfig::from_config_json(config)?;
        self.apply_config(cfg);
        Ok(())
    }

    fn on_new_day(&mut self, trade_date: u32) {
        self.last_date = self.trade_date;
        self.trade_date = trade_date;
        self.orders.on_new_day(trade_date);
        self.ledger.on_new_day(trade_date, self.last_date);
        self.retire_finished_tasks();
        self.cycle.new_day(trade_date);
        self.goals.clear();
        debug!(trade_date, last_date = self.last_date, "new day");
    }

    fn on_trade_ind(&mut self, ind: &TradeInd) {
        let signed = ind.signed_size();
        let budgeted_price = self
            .ledger
            .get_order(ind.entrust_id)
            .filter(|o| o.task_id.map_or(false, |t| self.rebalance_tasks.contains(&t)))
            .map(|o| o.price);

        // Rebalance fills were paid for at allocation time; only the
        // difference to the order price and the fee are new.
        let delta = match budgeted_price {
            Some(order_price) => (order_price - ind.fill_price) * signed as f64 - ind.commission,
            None => fill_cash_flow(signed, ind.fill_price, ind.commission),
        };
        self.cash += delta;

        self.orders.on_trade_ind(&mut self.ledger, ind);
        debug!(entrust_id = %ind.entrust_id, symbol = %ind.symbol, cash_delta = delta, "fill");
    }

    fn on_order_status(&mut self, ind: &OrderStatusInd) {
        self.orders.on_order_status(&mut self.ledger, ind);
    }
}
