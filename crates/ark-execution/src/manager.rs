//! Task → entrust-order lifecycle.
//!
//! A *task* is one logical request from the strategy. It fans out into one
//! or more *entrust* orders, each with its own broker-facing id. The manager
//! owns the task map and the id sequences; the position ledger and the
//! gateway are borrowed per call so the strategy stays the single owner of
//! both.
//!
//! ```text
//! place_order ─┐                      ┌─► OrderLedger::add_order
//!              ├─► mint ids ─► task ──┤
//! place_batch ─┘                      └─► OrderGateway::place_order
//!
//! cancel_order(task) ─► OrderGateway::cancel_order(e) for every e in task
//! ```
//!
//! A gateway refusal is reported back to the ledger as `Rejected`.
//!
//! Cancellation is best-effort: each entrust order is cancelled on its own
//! and a failure never rolls back the ones that already succeeded.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::gateway::OrderGateway;
use crate::sequence::{compose_id, SequenceGenerator, MAX_SEQ_PER_DAY};
use crate::types::{
    EntrustId, ExecAlgo, Order, OrderStatus, OrderStatusInd, Side, TaskId, TradeInd,
};

const TASK_KEY: &str = "task_id";
const ENTRUST_KEY: &str = "entrust_id";

/// The slice of the position ledger the order manager writes to.
///
/// Registration happens before the gateway sees the order so that pre-trade
/// exposure is visible even if submission fails.
pub trait OrderLedger {
    fn add_order(&mut self, order: &Order);
    fn on_trade_ind(&mut self, ind: &TradeInd);
    fn on_order_status(&mut self, ind: &OrderStatusInd);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionError {
    /// Only `ExecAlgo::Default` can be executed.
    UnsupportedAlgorithm { algo: String },
    /// Cancel requested for a task this manager never issued.
    UnknownTask { task_id: TaskId },
    /// At least one entrust order of the task could not be cancelled.
    PartialCancelFailure(CancelReport),
    /// The gateway refused a single-order task. The task stays registered.
    Gateway {
        task_id: TaskId,
        entrust_id: EntrustId,
        message: String,
    },
    /// More than `MAX_SEQ_PER_DAY` ids requested for one key on one date.
    IdSpaceExhausted { key: &'static str, trade_date: u32 },
    /// Order size must be strictly positive.
    NonPositiveSize { symbol: String, size: i64 },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm { algo } => {
                write!(f, "unsupported algorithm '{algo}'")
            }
            Self::UnknownTask { task_id } => write!(f, "unknown task {task_id}"),
            Self::PartialCancelFailure(report) => write!(
                f,
                "cancel failed for {} of {} orders: {}",
                report.failure_count(),
                report.outcomes.len(),
                report.aggregated_message()
            ),
            Self::Gateway {
                task_id,
                entrust_id,
                message,
            } => write!(
                f,
                "gateway refused task {task_id} entrust {entrust_id}: {message}"
            ),
            Self::IdSpaceExhausted { key, trade_date } => write!(
                f,
                "{key} sequence exhausted on {trade_date} (max {MAX_SEQ_PER_DAY} per day)"
            ),
            Self::NonPositiveSize { symbol, size } => {
                write!(f, "order size must be > 0 for {symbol}, got {size}")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

// ---------------------------------------------------------------------------
// Structured results
// ---------------------------------------------------------------------------

/// Result of one entrust-level request. `error == None` is success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntrustOutcome {
    pub entrust_id: EntrustId,
    pub error: Option<String>,
}

impl EntrustOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn join_messages(outcomes: &[EntrustOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| o.error.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Per-entrust results of cancelling one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelReport {
    pub task_id: TaskId,
    pub outcomes: Vec<EntrustOutcome>,
}

impl CancelReport {
    /// All-or-nothing: true only when every cancel succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(EntrustOutcome::is_ok)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Messages in entrust order joined by `,`. Successful cancels contribute
    /// an empty entry so positions line up with `outcomes`.
    pub fn aggregated_message(&self) -> String {
        join_messages(&self.outcomes)
    }
}

/// Per-entrust results of submitting one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub task_id: TaskId,
    pub outcomes: Vec<EntrustOutcome>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(EntrustOutcome::is_ok)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    pub fn aggregated_message(&self) -> String {
        join_messages(&self.outcomes)
    }
}

fn rejected(entrust_id: EntrustId) -> OrderStatusInd {
    OrderStatusInd {
        entrust_id,
        status: OrderStatus::Rejected,
        fill_size: 0,
    }
}

// ---------------------------------------------------------------------------
// OrderManager
// ---------------------------------------------------------------------------

/// Owns id sequences and the task → entrust map for one strategy instance.
#[derive(Clone, Debug, Default)]
pub struct OrderManager {
    seq: SequenceGenerator,
    tasks: BTreeMap<TaskId, Vec<EntrustId>>,
    trade_date: u32,
}

impl OrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade_date(&self) -> u32 {
        self.trade_date
    }

    /// Move to a new trading date. Sequences restart at 1 for the new date
    /// and the counters of other dates are dropped. Previously issued tasks
    /// stay cancellable until [`OrderManager::retain_tasks`] retires them.
    pub fn on_new_day(&mut self, trade_date: u32) {
        self.trade_date = trade_date;
        let suffix = format!("@{trade_date}");
        self.seq.retain_keys(|k| k.ends_with(&suffix));
    }

    /// Keep only the tasks `keep` accepts.
    pub fn retain_tasks<F>(&mut self, mut keep: F)
    where
        F: FnMut(TaskId, &[EntrustId]) -> bool,
    {
        let before = self.tasks.len();
        self.tasks.retain(|task_id, entrusts| keep(*task_id, entrusts));
        let retired = before - self.tasks.len();
        if retired > 0 {
            debug!(retired, live = self.tasks.len(), "tasks retired");
        }
    }

    /// Entrust ids issued under `task_id`, in submission order.
    pub fn task_orders(&self, task_id: TaskId) -> Option<&[EntrustId]> {
        self.tasks.get(&task_id).map(Vec::as_slice)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn seq_key(&self, key: &str) -> String {
        format!("{key}@{}", self.trade_date)
    }

    fn mint(&mut self, key: &'static str) -> Result<u64, ExecutionError> {
        let trade_date = self.trade_date;
        let seq_key = self.seq_key(key);
        let seq = self.seq.get_next(&seq_key);
        compose_id(trade_date, seq).ok_or(ExecutionError::IdSpaceExhausted { key, trade_date })
    }

    fn mint_task_id(&mut self) -> Result<TaskId, ExecutionError> {
        self.mint(TASK_KEY).map(TaskId)
    }

    fn mint_entrust_id(&mut self) -> Result<EntrustId, ExecutionError> {
        self.mint(ENTRUST_KEY).map(EntrustId)
    }

    /// Submit a single order as its own task.
    #[allow(clippy::too_many_arguments)]
    pub fn place_order<L, G>(
        &mut self,
        ledger: &mut L,
        gateway: &mut G,
        symbol: &str,
        side: Side,
        price: f64,
        size: i64,
        algo: ExecAlgo,
    ) -> Result<TaskId, ExecutionError>
    where
        L: OrderLedger + ?Sized,
        G: OrderGateway + ?Sized,
    {
        if algo != ExecAlgo::Default {
            return Err(ExecutionError::UnsupportedAlgorithm {
                algo: algo.to_string(),
            });
        }
        if size <= 0 {
            return Err(ExecutionError::NonPositiveSize {
                symbol: symbol.to_string(),
                size,
            });
        }

        let task_id = self.mint_task_id()?;
        let entrust_id = self.mint_entrust_id()?;

        let mut order = Order::new(symbol, side, price, size, self.trade_date, 0);
        order.task_id = Some(task_id);
        order.entrust_id = Some(entrust_id);

        self.tasks.entry(task_id).or_default().push(entrust_id);
        ledger.add_order(&order);

        debug!(%task_id, %entrust_id, symbol, %side, price, size, "place_order");

        match gateway.place_order(&order) {
            Ok(()) => Ok(task_id),
            Err(e) => {
                warn!(%task_id, %entrust_id, symbol, error = %e.message, "place_order refused");
                ledger.on_order_status(&rejected(entrust_id));
                Err(ExecutionError::Gateway {
                    task_id,
                    entrust_id,
                    message: e.message,
                })
            }
        }
    }

    /// Cancel every entrust order under `task_id`.
    ///
    /// Each cancel is independent. The overall result is `Ok` only if all of
    /// them succeed; otherwise the full per-order report is returned inside
    /// [`ExecutionError::PartialCancelFailure`].
    pub fn cancel_order<G>(
        &mut self,
        gateway: &mut G,
        task_id: TaskId,
    ) -> Result<CancelReport, ExecutionError>
    where
        G: OrderGateway + ?Sized,
    {
        let entrust_ids = self
            .tasks
            .get(&task_id)
            .ok_or(ExecutionError::UnknownTask { task_id })?;

        let outcomes: Vec<EntrustOutcome> = entrust_ids
            .iter()
            .map(|&entrust_id| EntrustOutcome {
                entrust_id,
                error: gateway.cancel_order(entrust_id).err().map(|e| e.message),
            })
            .collect();

        let report = CancelReport { task_id, outcomes };
        if report.is_success() {
            debug!(%task_id, orders = report.outcomes.len(), "cancel_order");
            Ok(report)
        } else {
            warn!(
                %task_id,
                failed = report.failure_count(),
                errors = %report.aggregated_message(),
                "cancel_order partially failed"
            );
            Err(ExecutionError::PartialCancelFailure(report))
        }
    }

    /// Submit pre-built orders under one shared task id.
    ///
    /// Each order gets its own entrust id and is submitted in list order.
    /// Gateway refusals are recorded per order and never stop the batch.
    /// Id capacity for the whole batch is checked up front, so running out
    /// of ids fails before any order reaches the ledger or the gateway.
    pub fn place_batch_order<L, G>(
        &mut self,
        ledger: &mut L,
        gateway: &mut G,
        orders: Vec<Order>,
    ) -> Result<BatchReport, ExecutionError>
    where
        L: OrderLedger + ?Sized,
        G: OrderGateway + ?Sized,
    {
        let used = self.seq.current(&self.seq_key(ENTRUST_KEY));
        let available = MAX_SEQ_PER_DAY.saturating_sub(used);
        if orders.len() as u64 > available {
            return Err(ExecutionError::IdSpaceExhausted {
                key: ENTRUST_KEY,
                trade_date: self.trade_date,
            });
        }

        let task_id = self.mint_task_id()?;
        self.tasks.entry(task_id).or_default();

        let mut outcomes = Vec::with_capacity(orders.len());
        for mut order in orders {
            let entrust_id = self.mint_entrust_id()?;
            order.task_id = Some(task_id);
            order.entrust_id = Some(entrust_id);

            ledger.add_order(&order);
            let error = gateway.place_order(&order).err().map(|e| e.message);
            if let Some(msg) = &error {
                warn!(%task_id, %entrust_id, symbol = %order.symbol, error = %msg, "batch order refused");
                ledger.on_order_status(&rejected(entrust_id));
            } else {
                debug!(%task_id, %entrust_id, symbol = %order.symbol, side = %order.side, size = order.size, "batch order");
            }

            self.tasks.entry(task_id).or_default().push(entrust_id);
            outcomes.push(EntrustOutcome { entrust_id, error });
        }

        Ok(BatchReport { task_id, outcomes })
    }

    pub fn on_trade_ind<L: OrderLedger + ?Sized>(&self, ledger: &mut L, ind: &TradeInd) {
        ledger.on_trade_ind(ind);
    }

    pub fn on_order_status<L: OrderLedger + ?Sized>(&self, ledger: &mut L, ind: &OrderStatusInd) {
        ledger.on_order_status(ind);
    }
}
