//! Position/cash ledger contract and its in-memory implementation.
//!
//! # Contract
//! [`PortfolioManager`] is the authoritative position ledger the strategy
//! consults. It is written only through the [`OrderLedger`] entry points
//! (`add_order`, `on_trade_ind`, `on_order_status`) plus the day roll.
//!
//! # In-memory ledger
//! [`Ledger`] keeps every registered order keyed by entrust id, applies
//! fills with average-cost accounting and tracks order status with a small
//! transition table:
//!
//! ```text
//! New ──► Accepted ──► PartFilled ──► Filled     (terminal)
//!  │         │             │
//!  │         └─────────────┴────────► Cancelled  (terminal)
//!  └────────────────────────────────► Rejected   (terminal)
//! ```
//!
//! Illegal status reports are not applied; they are counted and logged so a
//! reconcile step can pick them up.

use std::collections::{BTreeMap, BTreeSet};

use ark_execution::{EntrustId, Order, OrderLedger, OrderStatus, OrderStatusInd, PositionBook, TradeInd};
use tracing::warn;

use crate::accounting::{apply_fill, fill_cash_flow};
use crate::types::Position;
use crate::PriceMap;

pub trait PortfolioManager: OrderLedger {
    /// Roll the ledger to a new trading date.
    fn on_new_day(&mut self, trade_date: u32, last_date: u32);

    /// Position for `symbol` as of `trade_date`; `None` if never traded.
    fn get_position(&self, symbol: &str, trade_date: u32) -> Option<Position>;

    /// Σ size × price over holdings, skipping `excluded` symbols.
    fn market_value(&self, trade_date: u32, prices: &PriceMap, excluded: &BTreeSet<String>) -> f64;

    /// Symbols with a non-zero position.
    fn holding_securities(&self) -> BTreeSet<String>;

    /// A registered order by entrust id.
    fn get_order(&self, entrust_id: EntrustId) -> Option<&Order>;

    /// Current non-zero holdings as a book.
    fn position_book(&self, trade_date: u32) -> PositionBook {
        self.holding_securities()
            .into_iter()
            .filter_map(|sym| {
                self.get_position(&sym, trade_date)
                    .map(|p| (sym, p.curr_size))
            })
            .collect()
    }
}

/// Returns true if `from → to` is a legal status move.
///
/// Repeating a non-terminal state is allowed (idempotent acks, successive
/// partial fills). Terminal states accept nothing else.
pub fn is_legal_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    if from == to {
        return true;
    }
    match from {
        New => true,
        Accepted => matches!(to, PartFilled | Filled | Cancelled),
        PartFilled => matches!(to, Filled | Cancelled),
        Filled | Cancelled | Rejected => false,
    }
}

#[derive(Clone, Debug)]
struct OrderRecord {
    order: Order,
    filled_size: i64,
}

/// In-memory [`PortfolioManager`] used by backtests, the paper CLI and tests.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    trade_date: u32,
    positions: BTreeMap<String, Position>,
    orders: BTreeMap<EntrustId, OrderRecord>,
    /// Net cash moved by fills (buys negative, sells positive, minus fees).
    cash_flow: f64,
    illegal_status_reports: usize,
    unknown_fills: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a starting position (e.g. carried in from a previous run).
    pub fn with_position(mut self, symbol: &str, size: i64, avg_cost: f64) -> Self {
        let mut pos = Position::new(symbol, self.trade_date);
        pos.curr_size = size;
        pos.init_size = size;
        pos.avg_cost = if size == 0 { 0.0 } else { avg_cost };
        self.positions.insert(symbol.to_string(), pos);
        self
    }

    pub fn trade_date(&self) -> u32 {
        self.trade_date
    }

    pub fn cash_flow(&self) -> f64 {
        self.cash_flow
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn order_status(&self, entrust_id: EntrustId) -> Option<OrderStatus> {
        self.orders.get(&entrust_id).map(|r| r.order.status)
    }

    pub fn filled_size(&self, entrust_id: EntrustId) -> Option<i64> {
        self.orders.get(&entrust_id).map(|r| r.filled_size)
    }

    /// Status reports refused by the transition table.
    pub fn illegal_status_reports(&self) -> usize {
        self.illegal_status_reports
    }

    /// Fills whose entrust id was never registered.
    pub fn unknown_fills(&self) -> usize {
        self.unknown_fills
    }

    fn set_status(&mut self, entrust_id: EntrustId, to: OrderStatus) {
        let Some(rec) = self.orders.get_mut(&entrust_id) else {
            return;
        };
        let from = rec.order.status;
        if is_legal_transition(from, to) {
            rec.order.status = to;
        } else {
            self.illegal_status_reports += 1;
            warn!(%entrust_id, ?from, ?to, "illegal order status transition ignored");
        }
    }
}

impl OrderLedger for Ledger {
    fn add_order(&mut self, order: &Order) {
        let Some(entrust_id) = order.entrust_id else {
            warn!(symbol = %order.symbol, "add_order without entrust id ignored");
            return;
        };
        self.orders.insert(
            entrust_id,
            OrderRecord {
                order: order.clone(),
                filled_size: 0,
            },
        );
    }

    fn on_trade_ind(&mut self, ind: &TradeInd) {
        let trade_date = self.trade_date;
        let pos = self
            .positions
            .entry(ind.symbol.clone())
            .or_insert_with(|| Position::new(ind.symbol.clone(), trade_date));
        apply_fill(pos, ind.signed_size(), ind.fill_price);
        pos.trade_date = trade_date;
        self.cash_flow += fill_cash_flow(ind.signed_size(), ind.fill_price, ind.commission);

        let next = match self.orders.get_mut(&ind.entrust_id) {
            Some(rec) => {
                rec.filled_size += ind.fill_size;
                Some(if rec.filled_size >= rec.order.size {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartFilled
                })
            }
            None => {
                self.unknown_fills += 1;
                warn!(entrust_id = %ind.entrust_id, symbol = %ind.symbol, "fill for unregistered order");
                None
            }
        };
        if let Some(status) = next {
            self.set_status(ind.entrust_id, status);
        }
    }

    fn on_order_status(&mut self, ind: &OrderStatusInd) {
        if !self.orders.contains_key(&ind.entrust_id) {
            warn!(entrust_id = %ind.entrust_id, "status for unregistered order ignored");
            return;
        }
        self.set_status(ind.entrust_id, ind.status);
    }
}

impl PortfolioManager for Ledger {
    fn on_new_day(&mut self, trade_date: u32, _last_date: u32) {
        self.trade_date = trade_date;
        for pos in self.positions.values_mut() {
            pos.init_size = pos.curr_size;
            pos.trade_date = trade_date;
        }
    }

    fn get_position(&self, symbol: &str, trade_date: u32) -> Option<Position> {
        self.positions.get(symbol).map(|p| {
            let mut snap = p.clone();
            snap.trade_date = trade_date;
            snap
        })
    }

    fn market_value(&self, trade_date: u32, prices: &PriceMap, excluded: &BTreeSet<String>) -> f64 {
        let mut total = 0.0;
        for (sym, pos) in &self.positions {
            if pos.is_flat() || excluded.contains(sym) {
                continue;
            }
            match prices.get(sym).copied().filter(|p| p.is_finite()) {
                Some(price) => total += pos.curr_size as f64 * price,
                None => {
                    warn!(symbol = %sym, trade_date, "no usable price for holding; excluded from market value");
                }
            }
        }
        total
    }

    fn holding_securities(&self) -> BTreeSet<String> {
        self.positions
            .iter()
            .filter(|(_, p)| !p.is_flat())
            .map(|(s, _)| s.clone())
            .collect()
    }

    fn get_order(&self, entrust_id: EntrustId) -> Option<&Order> {
        self.orders.get(&entrust_id).map(|r| &r.order)
    }
}
