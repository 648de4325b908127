//! ark-execution
//!
//! Order-side plumbing for the rebalance engine:
//! - order / goal / fill data types
//! - per-key sequence generator for task and entrust ids
//! - gateway contract consumed by the order manager
//! - task → entrust-order lifecycle (place, batch, cancel, callbacks)
//! - goal diffing: (current holdings, goal positions) -> orders
//!
//! No IO and no wall-clock; the gateway is the only outward edge.

mod engine;
mod gateway;
mod manager;
mod types;

pub mod sequence;

pub use engine::goals_to_orders;
pub use gateway::{GatewayError, OrderGateway};
pub use manager::{
    BatchReport, CancelReport, EntrustOutcome, ExecutionError, OrderLedger, OrderManager,
};
pub use sequence::SequenceGenerator;
pub use types::{
    EntrustId, ExecAlgo, ExecStyle, GoalPosition, Order, OrderStatus, OrderStatusInd, Side,
    TaskId, TradeInd, LOT_SIZE,
};

use std::collections::BTreeMap;

/// Current holdings keyed by symbol (shares, signed).
pub type PositionBook = BTreeMap<String, i64>;

/// Helper to build a PositionBook with minimal boilerplate in tests/callers.
pub fn position_book<I, S>(items: I) -> PositionBook
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let mut book = PositionBook::new();
    for (sym, qty) in items {
        book.insert(sym.into(), qty);
    }
    book
}
