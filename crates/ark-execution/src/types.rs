use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum tradable share increment.
pub const LOT_SIZE: i64 = 100;

/// Task identifier: `trade_date * 10000 + seq`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// Entrust (broker-level order) identifier: `trade_date * 10000 + seq`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntrustId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntrustId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of a single entrust order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Built and registered locally, not yet acknowledged.
    New,
    /// Acknowledged by the broker; no fills yet.
    Accepted,
    /// Some but not all of the size has traded.
    PartFilled,
    /// Fully traded. **Terminal.**
    Filled,
    /// Cancel confirmed. **Terminal.**
    Cancelled,
    /// Refused by the broker. **Terminal.**
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

/// Execution algorithm requested for a task.
///
/// Only `Default` is executable; the named algorithms are recognised so that
/// callers get an explicit refusal instead of silent default routing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecAlgo {
    #[default]
    Default,
    Vwap,
    Twap,
}

impl fmt::Display for ExecAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecAlgo::Default => write!(f, "default"),
            ExecAlgo::Vwap => write!(f, "vwap"),
            ExecAlgo::Twap => write!(f, "twap"),
        }
    }
}

/// Price reference the allocator sizes against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecStyle {
    #[default]
    Close,
    Vwap,
    Open,
}

impl ExecStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecStyle::Close => "close",
            ExecStyle::Vwap => "vwap",
            ExecStyle::Open => "open",
        }
    }
}

impl fmt::Display for ExecStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(ExecStyle::Close),
            "vwap" => Ok(ExecStyle::Vwap),
            "open" => Ok(ExecStyle::Open),
            other => Err(format!("unknown exec style '{other}'")),
        }
    }
}

/// A single broker-level order.
///
/// `task_id` / `entrust_id` are `None` until the order manager mints them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    /// Always positive; direction lives in `side`.
    pub size: i64,
    /// YYYYMMDD.
    pub entrust_date: u32,
    /// HHMMSS; 0 when the order is built off-session.
    pub entrust_time: u32,
    pub task_id: Option<TaskId>,
    pub entrust_id: Option<EntrustId>,
    pub status: OrderStatus,
    /// Price reference the order was sized against.
    pub price_target: ExecStyle,
}

impl Order {
    pub fn new<S: Into<String>>(
        symbol: S,
        side: Side,
        price: f64,
        size: i64,
        entrust_date: u32,
        entrust_time: u32,
    ) -> Self {
        debug_assert!(size > 0, "Order.size must be > 0");
        Self {
            symbol: symbol.into(),
            side,
            price,
            size,
            entrust_date,
            entrust_time,
            task_id: None,
            entrust_id: None,
            status: OrderStatus::New,
            price_target: ExecStyle::Close,
        }
    }

    pub fn with_price_target(mut self, target: ExecStyle) -> Self {
        self.price_target = target;
        self
    }

    /// Size signed by side: +buy, -sell.
    pub fn signed_size(&self) -> i64 {
        self.side.sign() * self.size
    }
}

/// Target absolute share count for one symbol at cycle end (not a delta).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPosition {
    pub symbol: String,
    pub size: i64,
}

impl GoalPosition {
    pub fn new<S: Into<String>>(symbol: S, size: i64) -> Self {
        Self {
            symbol: symbol.into(),
            size,
        }
    }
}

/// Fill report from the gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeInd {
    pub entrust_id: EntrustId,
    pub symbol: String,
    pub side: Side,
    pub fill_price: f64,
    /// Always positive.
    pub fill_size: i64,
    pub fill_date: u32,
    pub fill_time: u32,
    pub commission: f64,
}

impl TradeInd {
    pub fn signed_size(&self) -> i64 {
        self.side.sign() * self.fill_size
    }
}

/// Order status report from the gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusInd {
    pub entrust_id: EntrustId,
    pub status: OrderStatus,
    /// Cumulative traded size at the time of the report.
    pub fill_size: i64,
}
