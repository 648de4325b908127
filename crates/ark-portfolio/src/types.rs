use serde::{Deserialize, Serialize};

/// Held position for one symbol as seen by the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Date the snapshot was taken for (YYYYMMDD).
    pub trade_date: u32,
    /// Signed share count: +long, -short.
    pub curr_size: i64,
    /// Size carried in at the start of `trade_date`.
    pub init_size: i64,
    /// Average entry price of the open size; 0.0 when flat.
    pub avg_cost: f64,
}

impl Position {
    pub fn new<S: Into<String>>(symbol: S, trade_date: u32) -> Self {
        Self {
            symbol: symbol.into(),
            trade_date,
            curr_size: 0,
            init_size: 0,
            avg_cost: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.curr_size == 0
    }
}
