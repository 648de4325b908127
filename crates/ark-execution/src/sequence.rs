//! Per-key monotonic counters for minting task and entrust identifiers.
//!
//! # Contract
//!
//! [`SequenceGenerator::get_next`] returns `1, 2, 3, …` for each distinct key,
//! with no gaps and no repeats, for the lifetime of the generator. Keys are
//! independent: advancing `"task_id"` never moves `"entrust_id"`.
//!
//! External identifiers are composed as
//!
//! ```text
//! trade_date * 10000 + seq        e.g. 20240315 * 10000 + 7 = 202403150007
//! ```
//!
//! which leaves four decimal digits for the sequence. [`compose_id`] refuses
//! anything above [`MAX_SEQ_PER_DAY`] rather than letting it spill into the
//! date digits.
//!
//! # Ownership
//! The generator is plain owned state. It is not `Sync`; the order manager
//! that owns it is the only writer.

use std::collections::HashMap;

/// Largest sequence value that fits the `date * 10000 + seq` layout.
pub const MAX_SEQ_PER_DAY: u64 = 9_999;

const ID_DATE_FACTOR: u64 = 10_000;

#[derive(Clone, Debug, Default)]
pub struct SequenceGenerator {
    /// key → last value handed out
    counters: HashMap<String, u64>,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value for `key`, starting at 1.
    pub fn get_next(&mut self, key: &str) -> u64 {
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Last value handed out for `key` (0 if never used).
    pub fn current(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Forget every key `keep` rejects. A forgotten key starts again at 1.
    pub fn retain_keys<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.counters.retain(|k, _| keep(k));
    }

    /// Number of keys that have been advanced at least once.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

/// Compose `trade_date * 10000 + seq`.
///
/// Returns `None` when `seq` is 0 or exceeds [`MAX_SEQ_PER_DAY`].
pub fn compose_id(trade_date: u32, seq: u64) -> Option<u64> {
    if seq == 0 || seq > MAX_SEQ_PER_DAY {
        return None;
    }
    Some(u64::from(trade_date) * ID_DATE_FACTOR + seq)
}

/// Split a composed id back into `(trade_date, seq)`.
pub fn split_id(id: u64) -> (u32, u64) {
    ((id / ID_DATE_FACTOR) as u32, id % ID_DATE_FACTOR)
}
