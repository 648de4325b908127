//! ark-portfolio: order quantity allocator
//!
//! Turns normalized weights, a cash budget and a price snapshot into
//! lot-rounded **target** positions for every universe symbol.
//!
//! Pure: no IO, no ledger writes. Re-running with the same request yields the
//! same [`Allocation`]. Diffing targets against holdings happens downstream
//! (`ark_execution::goals_to_orders`).
//!
//! Per symbol, in universe order:
//!
//! | case                              | goal              | cash     |
//! |-----------------------------------|-------------------|----------|
//! | suspended                         | held size         | none     |
//! | \|w\| < 1e-8                      | 0                 | none     |
//! | price missing / NaN / ≤ 0         | held size (gap)   | none     |
//! | otherwise                         | round(w·B/p/lot)·lot | size·p |

use std::collections::BTreeSet;

use ark_execution::{ExecStyle, GoalPosition, PositionBook, LOT_SIZE};
use tracing::debug;

use crate::weights::{WeightMap, NORMALIZE_EPSILON};
use crate::PriceMap;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum AllocationError {
    /// Only `close` and `vwap` prices can be sized against.
    UnsupportedAlgorithm { style: String },
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedAlgorithm { style } => {
                write!(f, "unsupported algorithm: exec style '{style}' is not implemented")
            }
        }
    }
}

impl std::error::Error for AllocationError {}

// ─── Request / result ────────────────────────────────────────────────────────

/// Everything one allocation pass reads.
#[derive(Clone, Debug)]
pub struct AllocationRequest<'a> {
    pub universe: &'a [String],
    pub weights: &'a WeightMap,
    /// Cash available to this cycle.
    pub budget: f64,
    pub prices: &'a PriceMap,
    pub style: ExecStyle,
    pub suspended: &'a BTreeSet<String>,
    /// Current holdings; suspended and price-gap symbols keep these sizes.
    pub held: &'a PositionBook,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    /// One goal per universe symbol, in universe order.
    pub goals: Vec<GoalPosition>,
    pub cash_committed: f64,
    /// `budget - cash_committed`.
    pub cash_left: f64,
    /// Tradable symbols skipped for lack of a usable price.
    pub price_gaps: Vec<String>,
}

impl Allocation {
    pub fn goal(&self, symbol: &str) -> Option<i64> {
        self.goals
            .iter()
            .find(|g| g.symbol == symbol)
            .map(|g| g.size)
    }
}

// ─── Allocator ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct OrderAllocator {
    lot_size: i64,
}

impl Default for OrderAllocator {
    fn default() -> Self {
        Self { lot_size: LOT_SIZE }
    }
}

impl OrderAllocator {
    pub fn new(lot_size: i64) -> Self {
        debug_assert!(lot_size > 0, "lot_size must be > 0");
        Self { lot_size }
    }

    pub fn lot_size(&self) -> i64 {
        self.lot_size
    }

    /// Round a raw share count to the nearest lot. Halves round away from zero.
    pub fn round_to_lot(&self, raw_shares: f64) -> i64 {
        let lots = (raw_shares / self.lot_size as f64).round();
        lots as i64 * self.lot_size
    }

    pub fn allocate(&self, req: &AllocationRequest<'_>) -> Result<Allocation, AllocationError> {
        match req.style {
            ExecStyle::Close | ExecStyle::Vwap => {}
            other => {
                return Err(AllocationError::UnsupportedAlgorithm {
                    style: other.to_string(),
                })
            }
        }

        let held = |sym: &str| req.held.get(sym).copied().unwrap_or(0);

        let mut goals = Vec::with_capacity(req.universe.len());
        let mut price_gaps = Vec::new();
        let mut committed = 0.0;

        for sym in req.universe {
            if req.suspended.contains(sym) {
                goals.push(GoalPosition::new(sym.as_str(), held(sym)));
                continue;
            }

            let weight = req.weights.get(sym).copied().unwrap_or(0.0);
            if weight.is_nan() || weight.abs() < NORMALIZE_EPSILON {
                goals.push(GoalPosition::new(sym.as_str(), 0));
                continue;
            }

            let price = match req.prices.get(sym).copied() {
                Some(p) if p.is_finite() && p > 0.0 => p,
                _ => {
                    price_gaps.push(sym.clone());
                    goals.push(GoalPosition::new(sym.as_str(), held(sym)));
                    continue;
                }
            };

            let size = self.round_to_lot(weight * req.budget / price);
            committed += size as f64 * price;
            goals.push(GoalPosition::new(sym.as_str(), size));
        }

        debug!(
            symbols = goals.len(),
            budget = req.budget,
            committed,
            gaps = price_gaps.len(),
            style = %req.style,
            "allocated"
        );

        Ok(Allocation {
            goals,
            cash_committed: committed,
            cash_left: req.budget - committed,
            price_gaps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn map(items: &[(&str, f64)]) -> WeightMap {
        items.iter().map(|(s, v)| (s.to_string(), *v)).collect()
    }

    #[test]
    fn sizes_are_lot_multiples_and_cash_tracks() {
        let u = universe();
        let w = map(&[("A", 0.3), ("B", 0.7)]);
        let p = map(&[("A", 13.7), ("B", 41.3)]);
        let held = PositionBook::new();
        let none = BTreeSet::new();
        let req = AllocationRequest {
            universe: &u,
            weights: &w,
            budget: 1_000_000.0,
            prices: &p,
            style: ExecStyle::Close,
            suspended: &none,
            held: &held,
        };
        let a = OrderAllocator::default().allocate(&req).unwrap();

        assert!(a.goals.iter().all(|g| g.size % LOT_SIZE == 0));
        // 0.3e6 / 13.7 = 21897.8 -> 219 lots
        assert_eq!(a.goal("A"), Some(21_900));
        // 0.7e6 / 41.3 = 16949.2 -> 169 lots
        assert_eq!(a.goal("B"), Some(16_900));
        let committed = 21_900.0 * 13.7 + 16_900.0 * 41.3;
        assert!((a.cash_committed - committed).abs() < 1e-6);
        assert!((a.cash_left - (1_000_000.0 - committed)).abs() < 1e-6);
    }

    #[test]
    fn same_request_same_result() {
        let u = universe();
        let w = map(&[("A", 0.5), ("B", 0.5)]);
        let p = map(&[("A", 9.99), ("B", 3.33)]);
        let held = PositionBook::new();
        let none = BTreeSet::new();
        let req = AllocationRequest {
            universe: &u,
            weights: &w,
            budget: 123_456.0,
            prices: &p,
            style: ExecStyle::Vwap,
            suspended: &none,
            held: &held,
        };
        let alloc = OrderAllocator::default();
        assert_eq!(alloc.allocate(&req).unwrap(), alloc.allocate(&req).unwrap());
    }

    #[test]
    fn tiny_weight_means_liquidate() {
        let u = universe();
        let w = map(&[("A", 1e-9), ("B", 1.0)]);
        let p = map(&[("A", 10.0), ("B", 10.0)]);
        let held: PositionBook = [("A".to_string(), 500)].into_iter().collect();
        let none = BTreeSet::new();
        let req = AllocationRequest {
            universe: &u,
            weights: &w,
            budget: 1_000.0,
            prices: &p,
            style: ExecStyle::Close,
            suspended: &none,
            held: &held,
        };
        let a = OrderAllocator::default().allocate(&req).unwrap();
        assert_eq!(a.goal("A"), Some(0));
        assert_eq!(a.goal("B"), Some(100));
    }

    #[test]
    fn missing_price_holds_position_and_reports_gap() {
        let u = universe();
        let w = map(&[("A", 0.5), ("B", 0.5)]);
        let p = map(&[("A", f64::NAN), ("B", 10.0)]);
        let held: PositionBook = [("A".to_string(), 300)].into_iter().collect();
        let none = BTreeSet::new();
        let req = AllocationRequest {
            universe: &u,
            weights: &w,
            budget: 10_000.0,
            prices: &p,
            style: ExecStyle::Close,
            suspended: &none,
            held: &held,
        };
        let a = OrderAllocator::default().allocate(&req).unwrap();
        assert_eq!(a.goal("A"), Some(300));
        assert_eq!(a.goal("B"), Some(500));
        assert_eq!(a.price_gaps, vec!["A".to_string()]);
        assert_eq!(a.cash_left, 5_000.0);
    }

    #[test]
    fn open_style_is_refused() {
        let u = universe();
        let w = map(&[("A", 1.0)]);
        let held = PositionBook::new();
        let none = BTreeSet::new();
        let req = AllocationRequest {
            universe: &u,
            weights: &w,
            budget: 1.0,
            prices: &w,
            style: ExecStyle::Open,
            suspended: &none,
            held: &held,
        };
        let err = OrderAllocator::default().allocate(&req).unwrap_err();
        assert_eq!(
            err,
            AllocationError::UnsupportedAlgorithm {
                style: "open".to_string()
            }
        );
    }

    #[test]
    fn half_lots_round_away_from_zero() {
        let a = OrderAllocator::default();
        assert_eq!(a.round_to_lot(150.0), 200);
        assert_eq!(a.round_to_lot(250.0), 300);
        assert_eq!(a.round_to_lot(-250.0), -300);
        assert_eq!(a.round_to_lot(249.9), 200);
        assert_eq!(a.round_to_lot(49.0), 0);
    }
}
