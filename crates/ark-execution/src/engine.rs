use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ExecStyle, GoalPosition, Order, Side};
use crate::PositionBook;

/// Convert goal positions into orders given current holdings.
///
/// Rules:
/// - delta = goal - current; delta > 0 => BUY delta, delta < 0 => SELL -delta
/// - symbols held but absent from `goals` are left alone (goals must cover
///   the universe; anything outside it is not ours to trade)
/// - order price is taken from `prices`, 0.0 when unknown
/// - deterministic ordering by symbol
pub fn goals_to_orders(
    current: &PositionBook,
    goals: &[GoalPosition],
    prices: &BTreeMap<String, f64>,
    trade_date: u32,
    price_target: ExecStyle,
) -> Vec<Order> {
    // Last write wins if a symbol appears twice.
    let mut targets: BTreeMap<&str, i64> = BTreeMap::new();
    for g in goals {
        targets.insert(g.symbol.as_str(), g.size);
    }

    let symbols: BTreeSet<&str> = targets.keys().copied().collect();

    let mut orders = Vec::new();
    for sym in symbols {
        let cur = current.get(sym).copied().unwrap_or(0);
        let tgt = targets[sym];
        let delta = tgt - cur;
        if delta == 0 {
            continue;
        }

        let side = if delta > 0 { Side::Buy } else { Side::Sell };
        let price = prices
            .get(sym)
            .copied()
            .filter(|p| p.is_finite())
            .unwrap_or(0.0);
        orders.push(
            Order::new(sym, side, price, delta.abs(), trade_date, 0).with_price_target(price_target),
        );
    }
    orders
}
