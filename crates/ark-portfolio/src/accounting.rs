use crate::types::Position;

/// Apply a signed fill to a position using average-cost accounting.
///
/// Rules:
/// - Opening or adding in the current direction re-weights `avg_cost`.
/// - Reducing keeps `avg_cost`; going flat resets it to 0.0.
/// - Crossing through zero opens the remainder at `price`.
pub fn apply_fill(pos: &mut Position, signed_size: i64, price: f64) {
    if signed_size == 0 {
        return;
    }

    let old = pos.curr_size;
    let new = old + signed_size;

    let same_direction = old == 0 || old.signum() == signed_size.signum();
    if same_direction {
        let old_notional = old.abs() as f64 * pos.avg_cost;
        let add_notional = signed_size.abs() as f64 * price;
        pos.avg_cost = (old_notional + add_notional) / new.abs() as f64;
    } else if new == 0 {
        pos.avg_cost = 0.0;
    } else if new.signum() != old.signum() {
        pos.avg_cost = price;
    }

    pos.curr_size = new;
}

/// Cash movement of a fill from the account's point of view.
/// Buys spend, sells receive; commission always spends.
pub fn fill_cash_flow(signed_size: i64, price: f64, commission: f64) -> f64 {
    -(signed_size as f64) * price - commission
}
