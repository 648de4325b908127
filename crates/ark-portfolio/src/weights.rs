use std::collections::BTreeMap;

/// Symbol → signed capital fraction.
pub type WeightMap = BTreeMap<String, f64>;

/// Below this L1 mass a weight vector is treated as empty.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Σ|w|.
pub fn l1_norm(weights: &WeightMap) -> f64 {
    weights.values().map(|w| w.abs()).sum()
}

/// Shift-then-scale normalization.
///
/// 1. NaN → 0.0
/// 2. `delta = 2 * |min(w)|`
/// 3. every weight += `delta`
/// 4. if Σ|w| > [`NORMALIZE_EPSILON`], divide by Σ|w|; otherwise keep the
///    shifted values
///
/// The shift runs even when every weight is already non-negative, so
/// `{-0.2, 0.4}` becomes `{0.2, 0.8}` but `{0.5, 1.5}` becomes
/// `{1.5/4, 2.5/4}`.
pub fn normalize_weights(weights: &mut WeightMap) {
    if weights.is_empty() {
        return;
    }

    for w in weights.values_mut() {
        if w.is_nan() {
            *w = 0.0;
        }
    }

    let min = weights.values().copied().fold(f64::INFINITY, f64::min);
    let delta = 2.0 * min.abs();
    for w in weights.values_mut() {
        *w += delta;
    }

    let total = l1_norm(weights);
    if total > NORMALIZE_EPSILON {
        for w in weights.values_mut() {
            *w /= total;
        }
    }
}

/// Scale so Σ|w| == 1. Leaves the map untouched when the sum is exactly 0.
pub fn rescale_l1(weights: &mut WeightMap) {
    let total = l1_norm(weights);
    if total == 0.0 {
        return;
    }
    for w in weights.values_mut() {
        *w /= total;
    }
}

/// 1/N over `universe`.
pub fn equal_weights(universe: &[String]) -> WeightMap {
    if universe.is_empty() {
        return WeightMap::new();
    }
    let w = 1.0 / universe.len() as f64;
    universe.iter().map(|s| (s.clone(), w)).collect()
}

/// 0.0 for every symbol in `universe`.
pub fn zero_weights(universe: &[String]) -> WeightMap {
    universe.iter().map(|s| (s.clone(), 0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wm(items: &[(&str, f64)]) -> WeightMap {
        items.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    #[test]
    fn negative_minimum_is_shifted_out() {
        let mut w = wm(&[("A", -0.2), ("B", 0.4)]);
        normalize_weights(&mut w);
        assert!((w["A"] - 0.2).abs() < 1e-12);
        assert!((w["B"] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn shift_applies_to_non_negative_input() {
        let mut w = wm(&[("A", 1.0), ("B", 3.0)]);
        normalize_weights(&mut w);
        // delta = 2 -> {3, 5} / 8
        assert!((w["A"] - 0.375).abs() < 1e-12);
        assert!((w["B"] - 0.625).abs() < 1e-12);
    }

    #[test]
    fn nan_becomes_zero_before_shift() {
        let mut w = wm(&[("A", f64::NAN), ("B", 1.0), ("C", 1.0)]);
        normalize_weights(&mut w);
        assert_eq!(w["A"], 0.0);
        assert!((w["B"] - 0.5).abs() < 1e-12);
        assert!((l1_norm(&w) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_stays_zero() {
        let mut w = wm(&[("A", 0.0), ("B", 0.0)]);
        normalize_weights(&mut w);
        assert!(w.values().all(|v| *v == 0.0));
    }

    #[test]
    fn unit_norm_over_assorted_inputs() {
        let cases: [&[(&str, f64)]; 4] = [
            &[("A", -3.0), ("B", 7.0), ("C", 0.5)],
            &[("A", 1e-3)],
            &[("A", -1.0), ("B", -2.0)],
            &[("A", 0.0), ("B", 0.0), ("C", 2.5)],
        ];
        for case in cases {
            let mut w = wm(case);
            normalize_weights(&mut w);
            let n = l1_norm(&w);
            assert!((n - 1.0).abs() < 1e-6, "case {case:?} -> {n}");
            assert!(w.values().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn empty_is_noop() {
        let mut w = WeightMap::new();
        normalize_weights(&mut w);
        assert!(w.is_empty());
    }

    #[test]
    fn rescale_skips_zero_mass() {
        let mut w = wm(&[("A", 0.0)]);
        rescale_l1(&mut w);
        assert_eq!(w["A"], 0.0);

        let mut w = wm(&[("A", 0.25), ("B", 0.25)]);
        rescale_l1(&mut w);
        assert_eq!(w["A"], 0.5);
    }

    #[test]
    fn equal_weights_cover_universe() {
        let u = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let w = equal_weights(&u);
        assert_eq!(w.len(), 4);
        assert!(w.values().all(|v| *v == 0.25));
        assert!(equal_weights(&[]).is_empty());
    }
}
