use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::weights::{rescale_l1, WeightMap};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReweightError {
    /// No universe symbol is tradable on this date.
    AllSuspended { universe_size: usize },
}

impl fmt::Display for ReweightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSuspended { universe_size } => {
                write!(f, "all {universe_size} universe symbols are suspended")
            }
        }
    }
}

impl std::error::Error for ReweightError {}

/// Zero the weights of suspended symbols and renormalize the rest to unit L1.
///
/// - empty `suspended` is a no-op
/// - every universe symbol suspended is an error; `weights` is left as-is
/// - renormalization is skipped if the remaining mass is exactly 0
pub fn reweight_suspensions(
    weights: &mut WeightMap,
    suspended: &BTreeSet<String>,
    universe: &[String],
) -> Result<(), ReweightError> {
    if suspended.is_empty() {
        return Ok(());
    }
    if universe.iter().all(|s| suspended.contains(s)) {
        return Err(ReweightError::AllSuspended {
            universe_size: universe.len(),
        });
    }

    for sym in suspended {
        if let Some(w) = weights.get_mut(sym) {
            *w = 0.0;
        }
    }
    rescale_l1(weights);

    debug!(suspended = suspended.len(), "reweighted around suspensions");
    Ok(())
}
