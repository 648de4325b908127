//! ark-portfolio
//!
//! Portfolio-side state and pure sizing math:
//! - position ledger contract ([`PortfolioManager`]) and an in-memory ledger
//! - average-cost fill accounting
//! - weight normalization and suspension reweighting
//! - cash/lot-constrained allocator producing goal positions
//!
//! Nothing here talks to a gateway; orders reach the ledger through
//! `ark_execution::OrderLedger`.

mod accounting;
mod allocator;
mod ledger;
mod suspension;
mod types;
mod weights;

pub use accounting::{apply_fill, fill_cash_flow};
pub use allocator::{Allocation, AllocationError, AllocationRequest, OrderAllocator};
pub use ledger::{is_legal_transition, Ledger, PortfolioManager};
pub use suspension::{reweight_suspensions, ReweightError};
pub use types::Position;
pub use weights::{
    equal_weights, l1_norm, normalize_weights, rescale_l1, zero_weights, WeightMap,
    NORMALIZE_EPSILON,
};

use std::collections::BTreeMap;

/// Symbol → price for one snapshot (close or vwap).
pub type PriceMap = BTreeMap<String, f64>;
