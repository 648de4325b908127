//! Per-date rebalance state machine.
//!
//! ```text
//! on_new_day ─► Idle ──before_open──► BeforeOpen ──after_open──► AfterOpen ──send──► Submitted
//! ```
//!
//! Every stage runs at most once per date. Calling a stage out of order is a
//! caller bug; the engine reports it as a [`CycleViolation`] and changes
//! nothing.

use std::fmt;

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancePhase {
    Idle,
    BeforeOpen,
    AfterOpen,
    Submitted,
}

impl fmt::Display for RebalancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::BeforeOpen => "BEFORE_OPEN",
            Self::AfterOpen => "AFTER_OPEN",
            Self::Submitted => "SUBMITTED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleViolation {
    pub operation: &'static str,
    pub expected: RebalancePhase,
    pub actual: RebalancePhase,
    pub trade_date: u32,
}

impl fmt::Display for CycleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} requires phase {} but cycle is {}",
            self.operation, self.trade_date, self.expected, self.actual
        )
    }
}

impl std::error::Error for CycleViolation {}

#[derive(Clone, Debug)]
pub struct RebalanceCycle {
    phase: RebalancePhase,
    trade_date: u32,
}

impl Default for RebalanceCycle {
    fn default() -> Self {
        Self {
            phase: RebalancePhase::Idle,
            trade_date: 0,
        }
    }
}

impl RebalanceCycle {
    pub fn phase(&self) -> RebalancePhase {
        self.phase
    }

    pub fn trade_date(&self) -> u32 {
        self.trade_date
    }

    pub fn new_day(&mut self, trade_date: u32) {
        self.trade_date = trade_date;
        self.phase = RebalancePhase::Idle;
    }

    /// Fail unless the cycle is in `expected`.
    pub fn require(&self, operation: &'static str, expected: RebalancePhase) -> Result<(), CycleViolation> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CycleViolation {
                operation,
                expected,
                actual: self.phase,
                trade_date: self.trade_date,
            })
        }
    }

    /// Move to `next`; only called after the stage succeeded.
    pub fn advance(&mut self, next: RebalancePhase) {
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_both_phases() {
        let mut c = RebalanceCycle::default();
        c.new_day(20240105);
        c.advance(RebalancePhase::BeforeOpen);
        let v = c.require("rebalance_before_open", RebalancePhase::Idle).unwrap_err();
        assert_eq!(v.actual, RebalancePhase::BeforeOpen);
        assert_eq!(
            v.to_string(),
            "rebalance_before_open on 20240105 requires phase IDLE but cycle is BEFORE_OPEN"
        );
        c.new_day(20240108);
        assert!(c.require("rebalance_before_open", RebalancePhase::Idle).is_ok());
    }
}
