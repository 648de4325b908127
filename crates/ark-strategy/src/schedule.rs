//! Rebalance calendar.
//!
//! Trading dates are grouped into buckets by period (each date, ISO week, or
//! calendar month). The rebalance date of a bucket is its `days_delay`-th
//! trading date, counting from 0; a bucket with too few trading dates has no
//! rebalance. `Day` buckets hold one date each, so `days_delay` does not
//! apply to them.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalancePeriod {
    Day,
    Week,
    Month,
}

impl RebalancePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for RebalancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalancePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown period '{other}' (expected day|week|month)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// Not a valid YYYYMMDD date.
    InvalidDate(u32),
    /// Dates must be strictly increasing.
    Unordered { prev: u32, next: u32 },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(d) => write!(f, "invalid trade date {d}"),
            Self::Unordered { prev, next } => {
                write!(f, "trade dates out of order: {prev} then {next}")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

pub fn parse_trade_date(d: u32) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::from_ymd_opt((d / 10_000) as i32, (d / 100) % 100, d % 100)
        .ok_or(ScheduleError::InvalidDate(d))
}

fn bucket_of(period: RebalancePeriod, date: NaiveDate) -> (i32, u32) {
    match period {
        RebalancePeriod::Day => (date.year(), date.ordinal()),
        RebalancePeriod::Week => {
            let w = date.iso_week();
            (w.year(), w.week())
        }
        RebalancePeriod::Month => (date.year(), date.month()),
    }
}

/// Rebalance dates among `trading_dates` (sorted ascending, YYYYMMDD).
pub fn rebalance_dates(
    trading_dates: &[u32],
    period: RebalancePeriod,
    days_delay: u32,
) -> Result<Vec<u32>, ScheduleError> {
    let delay = match period {
        RebalancePeriod::Day => 0,
        _ => days_delay as usize,
    };

    let mut out = Vec::new();
    let mut current: Option<(i32, u32)> = None;
    let mut index_in_bucket = 0usize;
    let mut prev: Option<u32> = None;

    for &d in trading_dates {
        if let Some(p) = prev {
            if d <= p {
                return Err(ScheduleError::Unordered { prev: p, next: d });
            }
        }
        prev = Some(d);

        let bucket = bucket_of(period, parse_trade_date(d)?);
        if current != Some(bucket) {
            current = Some(bucket);
            index_in_bucket = 0;
        } else {
            index_in_bucket += 1;
        }
        if index_in_bucket == delay {
            out.push(d);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-29 (Mon) .. 2024-02-09 (Fri), weekdays only
    const DATES: [u32; 10] = [
        20240129, 20240130, 20240131, 20240201, 20240202, 20240205, 20240206, 20240207,
        20240208, 20240209,
    ];

    #[test]
    fn weekly_first_trading_day() {
        let r = rebalance_dates(&DATES, RebalancePeriod::Week, 0).unwrap();
        assert_eq!(r, vec![20240129, 20240205]);
    }

    #[test]
    fn weekly_with_delay() {
        let r = rebalance_dates(&DATES, RebalancePeriod::Week, 2).unwrap();
        assert_eq!(r, vec![20240131, 20240207]);
    }

    #[test]
    fn monthly_buckets_split_on_month_boundary() {
        let r = rebalance_dates(&DATES, RebalancePeriod::Month, 1).unwrap();
        assert_eq!(r, vec![20240130, 20240202]);
        // January has 3 dates here; delay 3 only hits February.
        let r = rebalance_dates(&DATES, RebalancePeriod::Month, 3).unwrap();
        assert_eq!(r, vec![20240206]);
    }

    #[test]
    fn daily_ignores_delay() {
        let r = rebalance_dates(&DATES, RebalancePeriod::Day, 4).unwrap();
        assert_eq!(r, DATES.to_vec());
    }

    #[test]
    fn iso_week_crosses_year_end() {
        // 2024-12-30 (Mon) and 2025-01-02 (Thu) share ISO week 2025-W01.
        let r = rebalance_dates(&[20241227, 20241230, 20250102], RebalancePeriod::Week, 0).unwrap();
        assert_eq!(r, vec![20241227, 20241230]);
    }

    #[test]
    fn bad_input_is_rejected() {
        assert_eq!(
            rebalance_dates(&[20240230], RebalancePeriod::Day, 0).unwrap_err(),
            ScheduleError::InvalidDate(20240230)
        );
        assert_eq!(
            rebalance_dates(&[20240102, 20240102], RebalancePeriod::Day, 0).unwrap_err(),
            ScheduleError::Unordered { prev: 20240102, next: 20240102 }
        );
        assert_eq!("Week".parse::<RebalancePeriod>(), Ok(RebalancePeriod::Week));
        assert!("quarter".parse::<RebalancePeriod>().is_err());
    }
}
