//! `ark plan`: one rebalance cycle against a dry-run gateway.
//!
//! Nothing leaves the process. The output is a single JSON document with the
//! config hash, the normalized weights, the after-open summary and the orders
//! the engine submitted.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use ark_config::{report_unused_keys, UnusedKeyPolicy, STRATEGY_POINTERS};
use ark_portfolio::{Ledger, PriceMap, WeightMap};
use ark_strategy::{AlphaStrategy, Models, Strategy};
use serde_json::json;

use super::{load_config, read_symbol_map};
use crate::dry_run::DryRunGateway;

pub struct PlanArgs {
    pub config_paths: Vec<String>,
    pub prices_path: String,
    pub trade_date: u32,
    pub suspended: Vec<String>,
    pub holdings_path: Option<String>,
    pub scores_path: Option<String>,
    pub strict_keys: bool,
}

pub fn run_plan(args: PlanArgs) -> Result<()> {
    let loaded = load_config(&args.config_paths)?;
    let policy = if args.strict_keys {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    report_unused_keys(STRATEGY_POINTERS, &loaded.config_json, policy)?;

    let prices = read_prices(&args.prices_path)?;
    let scores: WeightMap = match &args.scores_path {
        Some(p) => read_symbol_map(p)?,
        None => WeightMap::new(),
    };
    let ledger = match &args.holdings_path {
        Some(p) => seed_ledger(read_symbol_map(p)?, &prices),
        None => Ledger::new(),
    };
    let suspended: BTreeSet<String> = args
        .suspended
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let mut strategy = AlphaStrategy::new(ledger, DryRunGateway::new(), Models::scores_only(scores));
    strategy
        .init_from_config(&loaded.config_json)
        .context("strategy config rejected")?;
    strategy.on_new_day(args.trade_date);

    strategy
        .rebalance_before_open()
        .with_context(|| format!("before-open rebalance failed on {}", args.trade_date))?;
    let summary = strategy
        .rebalance_after_open(&prices, &suspended)
        .with_context(|| format!("after-open rebalance failed on {}", args.trade_date))?;
    let report = strategy.send_orders().context("send_orders failed")?;

    let out = json!({
        "config_hash": loaded.config_hash,
        "trade_date": args.trade_date,
        "weights": strategy.weights(),
        "summary": summary,
        "task_id": report.task_id.0,
        "orders": strategy.gateway().orders(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Prices file: `null` becomes NaN so the allocator reports a price gap.
fn read_prices(path: &str) -> Result<PriceMap> {
    let raw = read_symbol_map::<Option<f64>>(path)?;
    Ok(raw
        .into_iter()
        .map(|(sym, p)| (sym, p.unwrap_or(f64::NAN)))
        .collect())
}

/// Holdings are carried at today's price; unpriced ones at zero cost.
fn seed_ledger(holdings: std::collections::BTreeMap<String, i64>, prices: &PriceMap) -> Ledger {
    holdings
        .into_iter()
        .fold(Ledger::new(), |ledger, (sym, size)| {
            let cost = prices
                .get(&sym)
                .copied()
                .filter(|p| p.is_finite())
                .unwrap_or(0.0);
            ledger.with_position(&sym, size, cost)
        })
}
