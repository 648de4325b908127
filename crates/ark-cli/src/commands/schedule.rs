use anyhow::{Context, Result};
use ark_strategy::{rebalance_dates, StrategyConfig};

use super::load_config;

/// Execute `ark schedule`: print the selected rebalance dates as a JSON array.
pub fn run_schedule(config_paths: &[String], trading_dates: &[u32]) -> Result<()> {
    let loaded = load_config(config_paths)?;
    let cfg = StrategyConfig::from_config_json(&loaded.config_json)
        .context("strategy config rejected")?;

    let dates = rebalance_dates(trading_dates, cfg.period, cfg.days_delay)?;
    tracing::info!(
        period = %cfg.period,
        days_delay = cfg.days_delay,
        trading_dates = trading_dates.len(),
        rebalance_dates = dates.len(),
        "schedule"
    );

    println!("config_hash={}", loaded.config_hash);
    println!("{}", serde_json::to_string(&dates)?);
    Ok(())
}
