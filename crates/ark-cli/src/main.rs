use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod dry_run;

#[derive(Parser)]
#[command(name = "ark")]
#[command(about = "Alpha rebalance toolkit CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> strategy -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run one before/after-open rebalance against a dry-run gateway and
    /// print the summary and the orders it would send.
    Plan {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// JSON object of symbol -> price (null marks a missing price)
        #[arg(long)]
        prices: String,

        /// Trade date, YYYYMMDD
        #[arg(long)]
        date: u32,

        /// Suspended symbols, comma separated
        #[arg(long, value_delimiter = ',')]
        suspended: Vec<String>,

        /// JSON object of symbol -> signed share count held before the rebalance
        #[arg(long)]
        holdings: Option<String>,

        /// JSON object of symbol -> score for factor_value_weight / mc
        #[arg(long)]
        scores: Option<String>,

        /// Fail instead of warn on config keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_keys: bool,
    },

    /// Print the rebalance dates selected from a list of trading dates.
    Schedule {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Trading dates (YYYYMMDD), strictly increasing
        #[arg(required = true)]
        dates: Vec<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = ark_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Plan {
            config_paths,
            prices,
            date,
            suspended,
            holdings,
            scores,
            strict_keys,
        } => commands::plan::run_plan(commands::plan::PlanArgs {
            config_paths,
            prices_path: prices,
            trade_date: date,
            suspended,
            holdings_path: holdings,
            scores_path: scores,
            strict_keys,
        })?,

        Commands::Schedule {
            config_paths,
            dates,
        } => commands::schedule::run_schedule(&config_paths, &dates)?,
    }

    Ok(())
}
