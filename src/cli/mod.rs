//! CLI interface for kalshi-vigil
//!
//! Provides subcommands for:
//! - `cycle`: Run a single trading cycle and exit
//! - `watch`: Run cycles on an interval until interrupted
//! - `portfolio`: Show balance, positions, fills, and settlements
//! - `config`: Show the effective configuration

mod cycle;
mod portfolio;
mod watch;

pub use cycle::CycleArgs;
pub use portfolio::PortfolioArgs;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

use crate::engine::Credentials;

#[derive(Parser, Debug)]
#[command(name = "kalshi-vigil")]
#[command(about = "Automated trading bot for Kalshi crypto event contracts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Emit logs as JSON for aggregation
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single trading cycle and exit
    Cycle(CycleArgs),
    /// Run cycles on an interval until interrupted
    Watch(WatchArgs),
    /// Show balance, positions, fills, and settlements
    Portfolio(PortfolioArgs),
    /// Show the effective configuration
    Config,
}

/// Build exchange credentials from the environment.
///
/// `KALSHI_PRIVATE_KEY` is commonly pasted into env files with literal
/// `\n` escapes in place of newlines; those are restored here.
pub fn credentials_from_env(demo_flag: bool) -> anyhow::Result<Credentials> {
    let key_id = std::env::var("KALSHI_KEY_ID")
        .map_err(|_| anyhow::anyhow!("KALSHI_KEY_ID is not set"))?;
    let private_key = std::env::var("KALSHI_PRIVATE_KEY")
        .map_err(|_| anyhow::anyhow!("KALSHI_PRIVATE_KEY is not set"))?
        .replace("\\n", "\n");
    let demo = demo_flag
        || std::env::var("KALSHI_DEMO")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

    Ok(Credentials {
        key_id,
        private_key,
        demo,
    })
}
