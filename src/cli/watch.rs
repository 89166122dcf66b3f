//! Continuous trading loop command

use clap::Args;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::engine::TradingEngine;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Trade against the demo environment
    #[arg(long)]
    pub demo: bool,

    /// Seconds between cycles (overrides the configured interval)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let creds = super::credentials_from_env(self.demo)?;
        let secs = self.interval.unwrap_or(config.engine.poll_interval_secs);
        let engine = TradingEngine::new(config);

        // A slow cycle must not cause a burst of catch-up cycles
        let mut ticker = interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = secs, "Watch loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = engine.run_cycle(&creds).await;
                    if !report.success {
                        tracing::warn!("Cycle failed, retrying next tick");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, shutting down");
                    return Ok(());
                }
            }
        }
    }
}
