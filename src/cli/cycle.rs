//! Single-cycle command

use clap::Args;

use crate::config::Config;
use crate::engine::TradingEngine;

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// Trade against the demo environment
    #[arg(long)]
    pub demo: bool,
}

impl CycleArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let creds = super::credentials_from_env(self.demo)?;
        let engine = TradingEngine::new(config);

        let report = engine.run_cycle(&creds).await;
        if !report.success {
            anyhow::bail!("cycle failed, see logs above");
        }
        tracing::info!(
            actions = report.actions_taken,
            rejections = report.rejections.total(),
            "Cycle complete"
        );
        Ok(())
    }
}
