use clap::Parser;
use kalshi_vigil::cli::{Cli, Commands};
use kalshi_vigil::config::Config;
use kalshi_vigil::telemetry::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; every field has a default so a missing file is
    // a warning, not an error
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    let _telemetry = init_telemetry(&config.telemetry, format)?;

    match cli.command {
        Commands::Cycle(args) => {
            args.execute(config).await?;
        }
        Commands::Watch(args) => {
            args.execute(config).await?;
        }
        Commands::Portfolio(args) => {
            args.execute().await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Series: {}", config.engine.series.join(", "));
            println!(
                "  Engine: max_actions={}, horizon={}h, pacing={}ms",
                config.engine.max_actions,
                config.engine.horizon_hours,
                config.engine.order_pacing_ms
            );
            println!(
                "  Guards: spread<={}c, rsi {}..{}",
                config.guards.max_spread_cents, config.guards.oversold, config.guards.overbought
            );
            println!(
                "  Risk: edge={}c, kelly_cap={}, fraction={}, max_shares={}",
                config.risk.min_edge_cents,
                config.risk.kelly_cap,
                config.risk.risk_fraction,
                config.risk.max_shares
            );
        }
    }

    Ok(())
}
