//! Portfolio reporting command

use clap::Args;

use crate::exchange::{Action, KalshiClient, PageQuery};

#[derive(Args, Debug)]
pub struct PortfolioArgs {
    /// Read from the demo environment
    #[arg(long)]
    pub demo: bool,

    /// How many fills and settlements to list
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}

impl PortfolioArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let creds = super::credentials_from_env(self.demo)?;
        let client = KalshiClient::new(&creds.key_id, &creds.private_key, creds.demo)?;

        let page = PageQuery {
            ticker: None,
            limit: Some(self.limit),
            cursor: None,
        };
        let (balance, positions, fills, settlements) = tokio::join!(
            client.get_balance(),
            client.get_positions(),
            client.get_fills(&page),
            client.get_settlements(&page),
        );

        let balance = balance?;
        println!("Balance: ${:.2}", balance.balance as f64 / 100.0);

        let positions = positions?.positions;
        println!("\nPositions ({}):", positions.len());
        for p in &positions {
            println!("  {} x{} @ {}c", p.ticker, p.count, p.avg_price);
        }

        let fills = fills?.fills;
        println!("\nRecent fills ({}):", fills.len());
        for f in &fills {
            let action = match f.action {
                Action::Buy => "buy",
                Action::Sell => "sell",
            };
            let price = f.yes_price.or(f.no_price).unwrap_or(0);
            println!(
                "  {} {} {} x{} @ {}c",
                f.ticker,
                action,
                f.side.as_str(),
                f.count,
                price
            );
        }

        let settlements = settlements?.settlements;
        println!("\nSettlements ({}):", settlements.len());
        for s in &settlements {
            println!(
                "  {} -> {} (${:.2})",
                s.ticker,
                s.market_result,
                s.revenue as f64 / 100.0
            );
        }

        Ok(())
    }
}
