//! Public market-data sources for spot prices and candles
//!
//! Spot resolution walks an ordered list of independent sources (Binance,
//! then Coinbase) and silently degrades to the next on any failure. When
//! every source fails the caller receives a zero sentinel, never a
//! fabricated price.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use super::Asset;

pub const BINANCE_API_URL: &str = "https://api.binance.com";
pub const COINBASE_API_URL: &str = "https://api.coinbase.com";

#[derive(Debug, Deserialize)]
struct BinanceTicker {
    price: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseSpot {
    data: CoinbaseAmount,
}

#[derive(Debug, Deserialize)]
struct CoinbaseAmount {
    amount: String,
}

/// HTTP access to the public price endpoints
pub struct PriceSources {
    http: Client,
    binance_url: String,
    coinbase_url: String,
}

impl PriceSources {
    pub fn new(timeout: Duration) -> Self {
        Self::with_urls(BINANCE_API_URL, COINBASE_API_URL, timeout)
    }

    /// Explicit endpoints, used by tests to point at a local server
    pub fn with_urls(binance_url: &str, coinbase_url: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            binance_url: binance_url.trim_end_matches('/').to_string(),
            coinbase_url: coinbase_url.trim_end_matches('/').to_string(),
        }
    }

    /// Spot price with ordered source fallback; 0 means "unavailable"
    pub async fn spot(&self, asset: Asset) -> Decimal {
        match self.binance_spot(asset).await {
            Ok(price) => return price,
            Err(e) => {
                tracing::debug!(asset = %asset, error = %e, "Binance spot failed, trying Coinbase");
            }
        }
        match self.coinbase_spot(asset).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "All spot sources failed");
                Decimal::ZERO
            }
        }
    }

    async fn binance_spot(&self, asset: Asset) -> anyhow::Result<Decimal> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.binance_url,
            asset.binance_symbol()
        );
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let ticker: BinanceTicker = resp.json().await?;
        Ok(Decimal::from_str(&ticker.price)?)
    }

    async fn coinbase_spot(&self, asset: Asset) -> anyhow::Result<Decimal> {
        let url = format!(
            "{}/v2/prices/{}/spot",
            self.coinbase_url,
            asset.coinbase_pair()
        );
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let spot: CoinbaseSpot = resp.json().await?;
        Ok(Decimal::from_str(&spot.data.amount)?)
    }

    /// Candle closes for the asset at the given Binance interval
    pub async fn closes(
        &self,
        asset: Asset,
        interval: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<Decimal>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.binance_url,
            asset.binance_symbol(),
            interval,
            limit
        );
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let rows: Vec<serde_json::Value> = resp.json().await?;

        // Kline rows are positional arrays; index 4 is the close price
        let closes = rows
            .iter()
            .filter_map(|row| row.get(4))
            .filter_map(|v| v.as_str())
            .filter_map(|s| Decimal::from_str(s).ok())
            .collect();
        Ok(closes)
    }
}
