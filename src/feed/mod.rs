//! Price and momentum feed
//!
//! Resolves spot price, RSI, and a coarse trend for each tracked asset.
//! The feed never fails its caller: every error degrades to a documented
//! sentinel (zero spot, marker RSI, flat trend) and the engine decides
//! whether to skip the asset for the cycle.

mod momentum;
mod sources;

pub use momentum::{classify_trend, rsi};
pub use sources::{PriceSources, BINANCE_API_URL, COINBASE_API_URL};

use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::FeedConfig;

/// RSI value reported when neither candles nor a trend are available.
/// One tick off neutral so downstream logs can tell it from a true 50.
pub const RSI_UNAVAILABLE: Decimal = dec!(49);

/// Tracked reference assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Btc,
    Eth,
}

impl Asset {
    pub fn binance_symbol(self) -> &'static str {
        match self {
            Asset::Btc => "BTCUSDT",
            Asset::Eth => "ETHUSDT",
        }
    }

    pub fn coinbase_pair(self) -> &'static str {
        match self {
            Asset::Btc => "BTC-USD",
            Asset::Eth => "ETH-USD",
        }
    }

    /// Which asset a market ticker references (ETH series embed "ETH")
    pub fn for_ticker(ticker: &str) -> Asset {
        if ticker.contains("ETH") {
            Asset::Eth
        } else {
            Asset::Btc
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Btc => write!(f, "BTC"),
            Asset::Eth => write!(f, "ETH"),
        }
    }
}

/// Coarse directional classification of recent price action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}

/// One asset's view for the cycle
#[derive(Debug, Clone, Copy)]
pub struct AssetPulse {
    /// Spot price; zero means no source could supply one
    pub spot: Decimal,
    /// RSI on the short-interval window (0-100, 50 neutral)
    pub rsi: Decimal,
    pub trend: Trend,
}

/// Snapshot of every tracked asset, taken once per cycle
#[derive(Debug, Clone, Default)]
pub struct PulseSnapshot {
    assets: HashMap<Asset, AssetPulse>,
}

impl PulseSnapshot {
    pub fn get(&self, asset: Asset) -> Option<&AssetPulse> {
        self.assets.get(&asset)
    }

    /// Build a snapshot from explicit readings (test scaffolding)
    pub fn from_readings(readings: Vec<(Asset, AssetPulse)>) -> Self {
        Self {
            assets: readings.into_iter().collect(),
        }
    }
}

/// Multi-source price and momentum feed
pub struct MarketPulse {
    sources: PriceSources,
    config: FeedConfig,
}

impl MarketPulse {
    pub fn new(config: FeedConfig) -> Self {
        let sources = PriceSources::with_urls(
            &config.binance_url,
            &config.coinbase_url,
            Duration::from_secs(config.timeout_secs),
        );
        Self { sources, config }
    }

    /// Snapshot all requested assets concurrently
    pub async fn snapshot(&self, assets: &[Asset]) -> PulseSnapshot {
        let pulses = join_all(assets.iter().map(|a| self.asset_pulse(*a))).await;
        PulseSnapshot {
            assets: assets.iter().copied().zip(pulses).collect(),
        }
    }

    async fn asset_pulse(&self, asset: Asset) -> AssetPulse {
        let (spot, short_closes, long_closes) = tokio::join!(
            self.sources.spot(asset),
            self.sources
                .closes(asset, &self.config.short_interval, self.config.short_klines),
            self.sources
                .closes(asset, &self.config.long_interval, self.config.long_klines),
        );

        let trend_reading = match long_closes {
            Ok(closes) if closes.len() >= 3 => {
                Some(classify_trend(&closes, self.config.trend_band))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(asset = %asset, error = %e, "Long-interval candles unavailable");
                None
            }
        };

        let rsi_value = match short_closes {
            Ok(closes) => rsi(&closes, self.config.rsi_period),
            Err(e) => {
                tracing::debug!(asset = %asset, error = %e, "Short-interval candles unavailable");
                None
            }
        };

        // Degradation ladder: real RSI, then a trend-implied estimate,
        // then the marker value that is distinguishable from true neutral.
        let rsi = match (rsi_value, trend_reading) {
            (Some(value), _) => value,
            (None, Some(Trend::Up)) => dec!(60),
            (None, Some(Trend::Down)) => dec!(40),
            (None, Some(Trend::Flat)) => dec!(50),
            (None, None) => RSI_UNAVAILABLE,
        };

        AssetPulse {
            spot,
            rsi,
            trend: trend_reading.unwrap_or(Trend::Flat),
        }
    }
}
