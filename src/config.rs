//! Configuration types for kalshi-vigil
//!
//! Every strategy threshold that is a tunable policy rather than fixed
//! physics (spread guard, RSI cutoffs, sure-thing band, Kelly cap) is a
//! config field with the defaults the strategy shipped with.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::feed::{BINANCE_API_URL, COINBASE_API_URL};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub guards: GuardConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Cycle orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Series tickers scanned each cycle
    #[serde(default = "default_series")]
    pub series: Vec<String>,

    /// Hard cap on new orders per cycle
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,

    /// Markets closing beyond this horizon are ignored
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: i64,

    /// Open orders older than this are cancelled as abandoned
    #[serde(default = "default_stale_order_minutes")]
    pub stale_order_minutes: i64,

    /// Delay between sequential order submissions (exchange rate limits)
    #[serde(default = "default_order_pacing_ms")]
    pub order_pacing_ms: u64,

    /// Seconds between cycles in loop mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Reject entries cheaper than this (likely a mispriced longshot)
    #[serde(default = "default_min_entry_cents")]
    pub min_entry_cents: i64,

    /// Spot cushion past the strike that unlocks sure-thing pricing
    #[serde(default = "default_sure_thing_gap")]
    pub sure_thing_gap: Decimal,

    /// Ceiling for entries inside the sure-thing band
    #[serde(default = "default_sure_thing_cap_cents")]
    pub sure_thing_cap_cents: i64,
}

fn default_series() -> Vec<String> {
    ["KXBTC", "KXETH", "KXBTC15M", "KXETH15M", "KXBTCD", "KXETHD", "BVOL"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_actions() -> u32 {
    2
}
fn default_horizon_hours() -> i64 {
    24
}
fn default_stale_order_minutes() -> i64 {
    10
}
fn default_order_pacing_ms() -> u64 {
    1200
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_min_entry_cents() -> i64 {
    12
}
fn default_sure_thing_gap() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}
fn default_sure_thing_cap_cents() -> i64 {
    99
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            series: default_series(),
            max_actions: default_max_actions(),
            horizon_hours: default_horizon_hours(),
            stale_order_minutes: default_stale_order_minutes(),
            order_pacing_ms: default_order_pacing_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            min_entry_cents: default_min_entry_cents(),
            sure_thing_gap: default_sure_thing_gap(),
            sure_thing_cap_cents: default_sure_thing_cap_cents(),
        }
    }
}

/// Price/momentum feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_binance_url")]
    pub binance_url: String,

    #[serde(default = "default_coinbase_url")]
    pub coinbase_url: String,

    /// Candle interval for the RSI window
    #[serde(default = "default_short_interval")]
    pub short_interval: String,

    #[serde(default = "default_short_klines")]
    pub short_klines: u32,

    /// Candle interval for trend classification
    #[serde(default = "default_long_interval")]
    pub long_interval: String,

    #[serde(default = "default_long_klines")]
    pub long_klines: u32,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Fractional move inside which the trend reads flat
    #[serde(default = "default_trend_band")]
    pub trend_band: Decimal,

    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_binance_url() -> String {
    BINANCE_API_URL.to_string()
}
fn default_coinbase_url() -> String {
    COINBASE_API_URL.to_string()
}
fn default_short_interval() -> String {
    "5m".to_string()
}
fn default_short_klines() -> u32 {
    25
}
fn default_long_interval() -> String {
    "1h".to_string()
}
fn default_long_klines() -> u32 {
    10
}
fn default_rsi_period() -> usize {
    14
}
fn default_trend_band() -> Decimal {
    Decimal::new(2, 3) // 0.002 = 0.2%
}
fn default_feed_timeout_secs() -> u64 {
    5
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            binance_url: default_binance_url(),
            coinbase_url: default_coinbase_url(),
            short_interval: default_short_interval(),
            short_klines: default_short_klines(),
            long_interval: default_long_interval(),
            long_klines: default_long_klines(),
            rsi_period: default_rsi_period(),
            trend_band: default_trend_band(),
            timeout_secs: default_feed_timeout_secs(),
        }
    }
}

/// Signal guard thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
    /// Maximum bid/ask spread in cents on the chosen side
    #[serde(default = "default_max_spread_cents")]
    pub max_spread_cents: i64,

    /// RSI above which yes calls are rejected as exhausted
    #[serde(default = "default_overbought")]
    pub overbought: Decimal,

    /// RSI below which no calls are rejected as exhausted
    #[serde(default = "default_oversold")]
    pub oversold: Decimal,

    /// RSI at or below which a yes call may fight a down trend
    #[serde(default = "default_extreme_oversold")]
    pub extreme_oversold: Decimal,

    /// RSI at or above which a no call may fight an up trend
    #[serde(default = "default_extreme_overbought")]
    pub extreme_overbought: Decimal,
}

fn default_max_spread_cents() -> i64 {
    10
}
fn default_overbought() -> Decimal {
    Decimal::from(68)
}
fn default_oversold() -> Decimal {
    Decimal::from(32)
}
fn default_extreme_oversold() -> Decimal {
    Decimal::from(20)
}
fn default_extreme_overbought() -> Decimal {
    Decimal::from(80)
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_spread_cents: default_max_spread_cents(),
            overbought: default_overbought(),
            oversold: default_oversold(),
            extreme_oversold: default_extreme_oversold(),
            extreme_overbought: default_extreme_overbought(),
        }
    }
}

/// Sizing and exposure configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Assumed probability edge in cents fed into Kelly sizing
    #[serde(default = "default_min_edge_cents")]
    pub min_edge_cents: i64,

    /// Per-ticker share cap (positions plus open orders)
    #[serde(default = "default_max_shares")]
    pub max_shares: i64,

    /// Fractional-Kelly multiplier
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction: Decimal,

    /// Hard cap on the raw Kelly fraction
    #[serde(default = "default_kelly_cap")]
    pub kelly_cap: Decimal,

    /// Optional cap on total invested notional, in cents
    #[serde(default)]
    pub max_budget_cents: Option<i64>,

    /// Daily loss limit in cents: surfaced to the scheduling caller,
    /// which owns cross-cycle state (each cycle is stateless)
    #[serde(default = "default_max_daily_loss_cents")]
    pub max_daily_loss_cents: i64,
}

fn default_min_edge_cents() -> i64 {
    10
}
fn default_max_shares() -> i64 {
    10
}
fn default_risk_fraction() -> Decimal {
    Decimal::new(2, 1) // 0.2
}
fn default_kelly_cap() -> Decimal {
    Decimal::new(15, 2) // 0.15
}
fn default_max_daily_loss_cents() -> i64 {
    1000
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_edge_cents: default_min_edge_cents(),
            max_shares: default_max_shares(),
            risk_fraction: default_risk_fraction(),
            kelly_cap: default_kelly_cap(),
            max_budget_cents: None,
            max_daily_loss_cents: default_max_daily_loss_cents(),
        }
    }
}

/// Best-effort trade journal configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalConfig {
    /// Webhook URL for trade records; absent means journaling is off
    #[serde(default)]
    pub url: Option<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.max_actions, 2);
        assert_eq!(config.engine.horizon_hours, 24);
        assert_eq!(config.guards.max_spread_cents, 10);
        assert_eq!(config.risk.risk_fraction, dec!(0.2));
        assert_eq!(config.risk.kelly_cap, dec!(0.15));
        assert!(config.risk.max_budget_cents.is_none());
        assert!(config.journal.url.is_none());
        assert!(config.engine.series.contains(&"KXBTC15M".to_string()));
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            [engine]
            series = ["KXBTC"]
            max_actions = 1

            [guards]
            max_spread_cents = 6
            overbought = 72

            [risk]
            max_budget_cents = 50000
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.series, vec!["KXBTC".to_string()]);
        assert_eq!(config.engine.max_actions, 1);
        assert_eq!(config.guards.max_spread_cents, 6);
        assert_eq!(config.guards.overbought, dec!(72));
        // Untouched sections keep their defaults
        assert_eq!(config.guards.oversold, dec!(32));
        assert_eq!(config.risk.max_budget_cents, Some(50000));
        assert_eq!(config.feed.rsi_period, 14);
    }

    #[test]
    fn test_feed_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.short_interval, "5m");
        assert_eq!(config.long_interval, "1h");
        assert_eq!(config.trend_band, dec!(0.002));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
