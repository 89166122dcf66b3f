//! Best-effort trade journal
//!
//! Submitted trades are mirrored to an external persistence collaborator
//! for charting. The contract is explicitly fire-and-forget: a record is
//! spawned off the execution path, failures are swallowed and counted,
//! and a dead journal can never fail a trading cycle.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::exchange::Side;

/// One executed trade, as the journal sees it
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub ticker: String,
    pub side: Side,
    /// Entry price in cents
    pub price: i64,
    pub qty: i64,
    pub status: String,
}

/// Sink for trade records; implementations must never propagate errors
#[async_trait]
pub trait TradeSink: Send + Sync {
    /// Record a trade; errors are swallowed by the implementation
    async fn record(&self, trade: TradeRecord);

    /// How many records were dropped so far
    fn dropped(&self) -> u64 {
        0
    }
}

/// Journal that POSTs records to a webhook URL
pub struct HttpSink {
    http: Client,
    url: String,
    dropped: AtomicU64,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            url: url.into(),
            dropped: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl TradeSink for HttpSink {
    async fn record(&self, trade: TradeRecord) {
        let result = self.http.post(&self.url).json(&trade).send().await;
        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(status = %resp.status(), ticker = %trade.ticker, "Journal write rejected");
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %e, ticker = %trade.ticker, "Journal write failed");
            }
        }
    }

    fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Journal that discards everything (journaling disabled)
pub struct NoopSink;

#[async_trait]
impl TradeSink for NoopSink {
    async fn record(&self, _trade: TradeRecord) {}
}
