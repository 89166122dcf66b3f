//! Trading engine module
//!
//! Runs one decision-and-execution cycle per external trigger: fetch
//! account state, reconcile stale orders, discover markets, score
//! opportunities, and execute under the per-cycle action cap.

mod coordinator;

pub use coordinator::TradingEngine;

use chrono::{DateTime, Utc};

use crate::exchange::{Market, Side};

/// Per-invocation credentials, supplied by the external caller and never
/// stored by the engine
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key_id: String,
    pub private_key: String,
    pub demo: bool,
}

/// A sized, priced trade candidate; lives only inside one cycle
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub market: Market,
    pub side: Side,
    /// Limit entry price in cents
    pub entry_cents: i64,
    pub qty: i64,
    pub expiry: DateTime<Utc>,
}

/// Counts of markets dropped in scoring, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionTally {
    /// Spot price unavailable for the asset
    pub no_spot: u32,
    /// Market closes beyond the commitment horizon
    pub beyond_horizon: u32,
    /// An open order already rests on the ticker
    pub duplicate_order: u32,
    /// Per-ticker share cap already reached
    pub exposure_capped: u32,
    /// Budget cap already exhausted
    pub budget_capped: u32,
    /// No strike could be extracted
    pub no_strike: u32,
    /// No usable quote on the chosen side
    pub no_quote: u32,
    /// Spread guard fired
    pub wide_spread: u32,
    /// RSI exhaustion guard fired
    pub momentum: u32,
    /// Trend-fight guard fired
    pub trend_fight: u32,
    /// Entry price outside the acceptable band
    pub priced_out: u32,
    /// Sizing produced zero shares
    pub sized_to_zero: u32,
}

impl RejectionTally {
    pub fn total(&self) -> u32 {
        self.no_spot
            + self.beyond_horizon
            + self.duplicate_order
            + self.exposure_capped
            + self.budget_capped
            + self.no_strike
            + self.no_quote
            + self.wide_spread
            + self.momentum
            + self.trend_fight
            + self.priced_out
            + self.sized_to_zero
    }

    pub fn summary(&self) -> String {
        format!(
            "spot:{} horizon:{} dup:{} cap:{} budget:{} strike:{} quote:{} spread:{} momentum:{} trend:{} price:{} size:{}",
            self.no_spot,
            self.beyond_horizon,
            self.duplicate_order,
            self.exposure_capped,
            self.budget_capped,
            self.no_strike,
            self.no_quote,
            self.wide_spread,
            self.momentum,
            self.trend_fight,
            self.priced_out,
            self.sized_to_zero,
        )
    }
}

/// Result of one cycle, returned to the caller for display and audit
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub success: bool,
    pub logs: Vec<String>,
    pub actions_taken: u32,
    pub rejections: RejectionTally,
}

impl CycleReport {
    pub(crate) fn new() -> Self {
        Self {
            success: false,
            logs: Vec::new(),
            actions_taken: 0,
            rejections: RejectionTally::default(),
        }
    }

    /// Append a log line, mirrored to tracing for operators tailing output
    pub(crate) fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.logs.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_total() {
        let tally = RejectionTally {
            no_spot: 2,
            wide_spread: 3,
            ..RejectionTally::default()
        };
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn test_report_collects_logs() {
        let mut report = CycleReport::new();
        report.log("first");
        report.log(format!("second {}", 2));
        assert_eq!(report.logs, vec!["first".to_string(), "second 2".to_string()]);
        assert!(!report.success);
    }
}
