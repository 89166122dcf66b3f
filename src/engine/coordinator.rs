//! Cycle coordinator
//!
//! One invocation walks Fetching -> Reconciling -> Scanning -> Scoring ->
//! Executing. Reads are issued concurrently; mutations are strictly
//! sequential with pacing delays because the exchange rate-limits
//! concurrent portfolio writes. Per-item failures (one series listing,
//! one cancel, one order) degrade to a log line and a skip; only an error
//! escaping the whole cycle body marks the report as failed.

use chrono::{Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{Credentials, CycleReport, Opportunity};
use crate::config::Config;
use crate::exchange::{
    ExchangeError, KalshiClient, Market, MarketsQuery, Order, OrderRequest,
};
use crate::feed::{Asset, MarketPulse};
use crate::journal::{HttpSink, NoopSink, TradeRecord, TradeSink};
use crate::risk::kelly_shares;
use crate::signal::{evaluate, Signal, SkipReason, Strike};

/// Orchestrates trading cycles against one exchange account.
///
/// The caller owns the trigger (timer or endpoint) and must not overlap
/// cycles for the same credential set: exposure bookkeeping is derived
/// fresh from the exchange at cycle start and updated optimistically
/// within the cycle only.
pub struct TradingEngine {
    config: Config,
    journal: Arc<dyn TradeSink>,
    exchange_url: Option<String>,
}

impl TradingEngine {
    pub fn new(config: Config) -> Self {
        let journal: Arc<dyn TradeSink> = match config.journal.url.as_deref() {
            Some(url) => Arc::new(HttpSink::new(url)),
            None => Arc::new(NoopSink),
        };
        Self {
            config,
            journal,
            exchange_url: None,
        }
    }

    /// Replace the journal sink (tests, alternate persistence)
    pub fn with_journal(mut self, journal: Arc<dyn TradeSink>) -> Self {
        self.journal = journal;
        self
    }

    /// Point the exchange client at an explicit URL (tests)
    pub fn with_exchange_url(mut self, url: impl Into<String>) -> Self {
        self.exchange_url = Some(url.into());
        self
    }

    /// Run one complete cycle. Never panics across the boundary and never
    /// returns an error: failures become a failed report with logs.
    pub async fn run_cycle(&self, creds: &Credentials) -> CycleReport {
        let mut report = CycleReport::new();
        match self.cycle_inner(creds, &mut report).await {
            Ok(()) => {
                report.success = true;
                metrics::counter!("vigil_cycles_total", "outcome" => "ok").increment(1);
            }
            Err(e) => {
                report.log(format!("CRITICAL: {e:#}"));
                metrics::counter!("vigil_cycles_total", "outcome" => "failed").increment(1);
            }
        }
        metrics::counter!("vigil_orders_placed_total").increment(report.actions_taken as u64);
        report
    }

    async fn cycle_inner(
        &self,
        creds: &Credentials,
        report: &mut CycleReport,
    ) -> anyhow::Result<()> {
        let engine_cfg = &self.config.engine;
        let risk_cfg = &self.config.risk;

        let client = match self.exchange_url.as_deref() {
            Some(url) => KalshiClient::with_base_url(&creds.key_id, &creds.private_key, url)?,
            None => KalshiClient::new(&creds.key_id, &creds.private_key, creds.demo)?,
        };
        let pulse = MarketPulse::new(self.config.feed.clone());

        report.log(format!(
            "Vigil online ({})",
            if creds.demo { "demo" } else { "live" }
        ));

        // Fetching: independent reads in parallel
        let assets = tracked_assets(&engine_cfg.series);
        let (balance_res, snapshot, orders_res, positions_res) = tokio::join!(
            client.get_balance(),
            pulse.snapshot(&assets),
            client.get_orders(Some("open"), None),
            client.get_positions(),
        );
        let balance = balance_res?;
        let mut open_orders = orders_res?.orders;
        let positions = positions_res?.positions;

        let mut balance_cents = balance.balance;
        report.log(format!(
            "Sync: ${:.2} | {} open orders | {} positions",
            balance_cents as f64 / 100.0,
            open_orders.len(),
            positions.len()
        ));
        for asset in &assets {
            if let Some(reading) = snapshot.get(*asset) {
                report.log(format!(
                    "{asset}: spot {} | rsi {:.0} | trend {}",
                    reading.spot, reading.rsi, reading.trend
                ));
            }
        }

        // Reconciling: drop abandoned orders, then derive exposure
        self.cancel_stale_orders(&client, &mut open_orders, report).await;

        let mut exposure: HashMap<String, i64> = HashMap::new();
        let mut invested_cents: i64 = 0;
        for position in &positions {
            *exposure.entry(position.ticker.clone()).or_insert(0) += position.count;
            invested_cents += position.count * position.avg_price;
        }
        for order in &open_orders {
            *exposure.entry(order.ticker.clone()).or_insert(0) += order.remaining_count;
            invested_cents += order.remaining_count * order.price();
        }

        // Scanning: all tracked series in parallel, dedupe by ticker
        let markets = self.scan_markets(&client, report).await;
        let horizon = Utc::now() + ChronoDuration::hours(engine_cfg.horizon_hours);

        // Scoring
        let mut opportunities: Vec<Opportunity> = Vec::new();
        for market in markets.values() {
            if market.close_time > horizon {
                report.rejections.beyond_horizon += 1;
                continue;
            }

            let asset = Asset::for_ticker(&market.ticker);
            let Some(reading) = snapshot.get(asset) else {
                report.rejections.no_spot += 1;
                continue;
            };
            if reading.spot.is_zero() {
                report.rejections.no_spot += 1;
                continue;
            }

            if open_orders.iter().any(|o| o.ticker == market.ticker) {
                report.rejections.duplicate_order += 1;
                continue;
            }

            let held = exposure.get(&market.ticker).copied().unwrap_or(0);
            if held >= risk_cfg.max_shares {
                report.rejections.exposure_capped += 1;
                continue;
            }
            if let Some(max_budget) = risk_cfg.max_budget_cents {
                if invested_cents >= max_budget {
                    report.rejections.budget_capped += 1;
                    continue;
                }
            }

            let (side, strike) = match evaluate(
                market,
                reading.spot,
                reading.rsi,
                reading.trend,
                &self.config.guards,
            ) {
                Signal::Trade { side, strike } => (side, strike),
                Signal::NoSignal(reason) => {
                    self.tally_skip(report, reason);
                    continue;
                }
            };

            // The signal passed the spread guard, so the quote exists
            let Some(quote) = market.quote(side) else {
                report.rejections.no_quote += 1;
                continue;
            };
            // Improve on the ask by one tick over the bid when possible
            let entry = quote.ask.min(quote.bid + 1);

            let max_entry = self.max_entry_cents(&strike, reading.spot);
            if entry < engine_cfg.min_entry_cents || entry > max_entry {
                report.rejections.priced_out += 1;
                continue;
            }

            let qty = self.size_position(balance_cents, entry, held, invested_cents);
            if qty <= 0 {
                report.rejections.sized_to_zero += 1;
                continue;
            }

            opportunities.push(Opportunity {
                market: market.clone(),
                side,
                entry_cents: entry,
                qty,
                expiry: market.close_time,
            });
        }

        report.log(format!(
            "Scan: {} markets, {} aligned ({})",
            markets.len(),
            opportunities.len(),
            report.rejections.summary()
        ));

        // Executing: nearest expiry first so capital is not parked past
        // near-term resolution; cheaper entry breaks ties
        opportunities.sort_by_key(|o| (o.expiry, o.entry_cents));

        for opp in &opportunities {
            if report.actions_taken >= engine_cfg.max_actions {
                break;
            }

            // Earlier submissions consumed budget headroom; the quantity
            // sized at scoring time must shrink to whatever remains
            let mut qty = opp.qty;
            if let Some(max_budget) = risk_cfg.max_budget_cents {
                let headroom = (max_budget - invested_cents).max(0);
                qty = qty.min(headroom / opp.entry_cents);
            }
            if qty <= 0 {
                report.rejections.budget_capped += 1;
                report.log(format!("{}: skipped, budget exhausted", opp.market.ticker));
                continue;
            }

            let cost = opp.entry_cents * qty;
            if cost > balance_cents {
                report.log(format!("{}: skipped, cost exceeds balance", opp.market.ticker));
                continue;
            }

            sleep(Duration::from_millis(engine_cfg.order_pacing_ms)).await;

            let request =
                OrderRequest::buy_limit(&opp.market.ticker, opp.side, opp.entry_cents, qty);
            report.log(format!(
                "{} [{}] @ {}c x{}",
                opp.market.ticker,
                opp.side.as_str().to_uppercase(),
                opp.entry_cents,
                qty
            ));

            match client.place_order(request).await {
                Ok(_) => {
                    report.actions_taken += 1;
                    report.log(">>> confirmed".to_string());
                    // Later opportunities must see the reduced headroom
                    balance_cents -= cost;
                    invested_cents += cost;
                    *exposure.entry(opp.market.ticker.clone()).or_insert(0) += qty;
                    self.journal_trade(opp, qty);
                }
                Err(ExchangeError::Rejected { status, body })
                    if body.to_lowercase().contains("balance") =>
                {
                    report.log(format!(
                        "{}: rejected ({status}), account fully deployed",
                        opp.market.ticker
                    ));
                    break;
                }
                Err(e) => {
                    report.log(format!("{}: order failed: {e}", opp.market.ticker));
                }
            }
        }

        if report.actions_taken == 0 && !markets.is_empty() {
            report.log("No aligned opportunities executed this cycle".to_string());
        }
        report.log(format!(
            "Cycle done: {} action(s), ${:.2} remaining",
            report.actions_taken,
            balance_cents as f64 / 100.0
        ));
        metrics::gauge!("vigil_balance_cents").set(balance_cents as f64);
        Ok(())
    }

    /// Cancel open orders older than the staleness window. A failed
    /// cancel keeps the order in the books so its exposure still counts.
    async fn cancel_stale_orders(
        &self,
        client: &KalshiClient,
        open_orders: &mut Vec<Order>,
        report: &mut CycleReport,
    ) {
        let cutoff = Utc::now() - ChronoDuration::minutes(self.config.engine.stale_order_minutes);
        let mut kept = Vec::with_capacity(open_orders.len());

        for order in open_orders.drain(..) {
            let is_stale = order.created_time.map(|t| t < cutoff).unwrap_or(false);
            if !is_stale {
                kept.push(order);
                continue;
            }
            match client.cancel_order(&order.order_id).await {
                Ok(()) => {
                    report.log(format!("Cancelled stale order {} ({})", order.order_id, order.ticker));
                }
                Err(e) => {
                    report.log(format!("Cancel failed for {}: {e}", order.order_id));
                    kept.push(order);
                }
            }
        }

        *open_orders = kept;
    }

    /// List every tracked series concurrently; a failed series is logged
    /// and skipped. Dedupe by ticker, last listing wins.
    async fn scan_markets(
        &self,
        client: &KalshiClient,
        report: &mut CycleReport,
    ) -> HashMap<String, Market> {
        let listings = join_all(self.config.engine.series.iter().map(|series| async move {
            let query = MarketsQuery {
                series_ticker: Some(series.clone()),
                status: Some("open".to_string()),
                limit: Some(50),
                cursor: None,
            };
            (series.clone(), client.get_markets(&query).await)
        }))
        .await;

        let mut markets: HashMap<String, Market> = HashMap::new();
        let mut counts: Vec<String> = Vec::new();
        for (series, result) in listings {
            match result {
                Ok(resp) => {
                    counts.push(format!("{series}:{}", resp.markets.len()));
                    for market in resp.markets {
                        markets.insert(market.ticker.clone(), market);
                    }
                }
                Err(e) => {
                    report.log(format!("Series {series} listing failed: {e}"));
                }
            }
        }
        report.log(format!("Horizon: {}", counts.join(" | ")));
        markets
    }

    /// Ceiling on acceptable entry price. Inside the sure-thing band the
    /// ceiling relaxes toward (but never past) the top of the cent range.
    fn max_entry_cents(&self, strike: &Strike, spot: Decimal) -> i64 {
        let engine_cfg = &self.config.engine;
        let conviction_ceiling = 100 - self.config.risk.min_edge_cents;

        let sure_thing = strike
            .cushion(spot)
            .map(|c| c >= engine_cfg.sure_thing_gap)
            .unwrap_or(false);
        if sure_thing {
            conviction_ceiling.max(engine_cfg.sure_thing_cap_cents.min(99))
        } else {
            conviction_ceiling
        }
    }

    /// Kelly size with the caller-side clamps: held exposure subtracted,
    /// per-ticker and budget headroom applied, then the minimum-viable-bet
    /// round-up when the formula floors to zero.
    fn size_position(&self, balance_cents: i64, entry: i64, held: i64, invested: i64) -> i64 {
        let risk_cfg = &self.config.risk;

        let raw = kelly_shares(
            balance_cents,
            entry,
            risk_cfg.min_edge_cents,
            risk_cfg.risk_fraction,
            risk_cfg.kelly_cap,
        );

        let mut qty = raw - held;
        qty = qty.min(risk_cfg.max_shares - held);
        if let Some(max_budget) = risk_cfg.max_budget_cents {
            let budget_headroom = (max_budget - invested).max(0);
            qty = qty.min(budget_headroom / entry);
        }

        if qty <= 0 {
            let affords_one = balance_cents >= entry;
            let under_cap = held < risk_cfg.max_shares;
            let within_budget = risk_cfg
                .max_budget_cents
                .map(|max| invested + entry <= max)
                .unwrap_or(true);
            if affords_one && under_cap && within_budget {
                return 1;
            }
            return 0;
        }
        qty
    }

    fn tally_skip(&self, report: &mut CycleReport, reason: SkipReason) {
        match reason {
            SkipReason::NoStrike => report.rejections.no_strike += 1,
            SkipReason::NoQuote => report.rejections.no_quote += 1,
            SkipReason::WideSpread(_) => report.rejections.wide_spread += 1,
            SkipReason::Overbought | SkipReason::Oversold => report.rejections.momentum += 1,
            SkipReason::TrendFight => report.rejections.trend_fight += 1,
        }
    }

    /// Fire-and-forget journal write, off the execution path
    fn journal_trade(&self, opp: &Opportunity, qty: i64) {
        let sink = Arc::clone(&self.journal);
        let record = TradeRecord {
            ticker: opp.market.ticker.clone(),
            side: opp.side,
            price: opp.entry_cents,
            qty,
            status: "open".to_string(),
        };
        tokio::spawn(async move {
            sink.record(record).await;
        });
    }
}

/// Unique assets referenced by the tracked series list
fn tracked_assets(series: &[String]) -> Vec<Asset> {
    let mut assets = Vec::new();
    for ticker in series {
        let asset = Asset::for_ticker(ticker);
        if !assets.contains(&asset) {
            assets.push(asset);
        }
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> TradingEngine {
        TradingEngine::new(Config::default())
    }

    #[test]
    fn test_tracked_assets_deduped() {
        let series = vec![
            "KXBTC".to_string(),
            "KXETH".to_string(),
            "KXBTC15M".to_string(),
            "KXETHD".to_string(),
        ];
        assert_eq!(tracked_assets(&series), vec![Asset::Btc, Asset::Eth]);
    }

    #[test]
    fn test_size_position_subtracts_held() {
        let engine = engine();
        // balance 100_000, entry 50: raw kelly = 60 with default edge 10,
        // but clamped to max_shares(10) - held(4) = 6
        let qty = engine.size_position(100_000, 50, 4, 0);
        assert_eq!(qty, 6);
    }

    #[test]
    fn test_size_position_respects_budget_headroom() {
        let mut config = Config::default();
        config.risk.max_budget_cents = Some(200);
        config.risk.max_shares = 100;
        let engine = TradingEngine::new(config);
        // 150 cents of headroom at 50c per share: 3 shares max
        let qty = engine.size_position(100_000, 50, 0, 50);
        assert_eq!(qty, 3);
    }

    #[test]
    fn test_size_position_minimum_viable_bet() {
        let engine = engine();
        // Tiny balance floors the Kelly result to zero shares, but the
        // account can afford exactly one
        let qty = engine.size_position(60, 50, 0, 0);
        assert_eq!(qty, 1);
    }

    #[test]
    fn test_size_position_zero_when_broke() {
        let engine = engine();
        let qty = engine.size_position(30, 50, 0, 0);
        assert_eq!(qty, 0);
    }

    #[test]
    fn test_size_position_zero_at_cap() {
        let engine = engine();
        let qty = engine.size_position(100_000, 50, 10, 0);
        assert_eq!(qty, 0);
    }

    #[test]
    fn test_max_entry_relaxes_in_sure_thing_band() {
        let engine = engine();
        let strike = Strike::Floor(dec!(90000));
        // 1% cushion: normal ceiling (100 - min_edge = 90)
        assert_eq!(engine.max_entry_cents(&strike, dec!(90900)), 90);
        // 5% cushion: sure-thing ceiling
        assert_eq!(engine.max_entry_cents(&strike, dec!(94500)), 99);
    }
}
