//! Typed payloads for the Kalshi trade API

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signer::AuthError;

/// Contract side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// The opposite side of the contract
    pub fn opposite(self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

/// Order action (the bot only ever buys to open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

/// Exchange client errors
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Signature could not be produced
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Transport-level failure (DNS, TLS, timeout, malformed body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The exchange answered with a redirect, which would mask an auth failure
    #[error("unexpected redirect (status {0}); check the API endpoint")]
    Redirect(u16),
    /// Credentials rejected outright
    #[error("401 unauthorized: key id / private key do not match this environment")]
    Unauthorized,
    /// Any other non-2xx response
    #[error("exchange rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A binary event contract, snapshotted at fetch time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub ticker: String,
    #[serde(default)]
    pub event_ticker: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub status: String,
    /// Structured lower strike bound, when the exchange provides one
    #[serde(default)]
    pub floor_strike: Option<Decimal>,
    /// Structured upper strike bound
    #[serde(default)]
    pub cap_strike: Option<Decimal>,
    #[serde(default)]
    pub yes_bid: Option<i64>,
    #[serde(default)]
    pub yes_ask: Option<i64>,
    #[serde(default)]
    pub no_bid: Option<i64>,
    #[serde(default)]
    pub no_ask: Option<i64>,
    pub close_time: DateTime<Utc>,
}

/// A bid/ask pair in cents for one side of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub bid: i64,
    pub ask: i64,
}

impl Quote {
    pub fn spread(&self) -> i64 {
        self.ask - self.bid
    }
}

impl Market {
    /// Quote for the given side, deriving missing legs from the
    /// counterpart via reciprocal pricing (yes_ask + no_bid = 100).
    pub fn quote(&self, side: Side) -> Option<Quote> {
        let (bid, ask) = match side {
            Side::Yes => (
                self.yes_bid.or(self.no_ask.map(|p| 100 - p)),
                self.yes_ask.or(self.no_bid.map(|p| 100 - p)),
            ),
            Side::No => (
                self.no_bid.or(self.yes_ask.map(|p| 100 - p)),
                self.no_ask.or(self.yes_bid.map(|p| 100 - p)),
            ),
        };
        match (bid, ask) {
            (Some(bid), Some(ask)) if (0..=100).contains(&ask) => Some(Quote { bid, ask }),
            _ => None,
        }
    }
}

/// Account balance in cents
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub balance: i64,
    #[serde(default)]
    pub available_balance: Option<i64>,
}

/// A held position, as reported by the exchange
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub ticker: String,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub count: i64,
    /// Average entry price in cents
    #[serde(default)]
    pub avg_price: i64,
}

/// An order resting on or processed by the exchange
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub ticker: String,
    pub side: Side,
    pub action: Action,
    #[serde(default)]
    pub yes_price: Option<i64>,
    #[serde(default)]
    pub no_price: Option<i64>,
    #[serde(default)]
    pub remaining_count: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

impl Order {
    /// Limit price of the order in cents, whichever side it was placed on
    pub fn price(&self) -> i64 {
        match self.side {
            Side::Yes => self.yes_price.unwrap_or(0),
            Side::No => self.no_price.unwrap_or(0),
        }
    }
}

/// A new limit order to submit
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub ticker: String,
    pub action: Action,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Buy-to-open limit order at the given price in cents
    pub fn buy_limit(ticker: impl Into<String>, side: Side, price_cents: i64, count: i64) -> Self {
        let (yes_price, no_price) = match side {
            Side::Yes => (Some(price_cents), None),
            Side::No => (None, Some(price_cents)),
        };
        Self {
            ticker: ticker.into(),
            action: Action::Buy,
            side,
            order_type: "limit".to_string(),
            count,
            yes_price,
            no_price,
            client_order_id: None,
        }
    }
}

/// A fill reported by the exchange
#[derive(Debug, Clone, Deserialize)]
pub struct Fill {
    pub ticker: String,
    pub side: Side,
    pub action: Action,
    pub count: i64,
    #[serde(default)]
    pub yes_price: Option<i64>,
    #[serde(default)]
    pub no_price: Option<i64>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// A settled market result for the account
#[derive(Debug, Clone, Deserialize)]
pub struct Settlement {
    pub ticker: String,
    #[serde(default)]
    pub market_result: String,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub settled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MarketsResponse {
    pub markets: Vec<Market>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarketResponse {
    pub market: Market,
}

#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct FillsResponse {
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettlementsResponse {
    #[serde(default)]
    pub settlements: Vec<Settlement>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_with_quotes(
        yes_bid: Option<i64>,
        yes_ask: Option<i64>,
        no_bid: Option<i64>,
        no_ask: Option<i64>,
    ) -> Market {
        Market {
            ticker: "KXBTC-TEST".to_string(),
            event_ticker: String::new(),
            title: "Test market".to_string(),
            subtitle: String::new(),
            status: "open".to_string(),
            floor_strike: None,
            cap_strike: None,
            yes_bid,
            yes_ask,
            no_bid,
            no_ask,
            close_time: Utc::now(),
        }
    }

    #[test]
    fn test_quote_direct() {
        let m = market_with_quotes(Some(40), Some(45), Some(55), Some(60));
        let q = m.quote(Side::Yes).unwrap();
        assert_eq!(q.bid, 40);
        assert_eq!(q.ask, 45);
        assert_eq!(q.spread(), 5);
    }

    #[test]
    fn test_quote_reciprocal_yes_from_no() {
        // yes legs missing: derive yes_ask = 100 - no_bid, yes_bid = 100 - no_ask
        let m = market_with_quotes(None, None, Some(55), Some(60));
        let q = m.quote(Side::Yes).unwrap();
        assert_eq!(q.bid, 40);
        assert_eq!(q.ask, 45);
    }

    #[test]
    fn test_quote_missing_everything() {
        let m = market_with_quotes(None, None, None, None);
        assert!(m.quote(Side::Yes).is_none());
        assert!(m.quote(Side::No).is_none());
    }

    #[test]
    fn test_order_price_by_side() {
        let json = r#"{
            "order_id": "o1",
            "ticker": "KXBTC-TEST",
            "side": "no",
            "action": "buy",
            "no_price": 35,
            "remaining_count": 4,
            "status": "resting"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.price(), 35);
    }

    #[test]
    fn test_order_request_side_specific_price() {
        let req = OrderRequest::buy_limit("KXETH-TEST", Side::No, 30, 5);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["no_price"], 30);
        assert!(json.get("yes_price").is_none());
        assert_eq!(json["type"], "limit");
        assert_eq!(json["action"], "buy");
    }

    #[test]
    fn test_market_deserialize_minimal() {
        let json = r#"{
            "ticker": "KXBTC-26AUG29-B95000",
            "title": "BTC between $95,000 and $100,000",
            "yes_bid": 40,
            "yes_ask": 44,
            "close_time": "2026-08-29T21:00:00Z"
        }"#;
        let m: Market = serde_json::from_str(json).unwrap();
        assert_eq!(m.ticker, "KXBTC-26AUG29-B95000");
        assert!(m.floor_strike.is_none());
        assert_eq!(m.yes_ask, Some(44));
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Yes.opposite(), Side::No);
        assert_eq!(Side::No.opposite(), Side::Yes);
    }
}
