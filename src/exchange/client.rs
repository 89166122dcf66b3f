//! Kalshi REST client
//!
//! Thin typed wrapper over the trade API. Every call is signed, issued
//! exactly once, and never follows redirects (a silent redirect would mask
//! a 401 behind a login page). Retry and pacing policy belong to the
//! caller, not this layer.

use chrono::Utc;
use reqwest::{redirect, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::signer::sign_request;
use super::types::{
    Balance, ExchangeError, FillsResponse, MarketResponse, MarketsResponse, Order,
    OrderRequest, OrdersResponse, PositionsResponse, SettlementsResponse,
};

/// Production trade API
pub const LIVE_API: &str = "https://api.elections.kalshi.com/trade-api/v2";
/// Demo environment trade API
pub const DEMO_API: &str = "https://demo-api.kalshi.co/trade-api/v2";

const ACCESS_KEY_HEADER: &str = "KALSHI-ACCESS-KEY";
const ACCESS_SIGNATURE_HEADER: &str = "KALSHI-ACCESS-SIGNATURE";
const ACCESS_TIMESTAMP_HEADER: &str = "KALSHI-ACCESS-TIMESTAMP";

// The API gateway throttles unknown agents more aggressively
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Query options for listing markets
#[derive(Debug, Default, Clone)]
pub struct MarketsQuery {
    pub series_ticker: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Query options for cursor-paginated portfolio listings
#[derive(Debug, Default, Clone)]
pub struct PageQuery {
    pub ticker: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Signed HTTP client for the Kalshi trade API
pub struct KalshiClient {
    key_id: String,
    private_key: String,
    base_url: String,
    http: Client,
}

impl KalshiClient {
    /// Create a client for the live or demo environment.
    ///
    /// The key id is sanitized down to UUID-safe characters since it is
    /// routinely pasted with surrounding whitespace or quotes.
    pub fn new(key_id: &str, private_key: &str, demo: bool) -> Result<Self, ExchangeError> {
        let base_url = if demo { DEMO_API } else { LIVE_API };
        Self::with_base_url(key_id, private_key, base_url)
    }

    /// Create a client against an explicit base URL (used by tests)
    pub fn with_base_url(
        key_id: &str,
        private_key: &str,
        base_url: &str,
    ) -> Result<Self, ExchangeError> {
        let key_id: String = key_id
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            key_id,
            private_key: private_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ExchangeError> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let signature = sign_request(method.as_str(), path, timestamp_ms, &self.private_key)?;

        let clean_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let url = format!("{}{}", self.base_url, clean_path);

        let mut req = self
            .http
            .request(method, &url)
            .header(ACCESS_KEY_HEADER, &self.key_id)
            .header(ACCESS_SIGNATURE_HEADER, signature)
            .header(ACCESS_TIMESTAMP_HEADER, timestamp_ms.to_string())
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();

        if status.is_redirection() {
            return Err(ExchangeError::Redirect(status.as_u16()));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ExchangeError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExchangeError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// List markets, optionally filtered by series/status with cursor paging
    pub async fn get_markets(&self, query: &MarketsQuery) -> Result<MarketsResponse, ExchangeError> {
        let mut params = Vec::new();
        if let Some(ref s) = query.series_ticker {
            params.push(format!("series_ticker={s}"));
        }
        if let Some(ref s) = query.status {
            params.push(format!("status={s}"));
        }
        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }
        if let Some(ref c) = query.cursor {
            params.push(format!("cursor={c}"));
        }
        let path = if params.is_empty() {
            "/markets".to_string()
        } else {
            format!("/markets?{}", params.join("&"))
        };
        self.get(&path).await
    }

    /// Fetch a single market by ticker
    pub async fn get_market(&self, ticker: &str) -> Result<MarketResponse, ExchangeError> {
        self.get(&format!("/markets/{ticker}")).await
    }

    /// Current account balance in cents
    pub async fn get_balance(&self) -> Result<Balance, ExchangeError> {
        self.get("/portfolio/balance").await
    }

    /// All open positions
    pub async fn get_positions(&self) -> Result<PositionsResponse, ExchangeError> {
        self.get("/portfolio/positions").await
    }

    /// Orders, optionally filtered by status and ticker
    pub async fn get_orders(
        &self,
        status: Option<&str>,
        ticker: Option<&str>,
    ) -> Result<OrdersResponse, ExchangeError> {
        let mut params = Vec::new();
        if let Some(status) = status {
            params.push(format!("status={status}"));
        }
        if let Some(ticker) = ticker {
            params.push(format!("ticker={ticker}"));
        }
        let path = if params.is_empty() {
            "/portfolio/orders".to_string()
        } else {
            format!("/portfolio/orders?{}", params.join("&"))
        };
        self.get(&path).await
    }

    /// Cancel a resting order by id
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .request(Method::DELETE, &format!("/portfolio/orders/{order_id}"), None::<&()>)
            .await?;
        Ok(())
    }

    /// Submit a new order.
    ///
    /// A client order id is generated when the caller did not set one, so
    /// a retried submission cannot double-fill.
    pub async fn place_order(&self, mut order: OrderRequest) -> Result<Order, ExchangeError> {
        if order.client_order_id.is_none() {
            order.client_order_id = Some(new_client_order_id());
        }

        #[derive(serde::Deserialize)]
        struct PlaceOrderResponse {
            order: Order,
        }

        let resp: PlaceOrderResponse = self
            .request(Method::POST, "/portfolio/orders", Some(&order))
            .await?;
        Ok(resp.order)
    }

    /// Fills for the account, cursor-paginated
    pub async fn get_fills(&self, query: &PageQuery) -> Result<FillsResponse, ExchangeError> {
        self.get(&portfolio_page_path("/portfolio/fills", query)).await
    }

    /// Settled markets for the account, cursor-paginated
    pub async fn get_settlements(
        &self,
        query: &PageQuery,
    ) -> Result<SettlementsResponse, ExchangeError> {
        self.get(&portfolio_page_path("/portfolio/settlements", query))
            .await
    }
}

fn portfolio_page_path(base: &str, query: &PageQuery) -> String {
    let mut params = Vec::new();
    if let Some(ref t) = query.ticker {
        params.push(format!("ticker={t}"));
    }
    if let Some(limit) = query.limit {
        params.push(format!("limit={limit}"));
    }
    if let Some(ref c) = query.cursor {
        params.push(format!("cursor={c}"));
    }
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", params.join("&"))
    }
}

/// Idempotency token: submission time plus a random tail, so two orders
/// built from identical parameters at different instants never collide.
pub fn new_client_order_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("vigil-{}-{}", Utc::now().timestamp_millis(), &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_sanitized() {
        let client =
            KalshiClient::with_base_url(" \"abc-123\" ", &"x".repeat(64), "http://localhost")
                .unwrap();
        assert_eq!(client.key_id, "abc-123");
    }

    #[test]
    fn test_base_url_selection() {
        let live = KalshiClient::new("k", &"x".repeat(64), false).unwrap();
        assert_eq!(live.base_url, LIVE_API);
        let demo = KalshiClient::new("k", &"x".repeat(64), true).unwrap();
        assert_eq!(demo.base_url, DEMO_API);
    }

    #[test]
    fn test_client_order_ids_unique() {
        let a = new_client_order_id();
        let b = new_client_order_id();
        assert_ne!(a, b);
        assert!(a.starts_with("vigil-"));
    }

    #[test]
    fn test_markets_query_path() {
        let query = PageQuery {
            ticker: Some("KXBTC-TEST".to_string()),
            limit: Some(20),
            cursor: None,
        };
        let path = portfolio_page_path("/portfolio/fills", &query);
        assert_eq!(path, "/portfolio/fills?ticker=KXBTC-TEST&limit=20");
    }
}
