//! Kalshi exchange integration
//!
//! Request signing, a typed REST client, and the wire types the trading
//! engine consumes.

mod client;
mod signer;
mod types;

pub use client::{new_client_order_id, KalshiClient, MarketsQuery, PageQuery, DEMO_API, LIVE_API};
pub use signer::{canonical_payload, sign_request, AuthError};
pub use types::{
    Action, Balance, ExchangeError, Fill, Market, Order, OrderRequest, Position, Quote,
    Settlement, Side,
};
