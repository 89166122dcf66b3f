//! Fractional-Kelly position sizing for binary contracts
//!
//! A contract bought at `price` cents pays 100 cents on a win, so the
//! payout ratio is b = (100 - price) / price. The configured edge (in
//! cents) is treated as a probability estimation advantage on top of the
//! market-implied probability. The raw Kelly fraction is hard-capped to
//! bound tail risk from a non-stationary edge estimate, then scaled by
//! the fractional-Kelly discipline.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Share count for a balance, entry price, and assumed edge.
///
/// The raw Kelly fraction is clamped to `[0, kelly_cap]` before being
/// scaled by `risk_fraction`, so sized notional never exceeds
/// `kelly_cap * risk_fraction * balance`. Returns 0 for degenerate
/// prices or a non-positive balance; exposure and budget clamping is the
/// caller's job.
pub fn kelly_shares(
    balance_cents: i64,
    price_cents: i64,
    edge_cents: i64,
    risk_fraction: Decimal,
    kelly_cap: Decimal,
) -> i64 {
    if balance_cents <= 0 || !(1..=99).contains(&price_cents) || edge_cents < 0 {
        return 0;
    }

    let price = Decimal::from(price_cents);
    let p = (price + Decimal::from(edge_cents)) / dec!(100);
    let q = Decimal::ONE - p;
    let b = (dec!(100) - price) / price;

    let raw = (p * b - q) / b;
    let capped = raw.clamp(Decimal::ZERO, kelly_cap);
    let adjusted = capped * risk_fraction;

    let target_cents = Decimal::from(balance_cents) * adjusted;
    (target_cents / price).floor().to_i64().unwrap_or(0)
}
