//! Signal generation module
//!
//! Turns a market snapshot plus the current price/momentum reading into a
//! directional call, or a reasoned no-signal.

mod engine;
mod strike;

pub use engine::evaluate;
pub use strike::{extract, Strike};

use crate::exchange::Side;

/// Outcome of evaluating one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Take the given side; the strike is carried for entry pricing
    Trade { side: Side, strike: Strike },
    /// Stand aside, with the guard that fired
    NoSignal(SkipReason),
}

/// Why a market produced no signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No structured strike and no parseable strike text
    NoStrike,
    /// Neither direct nor reciprocal quotes available for the side
    NoQuote,
    /// Bid/ask spread in cents exceeded the illiquidity guard
    WideSpread(i64),
    /// Yes call into overbought momentum
    Overbought,
    /// No call into oversold momentum
    Oversold,
    /// Call fights the prevailing trend without extreme momentum
    TrendFight,
}
