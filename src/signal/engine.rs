//! Directional signal generation
//!
//! Pure function of market snapshot, spot price, and momentum. The side
//! decision comes straight from the strike; the guard chain then vetoes
//! calls into illiquid books, exhausted momentum, or a strong opposing
//! trend.

use rust_decimal::Decimal;

use super::strike::{extract, Strike};
use super::{Signal, SkipReason};
use crate::config::GuardConfig;
use crate::exchange::{Market, Side};
use crate::feed::Trend;

/// Evaluate one market against the current spot/momentum reading
pub fn evaluate(
    market: &Market,
    spot: Decimal,
    rsi: Decimal,
    trend: Trend,
    guards: &GuardConfig,
) -> Signal {
    let Some(strike) = extract(market) else {
        return Signal::NoSignal(SkipReason::NoStrike);
    };

    let side = winning_side(&strike, spot);

    let Some(quote) = market.quote(side) else {
        return Signal::NoSignal(SkipReason::NoQuote);
    };
    if quote.spread() > guards.max_spread_cents {
        return Signal::NoSignal(SkipReason::WideSpread(quote.spread()));
    }

    // Momentum exhaustion: don't chase a move that already ran
    if side == Side::Yes && rsi > guards.overbought {
        return Signal::NoSignal(SkipReason::Overbought);
    }
    if side == Side::No && rsi < guards.oversold {
        return Signal::NoSignal(SkipReason::Oversold);
    }

    // Trend discipline: fighting the hourly trend needs extreme momentum
    // in the call's favor to justify a reversal bet
    match (side, trend) {
        (Side::Yes, Trend::Down) if rsi > guards.extreme_oversold => {
            return Signal::NoSignal(SkipReason::TrendFight);
        }
        (Side::No, Trend::Up) if rsi < guards.extreme_overbought => {
            return Signal::NoSignal(SkipReason::TrendFight);
        }
        _ => {}
    }

    Signal::Trade { side, strike }
}

/// Which side the strike condition currently favors
fn winning_side(strike: &Strike, spot: Decimal) -> Side {
    let yes_wins = match strike {
        Strike::Range(low, high) => spot >= *low && spot <= *high,
        Strike::Floor(level) => spot >= *level,
        Strike::Cap(level) => spot <= *level,
    };
    if yes_wins {
        Side::Yes
    } else {
        Side::No
    }
}
