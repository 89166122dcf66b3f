//! Momentum indicators computed from candle closes
//!
//! RSI uses Wilder's relative-strength formulation over a fixed window of
//! short-interval closes; trend classification compares the ends of a
//! longer-interval window against a small percentage band.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::Trend;

/// Relative Strength Index over the last `period + 1` closes.
///
/// Returns `None` when the series is too sparse for the window. Bounded
/// in [0, 100]; a lossless window yields exactly 100, a gainless one 0.
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - (period + 1)..];
    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;

    for pair in window.windows(2) {
        let diff = pair[1] - pair[0];
        if diff >= Decimal::ZERO {
            gains += diff;
        } else {
            losses -= diff;
        }
    }

    if losses.is_zero() {
        return Some(dec!(100));
    }

    let period = Decimal::from(period as u64);
    let rs = (gains / period) / (losses / period);
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

/// Classify a coarse trend from the first and last close of a window.
///
/// Moves inside `band` (a fraction, e.g. 0.002 for ±0.2%) are flat.
pub fn classify_trend(closes: &[Decimal], band: Decimal) -> Trend {
    if closes.len() < 3 {
        return Trend::Flat;
    }

    let first = closes[0];
    let last = closes[closes.len() - 1];
    if first.is_zero() {
        return Trend::Flat;
    }

    let change = (last - first) / first;
    if change > band {
        Trend::Up
    } else if change < -band {
        Trend::Down
    } else {
        Trend::Flat
    }
}
