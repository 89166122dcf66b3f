//! Strike extraction from market metadata
//!
//! Structured `floor_strike`/`cap_strike` fields are authoritative when
//! present. Older series only encode the strike in the market title or
//! subtitle ("BTC above $90,000", "$95,000 to $100,000", "between
//! $95,000 and $100,000"), so free text is parsed as a fallback.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::exchange::Market;

/// The price condition a market resolves on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// Yes resolves when spot is inside [low, high]
    Range(Decimal, Decimal),
    /// Yes resolves when spot is at or above the level
    Floor(Decimal),
    /// Yes resolves when spot is at or below the level
    Cap(Decimal),
}

impl Strike {
    /// Fractional cushion between spot and the nearest decision boundary.
    ///
    /// Feeds the sure-thing pricing band: a large cushion means spot would
    /// need a large move to flip the outcome.
    pub fn cushion(&self, spot: Decimal) -> Option<Decimal> {
        let boundaries = match self {
            Strike::Range(low, high) => [Some(*low), Some(*high)],
            Strike::Floor(level) => [Some(*level), None],
            Strike::Cap(level) => [Some(*level), None],
        };
        boundaries
            .into_iter()
            .flatten()
            .filter(|b| !b.is_zero())
            .map(|b| ((spot - b) / b).abs())
            .min()
    }
}

/// Resolve the strike for a market, structured fields first
pub fn extract(market: &Market) -> Option<Strike> {
    match (market.floor_strike, market.cap_strike) {
        (Some(floor), Some(cap)) => {
            return Some(Strike::Range(floor.min(cap), floor.max(cap)));
        }
        (Some(floor), None) => return Some(Strike::Floor(floor)),
        (None, Some(cap)) => return Some(Strike::Cap(cap)),
        (None, None) => {}
    }

    let combined = format!("{} {}", market.title, market.subtitle).to_lowercase();
    parse_text(&combined)
}

/// Parse a strike out of free text
fn parse_text(text: &str) -> Option<Strike> {
    if let Some(range) = parse_range(text) {
        return Some(range);
    }

    let (value, start, end) = first_dollar_amount(text)?;
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();

    const FLOOR_AFTER: [&str; 5] = ["or more", "or above", "or higher", "above", "higher"];
    const FLOOR_BEFORE: [&str; 3] = ["at or above", "higher than", "above"];
    const CAP_AFTER: [&str; 5] = ["or less", "or below", "or lower", "below", "lower"];
    const CAP_BEFORE: [&str; 3] = ["at or below", "lower than", "below"];

    if FLOOR_AFTER.iter().any(|kw| after.starts_with(kw))
        || FLOOR_BEFORE.iter().any(|kw| before.ends_with(kw))
    {
        return Some(Strike::Floor(value));
    }
    if CAP_AFTER.iter().any(|kw| after.starts_with(kw))
        || CAP_BEFORE.iter().any(|kw| before.ends_with(kw))
    {
        return Some(Strike::Cap(value));
    }

    None
}

/// "$X to $Y" or "between $X and $Y"
fn parse_range(text: &str) -> Option<Strike> {
    let (low, start, end) = first_dollar_amount(text)?;

    let rest = text[end..].trim_start();
    let connector = if rest.starts_with("to ") || rest.starts_with("to$") {
        Some(&rest[2..])
    } else if text[..start].contains("between") && rest.starts_with("and ") {
        Some(&rest[3..])
    } else {
        None
    }?;

    let (high, _, _) = leading_amount(connector.trim_start())?;
    Some(Strike::Range(low.min(high), low.max(high)))
}

/// First "$1,234.56"-style amount in the text: (value, start, end) byte offsets
fn first_dollar_amount(text: &str) -> Option<(Decimal, usize, usize)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('$') {
        let start = search_from + rel;
        if let Some((value, _, consumed)) = leading_amount(&text[start..]) {
            return Some((value, start, start + consumed));
        }
        search_from = start + 1;
    }
    None
}

/// Parse an amount at the head of `s`, optionally '$'-prefixed.
/// Returns (value, digits_start, total_bytes_consumed).
fn leading_amount(s: &str) -> Option<(Decimal, usize, usize)> {
    let digits_start = usize::from(s.starts_with('$'));
    let body = &s[digits_start..];

    let mut end = 0;
    for (i, c) in body.char_indices() {
        if c.is_ascii_digit() || c == ',' || c == '.' {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    let raw = body[..end].trim_end_matches(['.', ',']);
    if raw.is_empty() {
        return None;
    }

    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let value = Decimal::from_str(&cleaned).ok()?;
    Some((value, digits_start, digits_start + raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn market(title: &str, floor: Option<Decimal>, cap: Option<Decimal>) -> Market {
        Market {
            ticker: "KXBTC-TEST".to_string(),
            event_ticker: String::new(),
            title: title.to_string(),
            subtitle: String::new(),
            status: "open".to_string(),
            floor_strike: floor,
            cap_strike: cap,
            yes_bid: Some(40),
            yes_ask: Some(45),
            no_bid: Some(55),
            no_ask: Some(60),
            close_time: Utc::now(),
        }
    }

    #[test]
    fn test_structured_range() {
        let m = market("whatever", Some(dec!(95000)), Some(dec!(100000)));
        assert_eq!(
            extract(&m),
            Some(Strike::Range(dec!(95000), dec!(100000)))
        );
    }

    #[test]
    fn test_structured_floor_only() {
        let m = market("whatever", Some(dec!(90000)), None);
        assert_eq!(extract(&m), Some(Strike::Floor(dec!(90000))));
    }

    #[test]
    fn test_structured_cap_only() {
        let m = market("whatever", None, Some(dec!(85000)));
        assert_eq!(extract(&m), Some(Strike::Cap(dec!(85000))));
    }

    #[test]
    fn test_structured_beats_text() {
        let m = market("BTC above $1", Some(dec!(90000)), None);
        assert_eq!(extract(&m), Some(Strike::Floor(dec!(90000))));
    }

    #[test]
    fn test_text_range_to() {
        let m = market("Will BTC close at $95,000 to $100,000?", None, None);
        assert_eq!(
            extract(&m),
            Some(Strike::Range(dec!(95000), dec!(100000)))
        );
    }

    #[test]
    fn test_text_range_between() {
        let m = market("BTC between $95,000 and 100,000 today", None, None);
        assert_eq!(
            extract(&m),
            Some(Strike::Range(dec!(95000), dec!(100000)))
        );
    }

    #[test]
    fn test_text_above_prefix() {
        let m = market("Bitcoin above $90,000 at 5pm EDT?", None, None);
        assert_eq!(extract(&m), Some(Strike::Floor(dec!(90000))));
    }

    #[test]
    fn test_text_or_more_suffix() {
        let m = market("BTC at $90,000 or more", None, None);
        assert_eq!(extract(&m), Some(Strike::Floor(dec!(90000))));
    }

    #[test]
    fn test_text_below() {
        let m = market("ETH below $2,400 today", None, None);
        assert_eq!(extract(&m), Some(Strike::Cap(dec!(2400))));
    }

    #[test]
    fn test_text_or_less_suffix() {
        let m = market("ETH at $2,400.50 or less", None, None);
        assert_eq!(extract(&m), Some(Strike::Cap(dec!(2400.50))));
    }

    #[test]
    fn test_no_pattern() {
        let m = market("Who will win the championship?", None, None);
        assert_eq!(extract(&m), None);
    }

    #[test]
    fn test_reversed_range_normalized() {
        let m = market("from $100,000 to $95,000", None, None);
        assert_eq!(
            extract(&m),
            Some(Strike::Range(dec!(95000), dec!(100000)))
        );
    }

    #[test]
    fn test_cushion_floor() {
        let strike = Strike::Floor(dec!(90000));
        // Spot 5% above the floor
        let cushion = strike.cushion(dec!(94500)).unwrap();
        assert_eq!(cushion, dec!(0.05));
    }

    #[test]
    fn test_cushion_range_uses_nearest_boundary() {
        let strike = Strike::Range(dec!(90000), dec!(100000));
        let cushion = strike.cushion(dec!(99000)).unwrap();
        assert_eq!(cushion, dec!(0.01));
    }
}
