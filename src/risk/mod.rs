//! Risk management module
//!
//! Fractional-Kelly position sizing; exposure and budget clamps live in
//! the trading engine where the account state is known.

mod kelly;

pub use kelly::kelly_shares;
