// crates/syndicate-core/src/amount.rs
//
// Fixed-point token amounts.
//
// Every balance, allowance, stake and reward is an integer count of the
// smallest unit, with 18 fractional decimal digits: 1 token = 10^18 units.
// Callers scale human quantities before they reach the ledger.

use std::fmt;

use primitive_types::U256;

use crate::error::SyndicateError;

/// Number of fractional decimal digits carried by every amount.
pub const DECIMALS: u32 = 18;

/// Number of smallest units in one whole token. 1 token = 10^18 units.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Type alias for an amount in smallest units.
pub type Amount = u128;

/// Scale a whole-token quantity to smallest units.
///
/// # Example
/// ```
/// use syndicate_core::amount::{units, UNITS_PER_TOKEN};
/// assert_eq!(units(20_000), 20_000 * UNITS_PER_TOKEN);
/// ```
pub fn units(whole: u128) -> Amount {
    whole.saturating_mul(UNITS_PER_TOKEN)
}

/// Parse a human-readable decimal quantity ("989.999505") into smallest units.
///
/// Rejects more than 18 fractional digits rather than rounding.
pub fn parse_units(text: &str) -> Result<Amount, SyndicateError> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(SyndicateError::InvalidAmount(format!(
            "cannot parse '{}' as an amount",
            text
        )));
    }
    if frac.len() > DECIMALS as usize {
        return Err(SyndicateError::InvalidAmount(format!(
            "'{}' has more than {} fractional digits",
            text, DECIMALS
        )));
    }
    let parse = |digits: &str| -> Result<u128, SyndicateError> {
        if digits.is_empty() {
            return Ok(0);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SyndicateError::InvalidAmount(format!(
                "cannot parse '{}' as an amount",
                text
            )));
        }
        digits
            .parse::<u128>()
            .map_err(|e| SyndicateError::InvalidAmount(format!("'{}': {}", text, e)))
    };

    let whole_units = parse(whole)?
        .checked_mul(UNITS_PER_TOKEN)
        .ok_or_else(|| SyndicateError::InvalidAmount(format!("'{}' overflows", text)))?;
    let frac_units = parse(frac)? * 10u128.pow(DECIMALS - frac.len() as u32);

    whole_units
        .checked_add(frac_units)
        .ok_or_else(|| SyndicateError::InvalidAmount(format!("'{}' overflows", text)))
}

/// Narrow a 256-bit intermediate back to an `Amount`.
pub fn to_amount(value: U256) -> Result<Amount, SyndicateError> {
    if value > U256::from(u128::MAX) {
        return Err(SyndicateError::InvalidAmount(format!(
            "{} does not fit in 128 bits",
            value
        )));
    }
    Ok(value.low_u128())
}

/// Display wrapper rendering an amount in whole tokens, trimming trailing zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Units(pub Amount);

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_TOKEN;
        let frac = self.0 % UNITS_PER_TOKEN;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{}", whole, trimmed)
        }
    }
}
