//! Conversion between decimal token strings and base units

use crate::token::Amount;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,

    #[error("Invalid amount: {0}")]
    InvalidDigits(String),

    #[error("Too many decimal places: at most {max}, got {got}")]
    TooPrecise { max: u8, got: usize },

    #[error("Amount too large")]
    Overflow,
}

fn scale(decimals: u8) -> Result<Amount, UnitsError> {
    (10 as Amount)
        .checked_pow(decimals as u32)
        .ok_or(UnitsError::Overflow)
}

/// Parse "12.5" into base units for a token with `decimals` places
pub fn parse_units(input: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let input = input.trim().replace('_', "");
    if input.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input.as_str(), ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::InvalidDigits(input.clone()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDigits(input.clone()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise {
            max: decimals,
            got: frac.len(),
        });
    }

    let whole_value: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| UnitsError::Overflow)?
    };

    let mut frac_padded = frac.to_string();
    frac_padded.extend(std::iter::repeat('0').take(decimals as usize - frac.len()));
    let frac_value: Amount = if frac_padded.is_empty() {
        0
    } else {
        frac_padded.parse().map_err(|_| UnitsError::Overflow)?
    };

    whole_value
        .checked_mul(scale(decimals)?)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(UnitsError::Overflow)
}

/// Render base units as a decimal string, trimming trailing zeros
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let Ok(unit) = scale(decimals) else {
        return amount.to_string();
    };
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}
