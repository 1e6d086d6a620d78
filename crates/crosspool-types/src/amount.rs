//! Fixed-point helpers over 256-bit amounts.
//!
//! Every conversion floors. Overflow and division by zero are reported as
//! errors; nothing in here panics.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::constants::{WAD, WAD_DECIMALS};
use crate::{CrosspoolError, Result};

/// `a * b / d`, rounded toward zero.
///
/// # Errors
/// [`CrosspoolError::DivisionByZero`] when `d == 0`,
/// [`CrosspoolError::ArithmeticOverflow`] when `a * b` exceeds 256 bits.
pub fn mul_div(a: U256, b: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(CrosspoolError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(CrosspoolError::ArithmeticOverflow)?;
    Ok(product / d)
}

/// `amount * factor / WAD`.
pub fn wad_mul(amount: U256, factor: U256) -> Result<U256> {
    mul_div(amount, factor, WAD)
}

/// `amount * WAD / factor`.
pub fn wad_div(amount: U256, factor: U256) -> Result<U256> {
    mul_div(amount, WAD, factor)
}

/// Checked addition surfacing overflow as an error.
pub fn checked_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(CrosspoolError::ArithmeticOverflow)
}

/// `10^exponent` as a 256-bit integer.
pub fn pow10(exponent: u32) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exponent))
        .ok_or(CrosspoolError::ArithmeticOverflow)
}

/// Convert a human-written decimal (e.g. `0.98`) into an 18-decimal
/// fixed-point integer. Digits past the 18th are truncated.
///
/// # Errors
/// [`CrosspoolError::Configuration`] for negative values.
pub fn wad_from_decimal(value: Decimal) -> Result<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CrosspoolError::Configuration(format!(
            "negative factor {value}"
        )));
    }
    let mantissa = value.mantissa().unsigned_abs();
    let scale = value.scale();
    if scale > WAD_DECIMALS {
        let divisor = 10u128.pow(scale - WAD_DECIMALS);
        return Ok(U256::from(mantissa / divisor));
    }
    let multiplier = pow10(WAD_DECIMALS - scale)?;
    U256::from(mantissa)
        .checked_mul(multiplier)
        .ok_or(CrosspoolError::ArithmeticOverflow)
}

/// Render an 18-decimal fixed-point integer as a [`Decimal`], when it fits.
#[must_use]
pub fn wad_to_decimal(value: U256) -> Option<Decimal> {
    let raw = i128::try_from(u128::try_from(value).ok()?).ok()?;
    Decimal::try_from_i128_with_scale(raw, WAD_DECIMALS)
        .ok()
        .map(|d| d.normalize())
}
