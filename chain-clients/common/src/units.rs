//! Raw-unit amount conversion
//!
//! On-chain amounts are integers in the asset's smallest unit. Display amounts are
//! decimals. Every conversion goes through the asset's own `decimals` and never
//! through binary floating point.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest power of ten representable in a `u128`.
const MAX_DECIMALS: u32 = 38;

fn pow10(exp: u32) -> Result<u128> {
    10u128
        .checked_pow(exp)
        .with_context(|| format!("10^{} overflows u128", exp))
}

/// Converts a display amount into raw units, truncating digits beyond `decimals`.
pub fn to_raw_units(amount: Decimal, decimals: u32) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        anyhow::bail!("Amount must not be negative: {}", amount);
    }
    if decimals > MAX_DECIMALS {
        anyhow::bail!("Unsupported decimals: {}", decimals);
    }

    let mantissa = amount.mantissa().unsigned_abs();
    let scale = amount.scale();

    if decimals >= scale {
        mantissa
            .checked_mul(pow10(decimals - scale)?)
            .with_context(|| format!("Amount {} overflows at {} decimals", amount, decimals))
    } else {
        Ok(mantissa / pow10(scale - decimals)?)
    }
}

/// Largest mantissa a `Decimal` can hold (2^96 - 1).
const MAX_DECIMAL_MANTISSA: u128 = (1u128 << 96) - 1;

/// Largest scale a `Decimal` can hold.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Converts raw units into a normalized display decimal.
///
/// Amounts wider than a `Decimal` mantissa lose their least significant fractional
/// digits (truncated toward zero). The integer part stays exact; only an integer
/// part above 2^96 is an error.
pub fn from_raw_units(raw: u128, decimals: u32) -> Result<Decimal> {
    let mut mantissa = raw;
    let mut scale = decimals;
    while scale > 0 && (mantissa > MAX_DECIMAL_MANTISSA || scale > MAX_DECIMAL_SCALE) {
        mantissa /= 10;
        scale -= 1;
    }
    if mantissa > MAX_DECIMAL_MANTISSA {
        anyhow::bail!("Cannot represent {} at {} decimals", raw, decimals);
    }

    let mantissa = i128::try_from(mantissa).context("Raw amount out of range")?;
    let value = Decimal::try_from_i128_with_scale(mantissa, scale)
        .map_err(|e| anyhow::anyhow!("Cannot represent {} at {} decimals: {}", raw, decimals, e))?;
    Ok(value.normalize())
}

/// Formats raw units as an exact decimal string without trailing zeros.
///
/// Unlike [`from_raw_units`] this never loses range: it works on the full `u128`.
pub fn format_units(raw: u128, decimals: u32) -> String {
    if decimals == 0 || decimals > MAX_DECIMALS {
        return raw.to_string();
    }
    let base = 10u128.pow(decimals);
    let whole = raw / base;
    let frac = raw % base;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parses a display string (e.g. `"1.25"`) into raw units.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128> {
    let value = Decimal::from_str(amount.trim())
        .with_context(|| format!("Invalid amount: '{}'", amount))?;
    to_raw_units(value, decimals)
}
