//! Transcendental scaffolding over the decimal adapter.
//!
//! Square roots, trigonometry, exponentials and non-integer powers go
//! through the host float, then back into decimals via the shortest
//! decimal representation. Integer powers stay in decimal arithmetic.
//! The precision of these paths is that of an f64, which is the
//! documented trade-off of the adapter.

use stax_core::{Error, Result, Tag};
use stax_arith::{decimal, Decimal};

pub fn to_f64(value: &Decimal) -> f64 {
    let magnitude = value.coeff as f64 * 10f64.powi(value.exp);
    if value.neg {
        -magnitude
    } else {
        magnitude
    }
}

pub fn from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::ValueOutOfRange);
    }
    if value == 0.0 {
        return Ok(Decimal::zero());
    }
    let neg = value < 0.0;
    // Shortest decimal form, e.g. "2.5e0" or "1.25e-7".
    let text = format!("{:e}", value.abs());
    let (mantissa, exp_text) = text.split_once('e').ok_or(Error::ValueOutOfRange)?;
    let exponent: i32 = exp_text.parse().map_err(|_| Error::ValueOutOfRange)?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mut coeff: u128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let digit = c.to_digit(10).ok_or(Error::ValueOutOfRange)?;
        coeff = coeff * 10 + u128::from(digit);
    }
    Ok(Decimal::new(neg, coeff, exponent - frac_part.len() as i32))
}

/// Unary transcendental dispatch.
pub fn apply(op: Tag, x: &Decimal) -> Result<Decimal> {
    let v = to_f64(x);
    let result = match op {
        Tag::Sqrt => {
            if x.neg {
                return Err(Error::ValueOutOfRange);
            }
            v.sqrt()
        }
        Tag::Sin => v.sin(),
        Tag::Cos => v.cos(),
        Tag::Tan => v.tan(),
        Tag::Exp => v.exp(),
        Tag::Ln => {
            if v <= 0.0 {
                return Err(Error::ValueOutOfRange);
            }
            v.ln()
        }
        _ => return Err(Error::Unimplemented),
    };
    from_f64(result)
}

/// `y ^ x` for decimals: exact squaring chain for small integral
/// exponents, float fallback otherwise.
pub fn decimal_pow(y: &Decimal, x: &Decimal) -> Result<Decimal> {
    if let Some(exponent) = small_integral(x) {
        let negative = exponent < 0;
        let mut remaining = exponent.unsigned_abs();
        let mut result = Decimal::from_i64(1);
        let mut square = *y;
        while remaining != 0 {
            if remaining & 1 != 0 {
                result = decimal::mul(&result, &square);
            }
            remaining >>= 1;
            if remaining != 0 {
                square = decimal::mul(&square, &square);
            }
        }
        if negative {
            return decimal::div(&Decimal::from_i64(1), &result);
        }
        return Ok(result);
    }
    let base = to_f64(y);
    let power = to_f64(x);
    let result = base.powf(power);
    if result.is_nan() {
        return Err(Error::ValueOutOfRange);
    }
    from_f64(result)
}

fn small_integral(x: &Decimal) -> Option<i32> {
    let value = x.to_int_if_exact()?;
    let raw = value.to_i64()?;
    i32::try_from(raw).ok()
}
