//! Decimal adapter: a decimal128-style floating subset.
//!
//! Decimals are opaque to the integer engine; this module is the entire
//! interface the rest of the core sees (`add/sub/mul/div/neg/cmp`,
//! integer conversions, rounding). Values are sign + coefficient +
//! power-of-ten exponent with 34 significant digits and round-half-even,
//! stored in the fixed-size payload of a `Decimal` object.
//!
//! Two deliberate simplifications against full IEEE-754 decimal128: no
//! infinities or NaNs (operations that would produce them error instead),
//! and addition absorbs an operand more than 36 orders of magnitude
//! smaller than the other.

use std::cmp::Ordering;

use stax_core::{object, Error, Result};
use stax_runtime::{ObjectId, Runtime};

use crate::bignum::Int;
use crate::magnitude::{self, Magnitude};

/// Significant decimal digits kept by every operation.
pub const PRECISION: u32 = 34;

const FLAG_NEG: u8 = 0x01;

fn pow10(k: u32) -> u128 {
    10u128.pow(k)
}

fn digits(value: u128) -> u32 {
    let mut count = 1;
    let mut rest = value / 10;
    while rest != 0 {
        count += 1;
        rest /= 10;
    }
    count
}

// ----------------------------------------------------------------------------
//   256-bit scratch arithmetic for exact intermediate products
// ----------------------------------------------------------------------------

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    fn from_u128(value: u128) -> Self {
        Self { hi: 0, lo: value }
    }

    fn mul_u128(a: u128, b: u128) -> Self {
        const MASK: u128 = (1u128 << 64) - 1;
        let (a0, a1) = (a & MASK, a >> 64);
        let (b0, b1) = (b & MASK, b >> 64);
        let ll = a0 * b0;
        let lh = a0 * b1;
        let hl = a1 * b0;
        let hh = a1 * b1;
        let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
        let lo = (ll & MASK) | (mid << 64);
        let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
        Self { hi, lo }
    }

    fn mul_small(self, by: u128) -> Self {
        let low = Self::mul_u128(self.lo, by);
        let high = self.hi.wrapping_mul(by).wrapping_add(low.hi);
        Self {
            hi: high,
            lo: low.lo,
        }
    }

    fn add_u128(self, value: u128) -> Self {
        let (lo, carry) = self.lo.overflowing_add(value);
        Self {
            hi: self.hi + u128::from(carry),
            lo,
        }
    }

    fn is_zero(self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    fn bit(self, index: u32) -> u128 {
        if index >= 128 {
            (self.hi >> (index - 128)) & 1
        } else {
            (self.lo >> index) & 1
        }
    }

    /// Binary long division by a divisor below 2^127.
    fn div_rem(self, divisor: u128) -> (U256, u128) {
        debug_assert!(divisor != 0 && divisor < 1u128 << 127);
        let mut quotient = U256::from_u128(0);
        let mut remainder: u128 = 0;
        for index in (0..256u32).rev() {
            remainder = (remainder << 1) | self.bit(index);
            if remainder >= divisor {
                remainder -= divisor;
                if index >= 128 {
                    quotient.hi |= 1u128 << (index - 128);
                } else {
                    quotient.lo |= 1u128 << index;
                }
            }
        }
        (quotient, remainder)
    }
}

fn u256_cmp(a: U256, b: U256) -> Ordering {
    a.hi.cmp(&b.hi).then(a.lo.cmp(&b.lo))
}

fn u256_sub(a: U256, b: U256) -> U256 {
    debug_assert!(u256_cmp(a, b) != Ordering::Less);
    let (lo, borrow) = a.lo.overflowing_sub(b.lo);
    U256 {
        hi: a.hi - b.hi - u128::from(borrow),
        lo,
    }
}

/// Round a 256-bit value to at most `PRECISION` digits, half-even.
/// Returns the coefficient and how many powers of ten were dropped.
///
/// Digits are shed least-significant first, so the digit dropped last is
/// the rounding digit and every earlier one folds into the sticky bit.
fn round_to_precision(value: U256) -> (u128, i32) {
    let mut current = value;
    let mut dropped = 0i32;
    let mut round_digit: u128 = 0;
    let mut sticky = false;

    while !(current.hi == 0 && digits(current.lo) <= PRECISION) {
        let (next, rem) = current.div_rem(10);
        sticky = sticky || round_digit != 0;
        round_digit = rem;
        current = next;
        dropped += 1;
    }

    let mut coeff = current.lo;
    if round_digit > 5 || (round_digit == 5 && (sticky || coeff & 1 == 1)) {
        coeff += 1;
        if digits(coeff) > PRECISION {
            coeff /= 10;
            dropped += 1;
        }
    }
    (coeff, dropped)
}

// ----------------------------------------------------------------------------
//   The decimal value
// ----------------------------------------------------------------------------

/// A decimal floating-point value: `(-1)^neg * coeff * 10^exp`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
    pub neg: bool,
    pub exp: i32,
    pub coeff: u128,
}

impl Decimal {
    /// Canonical form: zero is positive with exponent zero, trailing
    /// zeros of the coefficient fold into the exponent, coefficients
    /// round to `PRECISION` digits.
    pub fn new(neg: bool, coeff: u128, exp: i32) -> Self {
        let mut value = Self { neg, exp, coeff };
        if value.coeff == 0 {
            return Self {
                neg: false,
                exp: 0,
                coeff: 0,
            };
        }
        if digits(value.coeff) > PRECISION {
            let (rounded, dropped) = round_to_precision(U256::from_u128(value.coeff));
            value.coeff = rounded;
            value.exp += dropped;
        }
        while value.coeff % 10 == 0 {
            value.coeff /= 10;
            value.exp += 1;
        }
        value
    }

    pub fn zero() -> Self {
        Self::new(false, 0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.coeff == 0
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value < 0, value.unsigned_abs() as u128, 0)
    }

    /// Convert any integer value, rounding when it exceeds the precision.
    pub fn from_int(value: &Int) -> Self {
        if value.mag.len() <= 16 {
            let mut raw: u128 = 0;
            for (i, &byte) in value.mag.iter().enumerate() {
                raw |= u128::from(byte) << (8 * i);
            }
            return Self::new(value.neg, raw, 0);
        }
        // Wider than 128 bits: shed decimal digits until it fits.
        let mut mag: Magnitude = value.mag.clone();
        let ten = magnitude::from_u64(10);
        let mut exp = 0i32;
        let mut last = 0u64;
        let mut sticky = false;
        while mag.len() > 16 {
            let (q, r) = magnitude::quorem(&mag, &ten, usize::MAX);
            sticky = sticky || last != 0;
            last = magnitude::to_u64(&r).unwrap_or(0);
            mag = q;
            exp += 1;
        }
        let mut raw: u128 = 0;
        for (i, &byte) in mag.iter().enumerate() {
            raw |= u128::from(byte) << (8 * i);
        }
        if last > 5 || (last == 5 && (sticky || raw & 1 == 1)) {
            raw += 1;
        }
        Self::new(value.neg, raw, exp)
    }

    /// Back to an exact integer, or `None` when there is a fractional
    /// part or the value exceeds what a magnitude can carry here.
    pub fn to_int_if_exact(&self) -> Option<Int> {
        if self.is_zero() {
            return Some(Int::zero());
        }
        if self.exp >= 0 {
            let exp = u32::try_from(self.exp).ok()?;
            // Astronomically scaled values are not integers worth having.
            if exp > 10_000 {
                return None;
            }
            let mut mag = u128_to_magnitude(self.coeff);
            for _ in 0..exp {
                mag = magnitude::mul(&mag, &magnitude::from_u64(10), usize::MAX);
            }
            return Some(Int::new(self.neg, false, mag));
        }
        let shift = self.exp.unsigned_abs();
        if shift > 38 {
            return None;
        }
        let scale = pow10(shift);
        if self.coeff % scale != 0 {
            return None;
        }
        Some(Int::new(
            self.neg,
            false,
            u128_to_magnitude(self.coeff / scale),
        ))
    }

    pub fn neg(&self) -> Self {
        Self::new(!self.neg, self.coeff, self.exp)
    }

    pub fn abs(&self) -> Self {
        Self::new(false, self.coeff, self.exp)
    }

    /// Round to `decimals` fractional digits, half-even.
    pub fn round(&self, decimals: i32) -> Self {
        if self.is_zero() || self.exp >= -decimals {
            return *self;
        }
        let drop = u32::try_from(-decimals - self.exp).unwrap_or(u32::MAX);
        if drop > PRECISION + 4 {
            return Self::zero();
        }
        let scale = pow10(drop);
        let q = self.coeff / scale;
        let r = self.coeff % scale;
        let half = scale / 2;
        let rounded = if r > half || (r == half && q & 1 == 1) {
            q + 1
        } else {
            q
        };
        Self::new(self.neg, rounded, -decimals)
    }
}

fn u128_to_magnitude(value: u128) -> Magnitude {
    let mut mag: Magnitude = Magnitude::from_slice(&value.to_le_bytes());
    magnitude::trim(&mut mag);
    mag
}

// ----------------------------------------------------------------------------
//   Arithmetic
// ----------------------------------------------------------------------------

/// Signed sum over a common exponent.
pub fn add(y: &Decimal, x: &Decimal) -> Decimal {
    if y.is_zero() {
        return *x;
    }
    if x.is_zero() {
        return *y;
    }
    let (wide, narrow) = if y.exp >= x.exp { (y, x) } else { (x, y) };
    let shift = (wide.exp - narrow.exp) as u32;
    if shift > PRECISION + 2 {
        // The narrow operand is beyond the precision window.
        return *wide;
    }
    let scaled = U256::from_u128(wide.coeff).mul_small(pow10(shift));

    if wide.neg == narrow.neg {
        let total = scaled.add_u128(narrow.coeff);
        let (coeff, dropped) = round_to_precision(total);
        return Decimal::new(wide.neg, coeff, narrow.exp + dropped);
    }

    // Opposite signs: subtract the smaller magnitude.
    let narrow_wide = U256::from_u128(narrow.coeff);
    let (larger, smaller, neg) = if u256_cmp(scaled, narrow_wide) != Ordering::Less {
        (scaled, narrow_wide, wide.neg)
    } else {
        (narrow_wide, scaled, narrow.neg)
    };
    let diff = u256_sub(larger, smaller);
    if diff.is_zero() {
        return Decimal::zero();
    }
    let (coeff, dropped) = round_to_precision(diff);
    Decimal::new(neg, coeff, narrow.exp + dropped)
}

pub fn sub(y: &Decimal, x: &Decimal) -> Decimal {
    add(y, &x.neg())
}

pub fn mul(y: &Decimal, x: &Decimal) -> Decimal {
    if y.is_zero() || x.is_zero() {
        return Decimal::zero();
    }
    let product = U256::mul_u128(y.coeff, x.coeff);
    let (coeff, dropped) = round_to_precision(product);
    Decimal::new(y.neg != x.neg, coeff, y.exp + x.exp + dropped)
}

pub fn div(y: &Decimal, x: &Decimal) -> Result<Decimal> {
    if x.is_zero() {
        return Err(Error::ZeroDivide);
    }
    if y.is_zero() {
        return Ok(Decimal::zero());
    }
    // Scale the dividend so the quotient carries two guard digits past
    // the precision; the scaled value stays within 70 digits.
    let scale = (PRECISION + 2 + digits(x.coeff)).saturating_sub(digits(y.coeff));
    let mut scaled = U256::from_u128(y.coeff);
    let mut applied = 0u32;
    while applied < scale {
        let step = (scale - applied).min(38);
        scaled = scaled.mul_small(pow10(step));
        applied += step;
    }
    let (quotient, rem) = scaled.div_rem(x.coeff);

    // An inexact quotient nudges its lowest guard digit off 0 and 5 so
    // the half-even comparison below cannot see a false exact half.
    let mut q = quotient;
    if rem != 0 {
        let (_, low) = q.div_rem(10);
        if low == 0 || low == 5 {
            q = q.add_u128(1);
        }
    }
    let (coeff, dropped) = round_to_precision(q);
    Ok(Decimal::new(
        y.neg != x.neg,
        coeff,
        y.exp - x.exp - scale as i32 + dropped,
    ))
}

pub fn cmp(y: &Decimal, x: &Decimal) -> Ordering {
    match (y.neg, x.neg) {
        (false, true) => return Ordering::Greater,
        (true, false) => return Ordering::Less,
        _ => {}
    }
    let diff = sub(y, x);
    if diff.is_zero() {
        Ordering::Equal
    } else if diff.neg {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

// ----------------------------------------------------------------------------
//   Object encoding
// ----------------------------------------------------------------------------

/// Read a decimal object.
pub fn read_decimal(rt: &Runtime, id: ObjectId) -> Result<Decimal> {
    let (flags, exp, coeff) = object::decimal_parts(rt.bytes(id))?;
    Ok(Decimal::new(flags & FLAG_NEG != 0, coeff, exp))
}

/// Write a decimal value as a heap object.
pub fn make_decimal(rt: &mut Runtime, value: Decimal) -> Result<ObjectId> {
    let flags = if value.neg { FLAG_NEG } else { 0 };
    rt.make_decimal(flags, value.exp, value.coeff)
}
