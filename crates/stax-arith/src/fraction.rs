//! Exact rational arithmetic.
//!
//! A fraction object embeds a numerator and denominator, both non-negative
//! integer objects, with the sign in the fraction tag. Every constructor
//! runs the same canonicalization: a zero denominator is an error, both
//! halves are divided by their gcd, the denominator ends up positive, and
//! a denominator of one collapses the value to a plain integer. Small
//! versus big fraction tags follow from whether both halves fit a machine
//! word.

use smallvec::SmallVec;
use stax_core::{object, Error, Result, Settings, Tag};
use stax_runtime::{ObjectId, Runtime};

use crate::bignum::Int;
use crate::magnitude::{self, Magnitude};

/// Sign-and-magnitude view of an exact rational.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rational {
    pub neg: bool,
    pub num: Magnitude,
    pub den: Magnitude,
}

impl Rational {
    /// Canonical form; fails on a zero denominator.
    pub fn new(neg: bool, mut num: Magnitude, mut den: Magnitude) -> Result<Self> {
        magnitude::trim(&mut num);
        magnitude::trim(&mut den);
        if den.is_empty() {
            return Err(Error::ZeroDivide);
        }
        if num.is_empty() {
            return Ok(Self {
                neg: false,
                num,
                den: magnitude::from_u64(1),
            });
        }
        let g = magnitude::gcd(&num, &den);
        if magnitude::to_u64(&g) != Some(1) {
            num = magnitude::quorem(&num, &g, usize::MAX).0;
            den = magnitude::quorem(&den, &g, usize::MAX).0;
        }
        Ok(Self { neg, num, den })
    }

    pub fn from_int(value: &Int) -> Self {
        Self {
            neg: value.neg,
            num: value.mag.clone(),
            den: magnitude::from_u64(1),
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_int(&Int::from_i64(value))
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_empty()
    }

    /// True when the denominator is one and the value is really an integer.
    pub fn is_integral(&self) -> bool {
        magnitude::to_u64(&self.den) == Some(1)
    }

    fn fits_small(&self) -> bool {
        magnitude::to_u64(&self.num).is_some() && magnitude::to_u64(&self.den).is_some()
    }
}

/// Read a fraction or integer object as a rational.
pub fn read_rational(rt: &Runtime, id: ObjectId) -> Result<Rational> {
    let bytes = rt.bytes(id);
    let tag = object::tag_of(bytes)?;
    if tag.is_integer() {
        let value = crate::bignum::read_int(rt, id)?;
        return Ok(Rational::from_int(&value));
    }
    if !tag.is_fraction() {
        return Err(Error::TypeMismatch);
    }
    let (num_obj, den_obj) = object::pair(bytes)?;
    let num = embedded_magnitude(num_obj)?;
    let den = embedded_magnitude(den_obj)?;
    Rational::new(tag.is_negative(), num, den)
}

fn embedded_magnitude(bytes: &[u8]) -> Result<Magnitude> {
    let tag = object::tag_of(bytes)?;
    match tag {
        Tag::Integer => Ok(magnitude::from_u64(object::small_value(bytes)?)),
        Tag::Bignum => Ok(SmallVec::from_slice(object::big_magnitude(bytes)?)),
        _ => Err(Error::TypeMismatch),
    }
}

/// Encode a rational as object bytes: integer when integral, small or
/// big fraction otherwise.
pub fn encode(value: &Rational, out: &mut Vec<u8>) {
    if value.is_integral() {
        let int = Int::new(value.neg, false, value.num.clone());
        match magnitude::to_u64(&int.mag) {
            Some(small) => object::build::small(int.tag(), small, out),
            None => object::build::bignum(int.tag(), &int.mag, out),
        }
        return;
    }
    let tag = match (value.neg, value.fits_small()) {
        (false, true) => Tag::Fraction,
        (true, true) => Tag::NegFraction,
        (false, false) => Tag::BigFraction,
        (true, false) => Tag::NegBigFraction,
    };
    stax_core::leb128::write_uleb(tag.as_u8() as u64, out);
    append_half(&value.num, out);
    append_half(&value.den, out);
}

/// Write a rational back as a canonical heap object.
pub fn make_rational(rt: &mut Runtime, value: Rational) -> Result<ObjectId> {
    let mut buf = Vec::new();
    encode(&value, &mut buf);
    rt.insert(&buf)
}

fn append_half(mag: &Magnitude, out: &mut Vec<u8>) {
    match magnitude::to_u64(mag) {
        Some(small) => object::build::small(Tag::Integer, small, out),
        None => object::build::bignum(Tag::Bignum, mag, out),
    }
}

fn signed_add(a_neg: bool, a: &Magnitude, b_neg: bool, b: &Magnitude) -> (bool, Magnitude) {
    if a_neg == b_neg {
        return (a_neg, magnitude::add(a, b));
    }
    match magnitude::cmp(a, b) {
        std::cmp::Ordering::Equal => (false, Magnitude::new()),
        std::cmp::Ordering::Greater => (a_neg, magnitude::sub(a, b)),
        std::cmp::Ordering::Less => (b_neg, magnitude::sub(b, a)),
    }
}

/// `y + x` or `y - x` over the common denominator.
pub fn add_sub(y: &Rational, x: &Rational, subtract: bool) -> Result<Rational> {
    let lhs = magnitude::mul(&y.num, &x.den, usize::MAX);
    let rhs = magnitude::mul(&x.num, &y.den, usize::MAX);
    let xneg = x.neg != subtract;
    let (neg, num) = signed_add(y.neg, &lhs, xneg, &rhs);
    let den = magnitude::mul(&y.den, &x.den, usize::MAX);
    Rational::new(neg, num, den)
}

/// `y * x`.
pub fn mul(y: &Rational, x: &Rational) -> Result<Rational> {
    let num = magnitude::mul(&y.num, &x.num, usize::MAX);
    let den = magnitude::mul(&y.den, &x.den, usize::MAX);
    Rational::new(y.neg != x.neg, num, den)
}

/// `y / x`; dividing by an exact zero is an error.
pub fn div(y: &Rational, x: &Rational) -> Result<Rational> {
    if x.is_zero() {
        return Err(Error::ZeroDivide);
    }
    let num = magnitude::mul(&y.num, &x.den, usize::MAX);
    let den = magnitude::mul(&y.den, &x.num, usize::MAX);
    Rational::new(y.neg != x.neg, num, den)
}

/// Compare two rationals by cross-multiplication.
pub fn cmp(y: &Rational, x: &Rational) -> std::cmp::Ordering {
    match (y.neg, x.neg) {
        (true, false) if !y.is_zero() || !x.is_zero() => return std::cmp::Ordering::Less,
        (false, true) if !y.is_zero() || !x.is_zero() => return std::cmp::Ordering::Greater,
        _ => {}
    }
    let lhs = magnitude::mul(&y.num, &x.den, usize::MAX);
    let rhs = magnitude::mul(&x.num, &y.den, usize::MAX);
    let raw = magnitude::cmp(&lhs, &rhs);
    if y.neg {
        raw.reverse()
    } else {
        raw
    }
}

/// Integer power of a rational; negative exponents invert.
pub fn pow(y: &Rational, exponent: &Int, settings: &Settings) -> Result<Rational> {
    let max_bits = settings.maxbignum as usize;
    let num = magnitude::pow(&y.num, &exponent.mag, usize::MAX, max_bits)
        .ok_or(Error::NumberTooBig)?;
    let den = magnitude::pow(&y.den, &exponent.mag, usize::MAX, max_bits)
        .ok_or(Error::NumberTooBig)?;
    let neg = y.neg && !exponent.is_zero() && exponent.mag[0] & 1 == 1;
    if exponent.neg {
        if num.is_empty() {
            return Err(Error::ZeroDivide);
        }
        Rational::new(neg, den, num)
    } else {
        Rational::new(neg, num, den)
    }
}
