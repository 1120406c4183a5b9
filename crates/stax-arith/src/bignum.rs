//! Integer objects: small, big and based, unified behind one value view.
//!
//! An [`Int`] is the sign-and-magnitude view of any integer kind. Reading
//! copies the magnitude out of the heap, so arithmetic never holds a heap
//! borrow across an allocation; writing re-canonicalizes: zero is the
//! positive small integer, anything fitting a machine word shrinks to the
//! small variant, everything else becomes a bignum. Based values mask to
//! the configured word size on every operation.

use std::cmp::Ordering;

use smallvec::SmallVec;
use stax_core::{object, Error, Result, Settings, Tag};
use stax_runtime::{ObjectId, Runtime};

use crate::magnitude::{self, Magnitude};

/// Sign-and-magnitude view of an integer of any kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Int {
    /// Negative sign; always false for based values and zero.
    pub neg: bool,
    /// Based (word-sized, unsigned) rather than signed.
    pub based: bool,
    pub mag: Magnitude,
}

impl Int {
    pub fn new(neg: bool, based: bool, mut mag: Magnitude) -> Self {
        magnitude::trim(&mut mag);
        let neg = neg && !mag.is_empty() && !based;
        Self { neg, based, mag }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value < 0, false, magnitude::from_u64(value.unsigned_abs()))
    }

    pub fn from_u64(value: u64) -> Self {
        Self::new(false, false, magnitude::from_u64(value))
    }

    pub fn based_from_u64(value: u64) -> Self {
        Self::new(false, true, magnitude::from_u64(value))
    }

    pub fn zero() -> Self {
        Self::new(false, false, Magnitude::new())
    }

    pub fn one() -> Self {
        Self::from_u64(1)
    }

    pub fn is_zero(&self) -> bool {
        self.mag.is_empty()
    }

    /// Signed machine-word value when it fits.
    pub fn to_i64(&self) -> Option<i64> {
        let raw = magnitude::to_u64(&self.mag)?;
        if self.neg {
            if raw > i64::MAX as u64 + 1 {
                return None;
            }
            Some((raw as i64).wrapping_neg())
        } else {
            i64::try_from(raw).ok()
        }
    }

    /// The object tag this value canonicalizes to.
    pub fn tag(&self) -> Tag {
        let small = magnitude::to_u64(&self.mag).is_some();
        match (self.based, self.neg, small) {
            (true, _, true) => Tag::BasedInteger,
            (true, _, false) => Tag::BasedBignum,
            (false, false, true) => Tag::Integer,
            (false, true, true) => Tag::NegInteger,
            (false, false, false) => Tag::Bignum,
            (false, true, false) => Tag::NegBignum,
        }
    }
}

/// Read any integer-kind object into its value view.
pub fn read_int(rt: &Runtime, id: ObjectId) -> Result<Int> {
    let bytes = rt.bytes(id);
    let tag = object::tag_of(bytes)?;
    let mag = match tag {
        Tag::Integer | Tag::NegInteger | Tag::BasedInteger => {
            magnitude::from_u64(object::small_value(bytes)?)
        }
        Tag::Bignum | Tag::NegBignum | Tag::BasedBignum => {
            SmallVec::from_slice(object::big_magnitude(bytes)?)
        }
        _ => return Err(Error::TypeMismatch),
    };
    Ok(Int::new(tag.is_negative(), tag.is_based(), mag))
}

/// Write a value view back as a canonical heap object.
pub fn make_int(rt: &mut Runtime, value: Int) -> Result<ObjectId> {
    match magnitude::to_u64(&value.mag) {
        Some(small) => rt.make_small(value.tag(), small),
        None => rt.make_bignum(value.tag(), &value.mag),
    }
}

fn based_result(y: &Int, x: &Int) -> bool {
    y.based || x.based
}

/// Byte limit for based results, `usize::MAX` for signed ones.
fn limit(based: bool, settings: &Settings) -> usize {
    if based {
        settings.word_bytes()
    } else {
        usize::MAX
    }
}

fn masked(mut value: Int, settings: &Settings) -> Int {
    if value.based {
        magnitude::mask(&mut value.mag, settings.wordsize as usize);
    }
    value
}

/// Compare two integers. Magnitude-only ignores signs.
pub fn cmp(x: &Int, y: &Int, magnitude_only: bool) -> Ordering {
    if !magnitude_only {
        match (x.neg, y.neg) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    let raw = magnitude::cmp(&x.mag, &y.mag);
    if !magnitude_only && x.neg {
        raw.reverse()
    } else {
        raw
    }
}

/// `y + x` or `y - x`, following the sign rules: equal effective signs add
/// magnitudes, opposite signs subtract the smaller from the larger and
/// take the larger's sign.
pub fn add_sub(y: &Int, x: &Int, subtract: bool, settings: &Settings) -> Int {
    let based = based_result(y, x);
    if based {
        // Two's-complement wrap inside the word.
        let w = settings.wordsize as usize;
        let rhs = if subtract {
            magnitude::negate(&x.mag, w)
        } else {
            x.mag.clone()
        };
        let mut sum = magnitude::add(&y.mag, &rhs);
        magnitude::mask(&mut sum, w);
        return Int::new(false, true, sum);
    }

    let xneg = x.neg != subtract;
    if y.neg == xneg {
        return Int::new(y.neg, false, magnitude::add(&y.mag, &x.mag));
    }
    match magnitude::cmp(&y.mag, &x.mag) {
        Ordering::Equal => Int::zero(),
        Ordering::Greater => Int::new(y.neg, false, magnitude::sub(&y.mag, &x.mag)),
        Ordering::Less => Int::new(xneg, false, magnitude::sub(&x.mag, &y.mag)),
    }
}

/// `y * x`, with the `maxbignum` guard checked before any work.
pub fn mul(y: &Int, x: &Int, settings: &Settings) -> Result<Int> {
    let needed = y.mag.len() + x.mag.len();
    if needed * 8 > settings.maxbignum as usize {
        return Err(Error::NumberTooBig);
    }
    let based = based_result(y, x);
    if y.is_zero() || x.is_zero() {
        let mut zero = Int::zero();
        zero.based = based;
        return Ok(zero);
    }
    let product = magnitude::mul(&y.mag, &x.mag, limit(based, settings));
    Ok(masked(
        Int::new(y.neg != x.neg, based, product),
        settings,
    ))
}

/// Quotient and remainder of `y / x` in one pass. The remainder keeps the
/// dividend's sign; the quotient takes the product sign.
pub fn quorem(y: &Int, x: &Int, settings: &Settings) -> Result<(Int, Int)> {
    if x.is_zero() {
        return Err(Error::ZeroDivide);
    }
    let based = based_result(y, x);
    let (q, r) = magnitude::quorem(&y.mag, &x.mag, limit(based, settings));
    let quotient = masked(Int::new(y.neg != x.neg, based, q), settings);
    let remainder = masked(Int::new(y.neg, based, r), settings);
    Ok((quotient, remainder))
}

/// Euclidean-style modulo: result carries the divisor's sign, matching
/// calculator `mod` (as opposed to `rem`, which keeps the dividend's).
pub fn modulo(y: &Int, x: &Int, settings: &Settings) -> Result<Int> {
    let (_, r) = quorem(y, x, settings)?;
    if r.is_zero() || r.neg == x.neg || r.based {
        Ok(r)
    } else {
        Ok(add_sub(&r, x, false, settings))
    }
}

/// `y ^ x` for an unsigned exponent; callers pre-handle negative
/// exponents (they become fractions or decimals upstream).
pub fn pow(y: &Int, x: &Int, settings: &Settings) -> Result<Int> {
    let based = y.based;
    let result = magnitude::pow(
        &y.mag,
        &x.mag,
        limit(based, settings),
        settings.maxbignum as usize,
    )
    .ok_or(Error::NumberTooBig)?;
    let neg = y.neg && !x.is_zero() && x.mag[0] & 1 == 1;
    Ok(masked(Int::new(neg, based, result), settings))
}

/// Negation: flip the sign tag, or `0 - x` within the word for based.
pub fn neg(x: &Int, settings: &Settings) -> Int {
    if x.based {
        let mag = magnitude::negate(&x.mag, settings.wordsize as usize);
        Int::new(false, true, mag)
    } else {
        Int::new(!x.neg, false, x.mag.clone())
    }
}

/// Logical not for signed values (zero becomes one), bitwise complement
/// within the word for based values.
pub fn not(x: &Int, settings: &Settings) -> Int {
    if x.based {
        let mag = magnitude::not(&x.mag, settings.wordsize as usize);
        Int::new(false, true, mag)
    } else if x.is_zero() {
        Int::one()
    } else {
        Int::zero()
    }
}

/// Bitwise and/or/xor; the result is based when either operand is.
pub fn bit_and(y: &Int, x: &Int, settings: &Settings) -> Int {
    masked(
        Int::new(false, based_result(y, x), magnitude::and(&y.mag, &x.mag)),
        settings,
    )
}

pub fn bit_or(y: &Int, x: &Int, settings: &Settings) -> Int {
    masked(
        Int::new(false, based_result(y, x), magnitude::or(&y.mag, &x.mag)),
        settings,
    )
}

pub fn bit_xor(y: &Int, x: &Int, settings: &Settings) -> Int {
    masked(
        Int::new(false, based_result(y, x), magnitude::xor(&y.mag, &x.mag)),
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    fn int(value: i64) -> Int {
        Int::from_i64(value)
    }

    fn based(value: u64) -> Int {
        Int::based_from_u64(value)
    }

    #[test]
    fn canonical_zero_is_positive() {
        let z = Int::new(true, false, Magnitude::new());
        assert!(!z.neg);
        assert_eq!(z.tag(), Tag::Integer);
    }

    #[test]
    fn object_roundtrip_small_and_big() {
        let mut rt = Runtime::new();
        for value in [0i64, 1, -1, 42, -1000, i64::MAX, i64::MIN + 1] {
            let id = make_int(&mut rt, int(value)).unwrap();
            let back = read_int(&rt, id).unwrap();
            assert_eq!(back.to_i64(), Some(value));
        }

        // Something past 64 bits becomes a bignum object.
        let wide = add_sub(
            &mul(&int(i64::MAX), &int(4), &settings()).unwrap(),
            &int(17),
            false,
            &settings(),
        );
        let id = make_int(&mut rt, wide.clone()).unwrap();
        assert_eq!(rt.tag(id), Tag::Bignum);
        assert_eq!(read_int(&rt, id).unwrap(), wide);
    }

    #[test]
    fn widening_on_overflow() {
        let s = settings();
        let sum = add_sub(&int(i64::MAX), &int(i64::MAX), false, &s);
        assert_eq!(sum.tag(), Tag::Bignum);
        let back = add_sub(&sum, &int(i64::MAX), true, &s);
        assert_eq!(back.to_i64(), Some(i64::MAX));
        assert_eq!(back.tag(), Tag::Integer);
    }

    #[test]
    fn add_sub_sign_rules() {
        let s = settings();
        assert_eq!(add_sub(&int(5), &int(3), false, &s).to_i64(), Some(8));
        assert_eq!(add_sub(&int(5), &int(-3), false, &s).to_i64(), Some(2));
        assert_eq!(add_sub(&int(-5), &int(3), false, &s).to_i64(), Some(-2));
        assert_eq!(add_sub(&int(3), &int(5), true, &s).to_i64(), Some(-2));
        assert_eq!(add_sub(&int(-3), &int(-5), true, &s).to_i64(), Some(2));
        assert_eq!(add_sub(&int(5), &int(5), true, &s).to_i64(), Some(0));
    }

    #[test]
    fn mul_signs_and_zero() {
        let s = settings();
        assert_eq!(mul(&int(6), &int(7), &s).unwrap().to_i64(), Some(42));
        assert_eq!(mul(&int(-6), &int(7), &s).unwrap().to_i64(), Some(-42));
        assert_eq!(mul(&int(-6), &int(-7), &s).unwrap().to_i64(), Some(42));
        let zero = mul(&int(0), &int(-7), &s).unwrap();
        assert!(zero.is_zero());
        assert!(!zero.neg);
    }

    #[test]
    fn mul_respects_maxbignum() {
        let mut s = settings();
        s.maxbignum = 64;
        let big = Int::new(false, false, magnitude::from_u64(u64::MAX));
        assert_eq!(mul(&big, &big, &s), Err(Error::NumberTooBig));
    }

    #[test]
    fn quorem_signs() {
        let s = settings();
        let (q, r) = quorem(&int(7), &int(2), &s).unwrap();
        assert_eq!(q.to_i64(), Some(3));
        assert_eq!(r.to_i64(), Some(1));

        let (q, r) = quorem(&int(-7), &int(2), &s).unwrap();
        assert_eq!(q.to_i64(), Some(-3));
        assert_eq!(r.to_i64(), Some(-1));

        let (q, r) = quorem(&int(7), &int(-2), &s).unwrap();
        assert_eq!(q.to_i64(), Some(-3));
        assert_eq!(r.to_i64(), Some(1));
    }

    #[test]
    fn zero_divide_is_an_error() {
        let s = settings();
        assert_eq!(quorem(&int(1), &int(0), &s), Err(Error::ZeroDivide));
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        let s = settings();
        assert_eq!(modulo(&int(7), &int(3), &s).unwrap().to_i64(), Some(1));
        assert_eq!(modulo(&int(-7), &int(3), &s).unwrap().to_i64(), Some(2));
        assert_eq!(modulo(&int(7), &int(-3), &s).unwrap().to_i64(), Some(-2));
        assert_eq!(modulo(&int(-7), &int(-3), &s).unwrap().to_i64(), Some(-1));
    }

    #[test]
    fn pow_basics() {
        let s = settings();
        assert_eq!(pow(&int(2), &int(10), &s).unwrap().to_i64(), Some(1024));
        assert_eq!(pow(&int(-2), &int(3), &s).unwrap().to_i64(), Some(-8));
        assert_eq!(pow(&int(-2), &int(4), &s).unwrap().to_i64(), Some(16));
        assert_eq!(pow(&int(9), &int(0), &s).unwrap().to_i64(), Some(1));
    }

    #[test]
    fn pow_number_too_big() {
        let mut s = settings();
        s.maxbignum = 128;
        assert_eq!(pow(&int(2), &int(1000), &s), Err(Error::NumberTooBig));
    }

    #[test]
    fn compare_with_signs() {
        assert_eq!(cmp(&int(-5), &int(3), false), Ordering::Less);
        assert_eq!(cmp(&int(3), &int(-5), false), Ordering::Greater);
        assert_eq!(cmp(&int(-3), &int(-5), false), Ordering::Greater);
        assert_eq!(cmp(&int(-5), &int(3), true), Ordering::Greater);
        assert_eq!(cmp(&int(4), &int(4), false), Ordering::Equal);
    }

    #[test]
    fn based_add_wraps() {
        let mut s = settings();
        s.wordsize = 8;
        let sum = add_sub(&based(0xFF), &based(1), false, &s);
        assert!(sum.is_zero());
        assert!(sum.based);

        let diff = add_sub(&based(0), &based(1), true, &s);
        assert_eq!(magnitude::to_u64(&diff.mag), Some(0xFF));
    }

    #[test]
    fn based_mul_masks() {
        let mut s = settings();
        s.wordsize = 8;
        let product = mul(&based(0x20), &based(0x10), &s).unwrap();
        assert!(product.is_zero());

        let product = mul(&based(0x12), &based(0x10), &s).unwrap();
        assert_eq!(magnitude::to_u64(&product.mag), Some(0x20));
    }

    #[test]
    fn based_not_and_neg() {
        let mut s = settings();
        s.wordsize = 8;
        assert_eq!(
            magnitude::to_u64(&not(&based(0xF0), &s).mag),
            Some(0x0F)
        );
        assert_eq!(
            magnitude::to_u64(&neg(&based(1), &s).mag),
            Some(0xFF)
        );
    }

    #[test]
    fn signed_logical_not() {
        let s = settings();
        assert_eq!(not(&int(0), &s).to_i64(), Some(1));
        assert_eq!(not(&int(42), &s).to_i64(), Some(0));
        assert_eq!(not(&int(-42), &s).to_i64(), Some(0));
    }

    #[test]
    fn xor_with_word_size_8() {
        let mut s = settings();
        s.wordsize = 8;
        let result = bit_xor(&based(0xFF), &based(0xF0), &s);
        assert_eq!(magnitude::to_u64(&result.mag), Some(0x0F));
        assert!(result.based);
    }

    #[test]
    fn based_tag_roundtrip() {
        let mut rt = Runtime::new();
        let id = make_int(&mut rt, based(0x1A3)).unwrap();
        assert_eq!(rt.tag(id), Tag::BasedInteger);
        let back = read_int(&rt, id).unwrap();
        assert!(back.based);
        assert_eq!(magnitude::to_u64(&back.mag), Some(0x1A3));
    }
}
