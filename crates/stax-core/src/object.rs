//! Byte-level object model.
//!
//! An object is a contiguous byte sequence: a LEB128 tag followed by a
//! tag-specific payload. This module knows every payload layout, so it can
//! compute an object's total size, expose typed views over payloads, and
//! append well-formed encodings to a byte buffer. It never allocates on the
//! object heap; the runtime crate does that.
//!
//! Layouts:
//! - `Integer`, `NegInteger`, `BasedInteger`: LEB128 magnitude.
//! - `Bignum`, `NegBignum`, `BasedBignum`: LEB128 length, then little-endian
//!   magnitude bytes with no trailing zero byte.
//! - `Symbol`, `Text`: LEB128 length, then UTF-8 bytes.
//! - `Decimal`: fixed payload (flags, exponent, coefficient).
//! - `Fraction` kinds, `Rectangular`, `Polar`: two embedded objects.
//! - `List`, `Array`, `Program`, `Expression`, `Funcall` and the loop
//!   kinds: LEB128 total body length, then concatenated embedded objects.
//! - Commands: tag only.

use crate::error::Error;
use crate::leb128::{read_uleb, uleb_size, write_uleb};
use crate::tag::Tag;

/// Fixed payload size of a `Decimal` object: one flags byte, a four-byte
/// little-endian exponent, a sixteen-byte little-endian coefficient.
pub const DECIMAL_PAYLOAD: usize = 21;

/// Read the tag of the object starting at `bytes[0]`.
pub fn tag_of(bytes: &[u8]) -> Result<Tag, Error> {
    let mut offset = 0;
    let raw = read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)?;
    u8::try_from(raw)
        .ok()
        .and_then(Tag::from_u8)
        .ok_or(Error::TypeMismatch)
}

/// Total size in bytes of the object starting at `bytes[0]`, tag included.
///
/// Size is recoverable from the tag alone: the payload parsing rules are
/// fixed per tag, so no external bookkeeping is needed.
pub fn size_of(bytes: &[u8]) -> Result<usize, Error> {
    let tag = tag_of(bytes)?;
    let mut offset = uleb_size(tag.as_u8() as u64);

    if tag.is_command() {
        return Ok(offset);
    }
    if tag.is_small_payload() {
        read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)?;
        return Ok(offset);
    }
    if tag.is_big_payload()
        || tag.is_sized_composite()
        || matches!(tag, Tag::Symbol | Tag::Text)
    {
        let len = read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)? as usize;
        let total = offset + len;
        if total > bytes.len() {
            return Err(Error::TypeMismatch);
        }
        return Ok(total);
    }
    match tag {
        Tag::Decimal => {
            let total = offset + DECIMAL_PAYLOAD;
            if total > bytes.len() {
                return Err(Error::TypeMismatch);
            }
            Ok(total)
        }
        // Two embedded children, sized recursively.
        Tag::Fraction
        | Tag::NegFraction
        | Tag::BigFraction
        | Tag::NegBigFraction
        | Tag::Rectangular
        | Tag::Polar => {
            let first = size_of(&bytes[offset..])?;
            let second = size_of(&bytes[offset + first..])?;
            Ok(offset + first + second)
        }
        _ => Err(Error::TypeMismatch),
    }
}

/// Split `bytes` into the first object and the remainder.
pub fn split_first(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let size = size_of(bytes)?;
    Ok(bytes.split_at(size))
}

/// Iterate over the objects concatenated in `body`.
pub fn objects(body: &[u8]) -> Objects<'_> {
    Objects { rest: body }
}

/// Iterator over concatenated embedded objects.
pub struct Objects<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Objects<'a> {
    type Item = Result<&'a [u8], Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match split_first(self.rest) {
            Ok((first, rest)) => {
                self.rest = rest;
                Some(Ok(first))
            }
            Err(e) => {
                self.rest = &[];
                Some(Err(e))
            }
        }
    }
}

/// Structural equality: byte equality of the serialized forms.
/// Sound because all constructors canonicalize.
pub fn same(a: &[u8], b: &[u8]) -> bool {
    match (size_of(a), size_of(b)) {
        (Ok(asize), Ok(bsize)) => asize == bsize && a[..asize] == b[..bsize],
        _ => false,
    }
}

// ============================================================================
//
//   Typed payload views
//
// ============================================================================

fn payload(bytes: &[u8], expect: impl Fn(Tag) -> bool) -> Result<(Tag, usize), Error> {
    let tag = tag_of(bytes)?;
    if !expect(tag) {
        return Err(Error::TypeMismatch);
    }
    Ok((tag, uleb_size(tag.as_u8() as u64)))
}

/// Magnitude of a small integer kind (sign is in the tag).
pub fn small_value(bytes: &[u8]) -> Result<u64, Error> {
    let (_, mut offset) = payload(bytes, Tag::is_small_payload)?;
    read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)
}

/// Little-endian magnitude bytes of a bignum kind.
pub fn big_magnitude(bytes: &[u8]) -> Result<&[u8], Error> {
    let (_, mut offset) = payload(bytes, Tag::is_big_payload)?;
    let len = read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)? as usize;
    bytes.get(offset..offset + len).ok_or(Error::TypeMismatch)
}

/// UTF-8 contents of a symbol or text object.
pub fn text_str(bytes: &[u8]) -> Result<&str, Error> {
    let (_, mut offset) = payload(bytes, |t| matches!(t, Tag::Symbol | Tag::Text))?;
    let len = read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)? as usize;
    let raw = bytes.get(offset..offset + len).ok_or(Error::TypeMismatch)?;
    core::str::from_utf8(raw).map_err(|_| Error::TypeMismatch)
}

/// Body of a length-prefixed composite (lists, programs, loops, ...).
pub fn body(bytes: &[u8]) -> Result<&[u8], Error> {
    let (_, mut offset) = payload(bytes, Tag::is_sized_composite)?;
    let len = read_uleb(bytes, &mut offset).ok_or(Error::TypeMismatch)? as usize;
    bytes.get(offset..offset + len).ok_or(Error::TypeMismatch)
}

/// The two embedded children of a fraction or complex object.
pub fn pair(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let (_, offset) = payload(bytes, |t| {
        t.is_fraction() || matches!(t, Tag::Rectangular | Tag::Polar)
    })?;
    let rest = &bytes[offset..];
    let first = size_of(rest)?;
    let second = size_of(&rest[first..])?;
    Ok((&rest[..first], &rest[first..first + second]))
}

/// Raw decimal payload: (flags, exponent, coefficient). Interpretation
/// belongs to the decimal adapter.
pub fn decimal_parts(bytes: &[u8]) -> Result<(u8, i32, u128), Error> {
    let (_, offset) = payload(bytes, |t| t == Tag::Decimal)?;
    let raw = bytes
        .get(offset..offset + DECIMAL_PAYLOAD)
        .ok_or(Error::TypeMismatch)?;
    let flags = raw[0];
    let exponent = i32::from_le_bytes([raw[1], raw[2], raw[3], raw[4]]);
    let mut coefficient = [0u8; 16];
    coefficient.copy_from_slice(&raw[5..21]);
    Ok((flags, exponent, u128::from_le_bytes(coefficient)))
}

// ============================================================================
//
//   Builders: append well-formed encodings to a byte buffer
//
// ============================================================================

pub mod build {
    use super::*;

    /// Append a bare tag (commands are exactly this).
    pub fn command(tag: Tag, out: &mut Vec<u8>) {
        write_uleb(tag.as_u8() as u64, out);
    }

    /// Append a small integer kind with an explicit tag.
    pub fn small(tag: Tag, magnitude: u64, out: &mut Vec<u8>) {
        debug_assert!(tag.is_small_payload());
        write_uleb(tag.as_u8() as u64, out);
        write_uleb(magnitude, out);
    }

    /// Append a signed machine integer, choosing the tag from the sign.
    pub fn integer(value: i64, out: &mut Vec<u8>) {
        if value < 0 {
            small(Tag::NegInteger, value.unsigned_abs(), out);
        } else {
            small(Tag::Integer, value as u64, out);
        }
    }

    /// Append a bignum kind. The magnitude must be canonical: little-endian
    /// with no trailing zero byte (zero is the empty magnitude).
    pub fn bignum(tag: Tag, magnitude: &[u8], out: &mut Vec<u8>) {
        debug_assert!(tag.is_big_payload());
        debug_assert!(magnitude.last() != Some(&0));
        write_uleb(tag.as_u8() as u64, out);
        write_uleb(magnitude.len() as u64, out);
        out.extend_from_slice(magnitude);
    }

    /// Append a symbol or text object.
    pub fn string(tag: Tag, contents: &str, out: &mut Vec<u8>) {
        debug_assert!(matches!(tag, Tag::Symbol | Tag::Text));
        write_uleb(tag.as_u8() as u64, out);
        write_uleb(contents.len() as u64, out);
        out.extend_from_slice(contents.as_bytes());
    }

    /// Append a length-prefixed composite from an already-built body.
    pub fn sized(tag: Tag, body: &[u8], out: &mut Vec<u8>) {
        debug_assert!(tag.is_sized_composite());
        write_uleb(tag.as_u8() as u64, out);
        write_uleb(body.len() as u64, out);
        out.extend_from_slice(body);
    }

    /// Append a two-child composite (fraction or complex).
    pub fn pair(tag: Tag, first: &[u8], second: &[u8], out: &mut Vec<u8>) {
        write_uleb(tag.as_u8() as u64, out);
        out.extend_from_slice(first);
        out.extend_from_slice(second);
    }

    /// Append a decimal object from its raw parts.
    pub fn decimal(flags: u8, exponent: i32, coefficient: u128, out: &mut Vec<u8>) {
        write_uleb(Tag::Decimal.as_u8() as u64, out);
        out.push(flags);
        out.extend_from_slice(&exponent.to_le_bytes());
        out.extend_from_slice(&coefficient.to_le_bytes());
    }
}
