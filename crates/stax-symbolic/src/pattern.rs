//! Pattern compilation and matching.
//!
//! A rule is a pair of expressions `(pattern, template)`. Compilation
//! walks the pattern once and tags every atom as a hole or a literal: a
//! symbol that is a single lowercase letter is a hole, anything else is
//! literal. Matching then never guesses; it consults the compiled kinds.
//!
//! Holes bind on first occurrence; a second occurrence requires byte
//! equality with the bound subject (sound because constructors
//! canonicalize). The numeric literals match by value, so the pattern
//! constant `1` matches a small integer or bignum one alike.

use smallvec::SmallVec;
use stax_core::object;
use stax_core::{Error, Result, Tag};

use crate::expr::{structure, term_spans, Term};

/// How one pattern atom matches.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AtomKind {
    /// Match anything, binding the hole name.
    Hole(char),
    /// Match an equal numeric value, any representation.
    Number,
    /// Match byte-for-byte.
    Literal,
}

/// A compiled rewrite rule.
#[derive(Clone, Debug)]
pub struct Rule {
    pattern: Vec<u8>,
    template: Vec<u8>,
    /// Atom kind per byte offset into `pattern`.
    kinds: Vec<(usize, AtomKind)>,
}

/// Hole bindings collected during a match.
pub type Bindings = SmallVec<[(char, Vec<u8>); 4]>;

/// Is this symbol name a hole by the naming convention?
pub fn is_hole_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_lowercase(),
        _ => false,
    }
}

impl Rule {
    /// Compile a pattern/template pair. Fails when either body is not a
    /// single well-formed term.
    pub fn compile(pattern: Vec<u8>, template: Vec<u8>) -> Result<Rule> {
        if term_spans(&pattern)?.len() != 1 || term_spans(&template)?.len() != 1 {
            return Err(Error::TypeMismatch);
        }
        let mut kinds = Vec::new();
        let mut pos = 0;
        while pos < pattern.len() {
            let rest = &pattern[pos..];
            let tag = object::tag_of(rest)?;
            if !tag.is_command() {
                let kind = if tag == Tag::Symbol {
                    let name = object::text_str(rest)?;
                    if is_hole_name(name) {
                        AtomKind::Hole(name.chars().next().unwrap_or('_'))
                    } else {
                        AtomKind::Literal
                    }
                } else if tag.is_numeric() {
                    AtomKind::Number
                } else {
                    AtomKind::Literal
                };
                kinds.push((pos, kind));
            }
            pos += object::size_of(rest)?;
        }
        Ok(Rule {
            pattern,
            template,
            kinds,
        })
    }

    fn kind_at(&self, offset: usize) -> AtomKind {
        self.kinds
            .iter()
            .find(|&&(pos, _)| pos == offset)
            .map(|&(_, kind)| kind)
            .unwrap_or(AtomKind::Literal)
    }

    /// Match a complete subject term against this rule's pattern.
    /// Returns the bindings on success.
    pub fn matches(&self, subject: &[u8]) -> Result<Option<Bindings>> {
        let mut binds = Bindings::new();
        if self.match_into(subject, &mut binds)? {
            Ok(Some(binds))
        } else {
            Ok(None)
        }
    }

    /// Full match entry point that reuses a bindings buffer.
    pub fn match_into(&self, subject: &[u8], binds: &mut Bindings) -> Result<bool> {
        binds.clear();
        self.match_term(subject, &self.pattern, binds)
    }

    /// Byte offset of a pattern subslice within the compiled pattern.
    fn pattern_offset(&self, slice: &[u8]) -> usize {
        slice.as_ptr() as usize - self.pattern.as_ptr() as usize
    }

    fn match_term(&self, subject: &[u8], pattern: &[u8], binds: &mut Bindings) -> Result<bool> {
        match structure(pattern)? {
            Term::Atom(atom) => {
                if let AtomKind::Hole(name) = self.kind_at(self.pattern_offset(atom)) {
                    if let Some((_, bound)) = binds.iter().find(|(n, _)| *n == name) {
                        return Ok(bound.as_slice() == subject);
                    }
                    binds.push((name, subject.to_vec()));
                    return Ok(true);
                }
                // Literal kinds only ever match a single subject atom.
                if object::size_of(subject) != Ok(subject.len()) {
                    return Ok(false);
                }
                match self.kind_at(self.pattern_offset(atom)) {
                    AtomKind::Number => numeric_equal(subject, atom),
                    _ => Ok(object::same(subject, atom)),
                }
            }
            Term::Apply { op, args } => {
                let subject_args = match structure(subject)? {
                    Term::Apply {
                        op: subject_op,
                        args: subject_args,
                    } if subject_op == op && subject_args.len() == args.len() => subject_args,
                    _ => return Ok(false),
                };
                for (sub, pat) in subject_args.iter().zip(args.iter()) {
                    if !self.match_term(sub, pat, binds)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Instantiate the template with bindings from a successful match.
    pub fn instantiate(&self, binds: &Bindings) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.template.len());
        let mut pos = 0;
        while pos < self.template.len() {
            let rest = &self.template[pos..];
            let size = object::size_of(rest)?;
            let tag = object::tag_of(rest)?;
            let mut spliced = false;
            if tag == Tag::Symbol {
                let name = object::text_str(rest)?;
                if is_hole_name(name) {
                    let hole = name.chars().next().unwrap_or('_');
                    let bound = binds
                        .iter()
                        .find(|(n, _)| *n == hole)
                        .ok_or(Error::UndefinedName)?;
                    out.extend_from_slice(&bound.1);
                    spliced = true;
                }
            }
            if !spliced {
                out.extend_from_slice(&rest[..size]);
            }
            pos += size;
        }
        Ok(out)
    }
}

/// Numeric equality across representations for integer kinds.
fn numeric_equal(subject: &[u8], pattern: &[u8]) -> Result<bool> {
    let subject_tag = match object::tag_of(subject) {
        Ok(tag) => tag,
        Err(_) => return Ok(false),
    };
    let pattern_tag = object::tag_of(pattern)?;
    if !subject_tag.is_integer() || !pattern_tag.is_integer() {
        // Only the integer kinds have two spellings of one value.
        return Ok(object::same(subject, pattern));
    }
    if subject_tag.is_negative() != pattern_tag.is_negative() {
        return Ok(false);
    }
    Ok(int_value(subject)? == int_value(pattern)?)
}

/// Magnitude of an integer atom as canonical little-endian bytes.
fn int_value(bytes: &[u8]) -> Result<stax_arith::Magnitude> {
    let tag = object::tag_of(bytes)?;
    let mag = match tag {
        Tag::Integer | Tag::NegInteger => {
            let mut mag = stax_arith::Magnitude::from_slice(
                &object::small_value(bytes)?.to_le_bytes(),
            );
            while mag.last() == Some(&0) {
                mag.pop();
            }
            mag
        }
        Tag::Bignum | Tag::NegBignum => {
            stax_arith::Magnitude::from_slice(object::big_magnitude(bytes)?)
        }
        _ => return Err(Error::TypeMismatch),
    };
    Ok(mag)
}
