//! Expression bodies: linear postfix sequences of embedded objects.
//!
//! An expression object is a program whose body encodes postfix
//! evaluation: operands precede their operator, and every operator has a
//! fixed arity from the command table. The functions here discover the
//! structure of such a body (term spans, root operator, operand spans)
//! and build new bodies from parts. Everything is pure byte work; turning
//! a body into a heap object is a one-liner on the runtime.

use stax_core::object::{self, build};
use stax_core::{ops, Error, Result, Tag};
use stax_runtime::{ObjectId, Runtime};

/// Spans of the complete top-level terms in a postfix body, in order.
/// A well-formed expression body has exactly one.
pub fn term_spans(body: &[u8]) -> Result<Vec<(usize, usize)>> {
    let mut starts: Vec<usize> = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        let rest = &body[pos..];
        let size = object::size_of(rest)?;
        let tag = object::tag_of(rest)?;
        if tag.is_command() {
            let info = ops::by_tag(tag).ok_or(Error::TypeMismatch)?;
            let arity = info.arity as usize;
            if arity > starts.len() {
                return Err(Error::TypeMismatch);
            }
            let start = if arity == 0 {
                pos
            } else {
                starts[starts.len() - arity]
            };
            starts.truncate(starts.len() - arity);
            starts.push(start);
        } else {
            starts.push(pos);
        }
        pos += size;
    }
    let mut spans = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        spans.push((start, end));
    }
    Ok(spans)
}

/// A term is either a single embedded atom or an operator application.
#[derive(Debug)]
pub enum Term<'a> {
    Atom(&'a [u8]),
    Apply {
        op: Tag,
        /// Operand sub-terms, each a complete postfix body.
        args: Vec<&'a [u8]>,
    },
}

/// Decompose one complete term.
pub fn structure(term: &[u8]) -> Result<Term<'_>> {
    let spans = term_spans(term)?;
    if spans.len() != 1 {
        return Err(Error::TypeMismatch);
    }
    // The root is the last object in the term.
    let mut root_pos = 0;
    let mut pos = 0;
    while pos < term.len() {
        root_pos = pos;
        pos += object::size_of(&term[pos..])?;
    }
    let root_tag = object::tag_of(&term[root_pos..])?;
    if !root_tag.is_command() {
        return Ok(Term::Atom(term));
    }
    let info = ops::by_tag(root_tag).ok_or(Error::TypeMismatch)?;
    if info.arity == 0 {
        return Ok(Term::Apply {
            op: root_tag,
            args: Vec::new(),
        });
    }
    let operand_spans = term_spans(&term[..root_pos])?;
    if operand_spans.len() != info.arity as usize {
        return Err(Error::TypeMismatch);
    }
    Ok(Term::Apply {
        op: root_tag,
        args: operand_spans
            .iter()
            .map(|&(start, end)| &term[start..end])
            .collect(),
    })
}

/// Is this body a single well-formed term?
pub fn is_well_formed(body: &[u8]) -> bool {
    matches!(term_spans(body), Ok(spans) if spans.len() == 1)
}

// ============================================================================
//
//   Body builders
//
// ============================================================================

/// Postfix body holding one symbol.
pub fn sym(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    build::string(Tag::Symbol, name, &mut out);
    out
}

/// Postfix body holding one integer.
pub fn int(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    build::integer(value, &mut out);
    out
}

/// Apply a unary operator to a term.
pub fn unary(op: Tag, arg: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(arg.len() + 1);
    out.extend_from_slice(arg);
    build::command(op, &mut out);
    out
}

/// Apply a binary operator to two terms.
pub fn binary(op: Tag, left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(left.len() + right.len() + 1);
    out.extend_from_slice(left);
    out.extend_from_slice(right);
    build::command(op, &mut out);
    out
}

/// A complete funcall object: operands then the name symbol, wrapped in
/// `Funcall`. `f(x;y)` becomes the object `« x y f »`, with the arity
/// implied by the operands preceding the name. The result embeds as a
/// single atom inside an enclosing expression body.
pub fn funcall(name: &str, args: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for arg in args {
        body.extend_from_slice(arg);
    }
    build::string(Tag::Symbol, name, &mut body);
    let mut out = Vec::new();
    build::sized(Tag::Funcall, &body, &mut out);
    out
}

/// The algebraic content of an object: an expression's body, or the
/// object itself as a one-atom body. Funcalls stay atoms; their bodies
/// are whole argument sequences, not single terms.
pub fn quoted(bytes: &[u8]) -> Result<Vec<u8>> {
    let tag = object::tag_of(bytes)?;
    if tag == Tag::Expression {
        Ok(object::body(bytes)?.to_vec())
    } else {
        let size = object::size_of(bytes)?;
        Ok(bytes[..size].to_vec())
    }
}

/// Intern a body as an expression object.
pub fn make_expression(rt: &mut Runtime, body: &[u8]) -> Result<ObjectId> {
    debug_assert!(is_well_formed(body));
    rt.make_sized(Tag::Expression, body)
}

/// Body of an expression object, copied out of the heap.
pub fn read_expression(rt: &Runtime, id: ObjectId) -> Result<Vec<u8>> {
    let bytes = rt.bytes(id);
    let tag = object::tag_of(bytes)?;
    if !matches!(tag, Tag::Expression | Tag::Funcall) {
        return Err(Error::TypeMismatch);
    }
    Ok(object::body(bytes)?.to_vec())
}
