//! Rendering objects back to text.
//!
//! One renderer drives every kind: numbers with digit grouping, based
//! numbers with their `#`/base-suffix notation, fractions as `num/den`,
//! expressions through a minimal-parentheses precedence walk, programs
//! and loops with their keyword syntax. Rendering very large bignums
//! polls the interrupt flag between digit chunks.

use smallvec::SmallVec;
use stax_core::object;
use stax_core::ops::{self, precedence};
use stax_core::{Error, Interrupt, Result, Settings, Tag};
use stax_runtime::{ObjectId, Runtime};

use stax_arith::{magnitude, Decimal, Magnitude};

/// Digits emitted between interrupt polls on huge numbers.
const DIGITS_PER_POLL: usize = 64;

/// Byte sink with the couple of put flavors the core needs.
pub struct Renderer<'a> {
    out: String,
    settings: &'a Settings,
    interrupt: Interrupt,
}

impl<'a> Renderer<'a> {
    pub fn new(settings: &'a Settings, interrupt: Interrupt) -> Self {
        Self {
            out: String::new(),
            settings,
            interrupt,
        }
    }

    pub fn put(&mut self, c: char) {
        self.out.push(c);
    }

    pub fn put_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Formatted output, the printf of this writer.
    pub fn put_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = self.out.write_fmt(args);
    }

    /// Command names go through the configured case style.
    pub fn put_command(&mut self, name: &str) {
        // Operator glyphs have no case to style.
        if name.chars().all(|c| !c.is_alphabetic()) {
            self.out.push_str(name);
        } else {
            let styled = self.settings.command_case.apply(name);
            self.out.push_str(&styled);
        }
    }

    pub fn text(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

/// Render a heap object to a string.
pub fn render(rt: &Runtime, id: ObjectId, settings: &Settings) -> Result<String> {
    render_with_interrupt(rt, id, settings, Interrupt::new())
}

pub fn render_with_interrupt(
    rt: &Runtime,
    id: ObjectId,
    settings: &Settings,
    interrupt: Interrupt,
) -> Result<String> {
    let bytes = rt.object_vec(id);
    let mut renderer = Renderer::new(settings, interrupt);
    render_object(&bytes, &mut renderer)?;
    Ok(renderer.into_string())
}

/// Render one object encoding (embedded or top-level).
pub fn render_object(bytes: &[u8], r: &mut Renderer) -> Result<()> {
    let tag = object::tag_of(bytes)?;
    match tag {
        Tag::Integer | Tag::NegInteger | Tag::Bignum | Tag::NegBignum => {
            let value = int_view(bytes)?;
            if tag.is_negative() {
                r.put('-');
            }
            put_magnitude(&value, 10, r.settings.spacing_mantissa, r.settings.space, r)?;
        }
        Tag::BasedInteger | Tag::BasedBignum => {
            let value = int_view(bytes)?;
            r.put('#');
            let base = r.settings.base;
            put_magnitude(&value, base, r.settings.spacing_based, r.settings.space_based, r)?;
            r.put(base_suffix(base));
        }
        Tag::Fraction | Tag::NegFraction | Tag::BigFraction | Tag::NegBigFraction => {
            if tag.is_negative() {
                r.put('-');
            }
            let (num, den) = object::pair(bytes)?;
            render_object(num, r)?;
            r.put('/');
            render_object(den, r)?;
        }
        Tag::Decimal => put_decimal(bytes, r)?,
        Tag::Symbol => r.put_str(object::text_str(bytes)?),
        Tag::Text => {
            r.put('"');
            r.put_str(object::text_str(bytes)?);
            r.put('"');
        }
        Tag::Rectangular | Tag::Polar => {
            let (first, second) = object::pair(bytes)?;
            r.put('(');
            render_object(first, r)?;
            r.put(if tag == Tag::Polar { '∡' } else { ';' });
            render_object(second, r)?;
            r.put(')');
        }
        Tag::List => put_sequence(bytes, "{ ", "}", r)?,
        Tag::Array => put_sequence(bytes, "[ ", "]", r)?,
        Tag::Program => put_sequence(bytes, "« ", "»", r)?,
        Tag::Expression => {
            r.put('\'');
            render_algebraic(object::body(bytes)?, r)?;
            r.put('\'');
        }
        Tag::Funcall => {
            r.put('\'');
            render_funcall(bytes, r)?;
            r.put('\'');
        }
        _ if tag.is_loop() => put_loop(tag, bytes, r)?,
        _ if tag.is_command() => {
            let info = ops::by_tag(tag).ok_or(Error::TypeMismatch)?;
            r.put_command(info.name);
        }
        _ => return Err(Error::Unimplemented),
    }
    Ok(())
}

fn int_view(bytes: &[u8]) -> Result<Magnitude> {
    let tag = object::tag_of(bytes)?;
    if tag.is_small_payload() {
        Ok(magnitude::from_u64(object::small_value(bytes)?))
    } else {
        Ok(SmallVec::from_slice(object::big_magnitude(bytes)?))
    }
}

fn base_suffix(base: u32) -> char {
    match base {
        2 => 'b',
        8 => 'o',
        16 => 'h',
        _ => 'd',
    }
}

/// Emit a magnitude in a base, least-significant digit first with group
/// separators, then flip the digits into place.
fn put_magnitude(
    mag: &Magnitude,
    base: u32,
    spacing: u32,
    space: char,
    r: &mut Renderer,
) -> Result<()> {
    if mag.is_empty() {
        r.put('0');
        return Ok(());
    }
    let base_mag = magnitude::from_u64(base as u64);
    let mut rest: Magnitude = mag.clone();
    let mut digits: Vec<char> = Vec::new();
    let mut in_group = 0;
    let mut since_poll = 0;
    while !rest.is_empty() {
        let (quotient, remainder) = magnitude::quorem(&rest, &base_mag, usize::MAX);
        let digit = magnitude::to_u64(&remainder).unwrap_or(0) as u32;
        let c = char::from_digit(digit, base).ok_or(Error::ValueOutOfRange)?;
        digits.push(c.to_ascii_uppercase());
        rest = quotient;

        in_group += 1;
        if spacing != 0 && in_group == spacing && !rest.is_empty() {
            digits.push(space);
            in_group = 0;
        }
        since_poll += 1;
        if since_poll == DIGITS_PER_POLL {
            r.interrupt.check()?;
            since_poll = 0;
        }
    }
    for c in digits.iter().rev() {
        r.put(*c);
    }
    Ok(())
}

fn put_decimal(bytes: &[u8], r: &mut Renderer) -> Result<()> {
    let (flags, exp, coeff) = object::decimal_parts(bytes)?;
    let value = Decimal::new(flags & 1 != 0, coeff, exp);
    if value.neg {
        r.put('-');
    }
    let digits = value.coeff.to_string();
    let count = digits.len() as i32;
    // Scientific exponent of the leading digit.
    let leading = value.exp + count - 1;

    if value.is_zero() {
        r.put('0');
        r.put(r.settings.decimal_mark);
        return Ok(());
    }
    if value.exp >= 0 && leading <= 20 {
        // Whole value: digits, trailing zeros, and the mark that keeps
        // it distinct from an exact integer.
        put_grouped_int(&digits, value.exp as usize, r);
        r.put(r.settings.decimal_mark);
    } else if (-20..0).contains(&value.exp) && leading >= 0 {
        let point = (count + value.exp) as usize;
        put_grouped_int(&digits[..point], 0, r);
        r.put(r.settings.decimal_mark);
        put_grouped_fraction(&digits[point..], r);
    } else if (-26..0).contains(&leading) {
        // Small value: 0.000dddd
        r.put('0');
        r.put(r.settings.decimal_mark);
        for _ in leading + 1..0 {
            r.put('0');
        }
        put_grouped_fraction(&digits, r);
    } else {
        // Scientific notation; the mark always follows the lead digit.
        r.put_str(&digits[..1]);
        r.put(r.settings.decimal_mark);
        r.put_str(&digits[1..]);
        r.put(r.settings.exponent_mark);
        r.put_fmt(format_args!("{leading}"));
    }
    Ok(())
}

/// Integer digits most-significant first with mantissa grouping.
fn put_grouped_int(digits: &str, extra_zeros: usize, r: &mut Renderer) {
    let spacing = r.settings.spacing_mantissa as usize;
    let total = digits.len() + extra_zeros;
    let all: Vec<char> = digits
        .chars()
        .chain(std::iter::repeat('0').take(extra_zeros))
        .collect();
    for (index, c) in all.iter().enumerate() {
        let remaining = total - index;
        r.put(*c);
        if spacing != 0 && remaining > 1 && (remaining - 1) % spacing == 0 {
            r.put(r.settings.space);
        }
    }
}

/// Fraction digits with fraction grouping, counted from the mark.
fn put_grouped_fraction(digits: &str, r: &mut Renderer) {
    let spacing = r.settings.spacing_fraction as usize;
    for (index, c) in digits.chars().enumerate() {
        if spacing != 0 && index != 0 && index % spacing == 0 {
            r.put(r.settings.space);
        }
        r.put(c);
    }
}

fn put_sequence(bytes: &[u8], open: &str, close: &str, r: &mut Renderer) -> Result<()> {
    r.put_str(open);
    for child in object::objects(object::body(bytes)?) {
        render_object(child?, r)?;
        r.put(' ');
    }
    r.put_str(close);
    Ok(())
}

/// Loops render with their keyword skeleton; counted bounds live on the
/// stack, so only the variable (if any) and the sub-programs appear.
fn put_loop(tag: Tag, bytes: &[u8], r: &mut Renderer) -> Result<()> {
    let body = object::body(bytes)?;
    let children: Vec<&[u8]> = object::objects(body).collect::<Result<_>>()?;
    let put_body = |r: &mut Renderer, child: &[u8]| -> Result<()> {
        // Sub-programs print bare, without their « » frame.
        for item in object::objects(object::body(child)?) {
            r.put(' ');
            render_object(item?, r)?;
        }
        Ok(())
    };
    match tag {
        Tag::StartNext | Tag::StartStep => {
            r.put_command("start");
            put_body(r, children.first().ok_or(Error::TypeMismatch)?)?;
            r.put(' ');
            r.put_command(if tag == Tag::StartNext { "next" } else { "step" });
        }
        Tag::ForNext | Tag::ForStep => {
            let (name, body) = match children.as_slice() {
                [name, body] => (name, body),
                _ => return Err(Error::TypeMismatch),
            };
            r.put_command("for");
            r.put(' ');
            r.put_str(object::text_str(name)?);
            put_body(r, body)?;
            r.put(' ');
            r.put_command(if tag == Tag::ForNext { "next" } else { "step" });
        }
        Tag::DoUntil => {
            let (cond, body) = match children.as_slice() {
                [cond, body] => (cond, body),
                _ => return Err(Error::TypeMismatch),
            };
            r.put_command("do");
            put_body(r, body)?;
            r.put(' ');
            r.put_command("until");
            put_body(r, cond)?;
            r.put(' ');
            r.put_command("end");
        }
        Tag::WhileRepeat => {
            let (cond, body) = match children.as_slice() {
                [cond, body] => (cond, body),
                _ => return Err(Error::TypeMismatch),
            };
            r.put_command("while");
            put_body(r, cond)?;
            r.put(' ');
            r.put_command("repeat");
            put_body(r, body)?;
            r.put(' ');
            r.put_command("end");
        }
        _ => return Err(Error::TypeMismatch),
    }
    Ok(())
}

// ============================================================================
//
//   Algebraic rendering: precedence walk with minimal parentheses
//
// ============================================================================

/// Render a postfix expression body in infix notation.
pub fn render_algebraic(body: &[u8], r: &mut Renderer) -> Result<()> {
    render_term(body, precedence::NONE, r)
}

fn render_term(term: &[u8], required: u8, r: &mut Renderer) -> Result<()> {
    use stax_symbolic::expr::{structure, Term};
    match structure(term).map_err(|_| Error::TypeMismatch)? {
        Term::Atom(atom) => {
            let tag = object::tag_of(atom)?;
            match tag {
                Tag::Funcall => render_funcall(atom, r)?,
                Tag::Expression => render_term(object::body(atom)?, required, r)?,
                _ => render_object(atom, r)?,
            }
            Ok(())
        }
        Term::Apply { op, args } => {
            let info = ops::by_tag(op).ok_or(Error::TypeMismatch)?;
            let prec = info.precedence;
            let parens = prec != precedence::FUNCTION && prec < required;
            if parens {
                r.put('(');
            }
            match (info.arity, info.symbol) {
                (1, Some("-")) => {
                    r.put('-');
                    render_term(args[0], precedence::UNARY + 1, r)?;
                }
                (1, _) => {
                    r.put_command(info.name);
                    r.put('(');
                    render_term(args[0], precedence::NONE, r)?;
                    r.put(')');
                }
                (2, Some(symbol)) => {
                    let (left_req, right_req) = if info.right_assoc {
                        (prec + 1, prec)
                    } else {
                        (prec, prec + 1)
                    };
                    render_term(args[0], left_req, r)?;
                    if symbol.chars().any(|c| c.is_alphabetic()) {
                        r.put(' ');
                        r.put_command(symbol);
                        r.put(' ');
                    } else {
                        r.put_str(symbol);
                    }
                    render_term(args[1], right_req, r)?;
                }
                _ => {
                    // Commands without algebraic notation fall back to a
                    // prefix call so nothing is unprintable.
                    r.put_command(info.name);
                    r.put('(');
                    for (index, arg) in args.iter().enumerate() {
                        if index != 0 {
                            r.put(';');
                        }
                        render_term(arg, precedence::NONE, r)?;
                    }
                    r.put(')');
                }
            }
            if parens {
                r.put(')');
            }
            Ok(())
        }
    }
}

/// `f(x;y)` from a funcall object: operands then the name symbol.
fn render_funcall(bytes: &[u8], r: &mut Renderer) -> Result<()> {
    let body = object::body(bytes)?;
    let spans = stax_symbolic::expr::term_spans(body).map_err(|_| Error::TypeMismatch)?;
    let (name_span, arg_spans) = spans.split_last().ok_or(Error::TypeMismatch)?;
    let name = &body[name_span.0..name_span.1];
    r.put_str(object::text_str(name)?);
    r.put('(');
    for (index, &(start, end)) in arg_spans.iter().enumerate() {
        if index != 0 {
            r.put(';');
        }
        render_term(&body[start..end], precedence::NONE, r)?;
    }
    r.put(')');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stax_symbolic::expr::{binary, int, sym, unary};

    fn rt_render(build: impl FnOnce(&mut Runtime) -> ObjectId) -> String {
        let mut rt = Runtime::new();
        let id = build(&mut rt);
        render(&rt, id, &Settings::default()).unwrap()
    }

    #[test]
    fn integers() {
        assert_eq!(rt_render(|rt| rt.make_integer(0).unwrap()), "0");
        assert_eq!(rt_render(|rt| rt.make_integer(42).unwrap()), "42");
        assert_eq!(rt_render(|rt| rt.make_integer(-42).unwrap()), "-42");
    }

    #[test]
    fn big_integers() {
        let mut rt = Runtime::new();
        // 2^64 = 18446744073709551616
        let id = rt
            .make_bignum(Tag::Bignum, &[0, 0, 0, 0, 0, 0, 0, 0, 1])
            .unwrap();
        assert_eq!(
            render(&rt, id, &Settings::default()).unwrap(),
            "18446744073709551616"
        );
    }

    #[test]
    fn digit_grouping() {
        let mut rt = Runtime::new();
        let mut settings = Settings::default();
        settings.spacing_mantissa = 3;
        settings.space = '_';
        let id = rt.make_integer(1234567).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "1_234_567");
    }

    #[test]
    fn based_numbers() {
        let mut rt = Runtime::new();
        let settings = Settings::default();
        let id = rt.make_small(Tag::BasedInteger, 0xF).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "#Fh");

        let mut octal = settings.clone();
        octal.base = 8;
        let id = rt.make_small(Tag::BasedInteger, 0o755).unwrap();
        assert_eq!(render(&rt, id, &octal).unwrap(), "#755o");

        let mut binary = settings.clone();
        binary.base = 2;
        binary.spacing_based = 4;
        binary.space_based = '_';
        let id = rt.make_small(Tag::BasedInteger, 0b10110).unwrap();
        assert_eq!(render(&rt, id, &binary).unwrap(), "#1_0110b");
    }

    #[test]
    fn fractions() {
        let mut rt = Runtime::new();
        let r = stax_arith::Rational::new(
            true,
            stax_arith::magnitude::from_u64(3),
            stax_arith::magnitude::from_u64(4),
        )
        .unwrap();
        let id = stax_arith::make_rational(&mut rt, r).unwrap();
        assert_eq!(render(&rt, id, &Settings::default()).unwrap(), "-3/4");
    }

    #[test]
    fn decimals() {
        let mut rt = Runtime::new();
        let cases = [
            (Decimal::new(false, 25, -1), "2.5"),
            (Decimal::new(true, 15, -1), "-1.5"),
            (Decimal::new(false, 1, 0), "1."),
            (Decimal::new(false, 5, -3), "0.005"),
            (Decimal::new(false, 123, 10), "1230000000000."),
            (Decimal::new(false, 1, 40), "1.E40"),
            (Decimal::new(false, 123, -40), "1.23E-38"),
        ];
        for (value, expected) in cases {
            let id = stax_arith::make_decimal(&mut rt, value).unwrap();
            assert_eq!(render(&rt, id, &Settings::default()).unwrap(), expected);
        }
    }

    #[test]
    fn text_and_symbols() {
        assert_eq!(rt_render(|rt| rt.make_symbol("xyz").unwrap()), "xyz");
        assert_eq!(
            rt_render(|rt| rt.make_text("hello world").unwrap()),
            "\"hello world\""
        );
    }

    #[test]
    fn lists_and_programs() {
        let mut rt = Runtime::new();
        let mut body = Vec::new();
        object::build::integer(1, &mut body);
        object::build::integer(2, &mut body);
        object::build::command(Tag::Add, &mut body);
        let list = rt.make_sized(Tag::List, &body).unwrap();
        assert_eq!(render(&rt, list, &Settings::default()).unwrap(), "{ 1 2 + }");
        let prog = rt.make_sized(Tag::Program, &body).unwrap();
        assert_eq!(render(&rt, prog, &Settings::default()).unwrap(), "« 1 2 + »");
    }

    #[test]
    fn empty_list() {
        let mut rt = Runtime::new();
        let list = rt.make_sized(Tag::List, &[]).unwrap();
        assert_eq!(render(&rt, list, &Settings::default()).unwrap(), "{ }");
    }

    #[test]
    fn expression_minimal_parens() {
        let mut rt = Runtime::new();
        let settings = Settings::default();

        // x+y*z needs no parentheses
        let body = binary(
            Tag::Add,
            &sym("x"),
            &binary(Tag::Mul, &sym("y"), &sym("z")),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'x+y*z'");

        // (x+y)*z does
        let body = binary(
            Tag::Mul,
            &binary(Tag::Add, &sym("x"), &sym("y")),
            &sym("z"),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'(x+y)*z'");
    }

    #[test]
    fn expression_associativity_parens() {
        let mut rt = Runtime::new();
        let settings = Settings::default();

        // a-(b-c) keeps the parentheses, (a-b)-c drops them
        let body = binary(
            Tag::Sub,
            &sym("a"),
            &binary(Tag::Sub, &sym("b"), &sym("c")),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'a-(b-c)'");

        let body = binary(
            Tag::Sub,
            &binary(Tag::Sub, &sym("a"), &sym("b")),
            &sym("c"),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'a-b-c'");

        // Power is right-associative: a^(b^c) drops, (a^b)^c keeps.
        let body = binary(
            Tag::Pow,
            &sym("a"),
            &binary(Tag::Pow, &sym("b"), &sym("c")),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'a^b^c'");

        let body = binary(
            Tag::Pow,
            &binary(Tag::Pow, &sym("a"), &sym("b")),
            &sym("c"),
        );
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'(a^b)^c'");
    }

    #[test]
    fn expression_functions_and_neg() {
        let mut rt = Runtime::new();
        let settings = Settings::default();

        let body = unary(Tag::Sin, &binary(Tag::Add, &sym("x"), &int(1)));
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'sin(x+1)'");

        let body = unary(Tag::Neg, &binary(Tag::Add, &sym("x"), &int(1)));
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'-(x+1)'");

        let body = unary(Tag::Neg, &sym("x"));
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(render(&rt, id, &settings).unwrap(), "'-x'");
    }

    #[test]
    fn expression_word_operators() {
        let mut rt = Runtime::new();
        let body = binary(Tag::Mod, &sym("a"), &sym("b"));
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(
            render(&rt, id, &Settings::default()).unwrap(),
            "'a mod b'"
        );
    }

    #[test]
    fn funcall_rendering() {
        let mut rt = Runtime::new();
        let call = stax_symbolic::expr::funcall("f", &[&sym("x"), &int(2)]);
        let body = binary(Tag::Add, &call, &int(1));
        let id = stax_symbolic::make_expression(&mut rt, &body).unwrap();
        assert_eq!(
            render(&rt, id, &Settings::default()).unwrap(),
            "'f(x;2)+1'"
        );
    }

    #[test]
    fn command_case_styles() {
        let mut rt = Runtime::new();
        let mut settings = Settings::default();
        let dup = rt.make_command(Tag::Dup).unwrap();
        assert_eq!(render(&rt, dup, &settings).unwrap(), "dup");
        settings.command_case = stax_core::CaseStyle::Upper;
        assert_eq!(render(&rt, dup, &settings).unwrap(), "DUP");
        settings.command_case = stax_core::CaseStyle::Capitalized;
        assert_eq!(render(&rt, dup, &settings).unwrap(), "Dup");
    }

    #[test]
    fn complex_rendering() {
        let mut rt = Runtime::new();
        let re = rt.make_integer(1).unwrap();
        let im = rt.make_integer(2).unwrap();
        let z = rt.make_pair(Tag::Rectangular, re, im).unwrap();
        assert_eq!(render(&rt, z, &Settings::default()).unwrap(), "(1;2)");

        let z = rt.make_pair(Tag::Polar, re, im).unwrap();
        assert_eq!(render(&rt, z, &Settings::default()).unwrap(), "(1∡2)");
    }

    #[test]
    fn interrupt_stops_huge_renders() {
        let mut rt = Runtime::new();
        // A bignum with hundreds of digits.
        let mag: Vec<u8> = (0..128).map(|i| (i as u8).wrapping_mul(37) | 1).collect();
        let id = rt.make_bignum(Tag::Bignum, &mag).unwrap();
        let flag = Interrupt::new();
        flag.raise();
        let err =
            render_with_interrupt(&rt, id, &Settings::default(), flag).unwrap_err();
        assert_eq!(err, Error::Interrupted);
    }

    #[test]
    fn loop_rendering() {
        let mut rt = Runtime::new();
        // body program « i »
        let mut prog_body = Vec::new();
        object::build::string(Tag::Symbol, "i", &mut prog_body);
        let mut program = Vec::new();
        object::build::sized(Tag::Program, &prog_body, &mut program);

        let mut name = Vec::new();
        object::build::string(Tag::Symbol, "i", &mut name);

        let mut loop_body = Vec::new();
        loop_body.extend_from_slice(&name);
        loop_body.extend_from_slice(&program);
        let id = rt.make_sized(Tag::ForNext, &loop_body).unwrap();
        assert_eq!(
            render(&rt, id, &Settings::default()).unwrap(),
            "for i i next"
        );

        let mut loop_body = Vec::new();
        loop_body.extend_from_slice(&program);
        let id = rt.make_sized(Tag::StartNext, &loop_body).unwrap();
        assert_eq!(render(&rt, id, &Settings::default()).unwrap(), "start i next");
    }
}
