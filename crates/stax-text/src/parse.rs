//! Parsing text into tagged objects.
//!
//! The parser works on a UTF-8 buffer with a byte cursor and produces
//! complete object encodings as byte buffers; interning them on the heap
//! is the caller's one-liner. Failures carry the byte offset where
//! parsing stopped.
//!
//! Grammar sketch:
//! - `« … »` program, `{ … }` list, `[ … ]` array, `" … "` text,
//!   `' … '` algebraic expression (Pratt, postfix emitted directly).
//! - `#1A3h` based literals with optional base suffix b/o/d/h.
//! - Numbers become integers, bignums, or decimals (mark or exponent).
//! - `start … next|step`, `for v … next|step`, `do … until … end`,
//!   `while … repeat … end` build loop objects in program context.
//! - Anything else: a command by name, else a symbol.

use stax_core::object::build;
use stax_core::ops::{self, precedence};
use stax_core::{Error, Result, Settings, Tag};
use stax_runtime::{ObjectId, Runtime};

use stax_arith::{magnitude, Decimal, Magnitude};

/// Parse one object from `text`. Returns the object and the bytes consumed.
pub fn parse(rt: &mut Runtime, text: &str, settings: &Settings) -> Result<(ObjectId, usize)> {
    let mut parser = Parser::new(text, settings);
    let bytes = parser.parse_object()?;
    parser.skip_spaces();
    let id = rt.insert(&bytes)?;
    Ok((id, parser.pos))
}

/// Parse a whole source line into a program wrapping the sequence, the
/// form the evaluator runs directly: data objects (delimited programs
/// included) push themselves, commands execute.
pub fn parse_program(rt: &mut Runtime, text: &str, settings: &Settings) -> Result<ObjectId> {
    let mut parser = Parser::new(text, settings);
    let mut body = Vec::new();
    let mut any = false;
    loop {
        parser.skip_spaces();
        if parser.at_end() {
            break;
        }
        body.extend_from_slice(&parser.parse_object()?);
        any = true;
    }
    if !any {
        return Err(Error::InvalidSyntax { offset: parser.pos });
    }
    rt.make_sized(Tag::Program, &body)
}

/// Parse a whole source line: one object, or a program wrapping the
/// sequence when the line holds several.
pub fn parse_source(rt: &mut Runtime, text: &str, settings: &Settings) -> Result<ObjectId> {
    let mut parser = Parser::new(text, settings);
    let mut objects: Vec<Vec<u8>> = Vec::new();
    loop {
        parser.skip_spaces();
        if parser.at_end() {
            break;
        }
        objects.push(parser.parse_object()?);
    }
    match objects.len() {
        0 => Err(Error::InvalidSyntax { offset: parser.pos }),
        1 => rt.insert(&objects[0]),
        _ => {
            let mut body = Vec::new();
            for object in &objects {
                body.extend_from_slice(object);
            }
            rt.make_sized(Tag::Program, &body)
        }
    }
}

pub struct Parser<'a> {
    src: &'a str,
    pos: usize,
    settings: &'a Settings,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, settings: &'a Settings) -> Self {
        Self {
            src,
            pos: 0,
            settings,
        }
    }

    fn error(&self) -> Error {
        Error::InvalidSyntax { offset: self.pos }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    pub fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn is_operator_char(c: char) -> bool {
        matches!(c, '+' | '-' | '*' | '/' | '^' | '=' | '<' | '>' | '≠' | '≤' | '≥')
    }

    fn is_word_end(c: char) -> bool {
        c.is_whitespace()
            || Self::is_operator_char(c)
            || matches!(
                c,
                '«' | '»' | '{' | '}' | '[' | ']' | '(' | ')' | '\'' | '"' | '#' | ';' | '∡'
            )
    }

    /// Peek the next bare word without consuming it.
    fn peek_word(&self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| Self::is_word_end(c))
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn bump_word(&mut self) -> &'a str {
        let word = self.peek_word();
        self.pos += word.len();
        word
    }

    // ========================================================================
    //   Object grammar
    // ========================================================================

    /// Parse one complete object in program context.
    pub fn parse_object(&mut self) -> Result<Vec<u8>> {
        self.skip_spaces();
        let c = self.peek().ok_or(self.error())?;
        match c {
            '«' => {
                self.bump();
                let body = self.parse_sequence_until('»')?;
                Ok(sized(Tag::Program, &body))
            }
            '{' => {
                self.bump();
                let body = self.parse_sequence_until('}')?;
                Ok(sized(Tag::List, &body))
            }
            '[' => {
                self.bump();
                let body = self.parse_sequence_until(']')?;
                Ok(sized(Tag::Array, &body))
            }
            '"' => {
                self.bump();
                self.parse_text()
            }
            '\'' => {
                self.bump();
                let body = self.parse_expr(precedence::NONE)?;
                self.skip_spaces();
                self.expect('\'')?;
                Ok(wrap_expression(body))
            }
            '(' => {
                self.bump();
                self.parse_complex()
            }
            '#' => {
                self.bump();
                self.parse_based()
            }
            '-' if self.starts_number(1) => self.parse_number(),
            c if c.is_ascii_digit() => self.parse_number(),
            c if c == self.settings.decimal_mark && self.starts_number(0) => self.parse_number(),
            c if Self::is_operator_char(c) => {
                let token = self.bump_operator();
                let info = ops::by_name(token.as_str()).ok_or(self.error())?;
                Ok(command(info.tag))
            }
            _ => self.parse_word(),
        }
    }

    /// True when a number starts `after` bytes from the cursor.
    fn starts_number(&self, after: usize) -> bool {
        let rest = &self.src[self.pos + after..];
        match rest.chars().next() {
            Some(c) if c.is_ascii_digit() => true,
            Some(c) if c == self.settings.decimal_mark => rest
                .chars()
                .nth(1)
                .is_some_and(|next| next.is_ascii_digit()),
            _ => false,
        }
    }

    fn parse_sequence_until(&mut self, close: char) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        loop {
            self.skip_spaces();
            if self.eat(close) {
                return Ok(body);
            }
            if self.at_end() {
                return Err(self.error());
            }
            body.extend_from_slice(&self.parse_object()?);
        }
    }

    fn parse_text(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                let contents = &self.src[start..self.pos];
                self.bump();
                let mut out = Vec::new();
                build::string(Tag::Text, contents, &mut out);
                return Ok(out);
            }
            self.bump();
        }
        Err(self.error())
    }

    fn parse_complex(&mut self) -> Result<Vec<u8>> {
        let first = self.parse_object()?;
        self.skip_spaces();
        let polar = match self.peek() {
            Some(';') => false,
            Some('∡') => true,
            _ => return Err(self.error()),
        };
        self.bump();
        let second = self.parse_object()?;
        self.skip_spaces();
        self.expect(')')?;
        let tag = if polar { Tag::Polar } else { Tag::Rectangular };
        let mut out = Vec::new();
        stax_core::leb128::write_uleb(tag.as_u8() as u64, &mut out);
        out.extend_from_slice(&first);
        out.extend_from_slice(&second);
        Ok(out)
    }

    // ========================================================================
    //   Numbers
    // ========================================================================

    fn parse_number(&mut self) -> Result<Vec<u8>> {
        let neg = self.eat('-');
        let mut mag = Magnitude::new();
        let ten = magnitude::from_u64(10);
        let mut any = false;
        while let Some(c) = self.peek() {
            match c.to_digit(10) {
                Some(digit) => {
                    mag = magnitude::mul(&mag, &ten, usize::MAX);
                    mag = magnitude::add(&mag, &magnitude::from_u64(digit as u64));
                    any = true;
                    self.bump();
                }
                None => break,
            }
        }

        let has_fraction =
            self.peek() == Some(self.settings.decimal_mark) && self.starts_number(0);
        let has_exponent = matches!(self.peek(), Some(c) if c == self.settings.exponent_mark
            || c.to_ascii_uppercase() == self.settings.exponent_mark);
        let lone_mark = self.peek() == Some(self.settings.decimal_mark);

        if has_fraction || has_exponent || lone_mark {
            return self.parse_decimal_tail(neg, mag, any);
        }
        if !any {
            return Err(self.error());
        }
        // A slash straight into digits is a fraction literal: `3/4`.
        if self.peek() == Some('/') && self.starts_number(1) {
            let start = self.pos;
            self.bump();
            let mut den = Magnitude::new();
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
                den = magnitude::mul(&den, &ten, usize::MAX);
                den = magnitude::add(&den, &magnitude::from_u64(digit as u64));
                self.bump();
            }
            self.end_of_number()?;
            let value = stax_arith::Rational::new(neg, mag, den)
                .map_err(|_| Error::InvalidSyntax { offset: start })?;
            let mut out = Vec::new();
            stax_arith::fraction::encode(&value, &mut out);
            return Ok(out);
        }
        self.end_of_number()?;

        let mut out = Vec::new();
        match magnitude::to_u64(&mag) {
            Some(small) => build::small(
                if neg && small != 0 {
                    Tag::NegInteger
                } else {
                    Tag::Integer
                },
                small,
                &mut out,
            ),
            None => build::bignum(
                if neg { Tag::NegBignum } else { Tag::Bignum },
                &mag,
                &mut out,
            ),
        }
        Ok(out)
    }

    fn parse_decimal_tail(
        &mut self,
        neg: bool,
        int_mag: Magnitude,
        had_digits: bool,
    ) -> Result<Vec<u8>> {
        // Fold the integer digits into a u128 coefficient; excess
        // precision is rounded away by the decimal constructor.
        let mut overflow = 0i32;
        let mut coeff = magnitude_to_u128(&int_mag, &mut overflow);
        let mut exp = overflow;

        let mut any = had_digits;
        if self.eat(self.settings.decimal_mark) {
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
                if coeff < u128::MAX / 10 {
                    coeff = coeff * 10 + u128::from(digit);
                    exp -= 1;
                }
                any = true;
                self.bump();
            }
        }
        if !any {
            return Err(self.error());
        }
        if matches!(self.peek(), Some(c) if c.to_ascii_uppercase()
            == self.settings.exponent_mark.to_ascii_uppercase())
        {
            self.bump();
            let exp_neg = if self.eat('-') {
                true
            } else {
                self.eat('+');
                false
            };
            let mut value = 0i32;
            let mut digits = false;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
                value = value.saturating_mul(10).saturating_add(digit as i32);
                digits = true;
                self.bump();
            }
            if !digits {
                return Err(self.error());
            }
            exp += if exp_neg { -value } else { value };
        }
        self.end_of_number()?;

        let value = Decimal::new(neg, coeff, exp);
        let mut out = Vec::new();
        build::decimal(u8::from(value.neg), value.exp, value.coeff, &mut out);
        Ok(out)
    }

    fn end_of_number(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) if Self::is_word_end(c) => Ok(()),
            Some(_) => Err(self.error()),
        }
    }

    fn parse_based(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                token.push(c);
                self.bump();
            } else if c == '_' || c == self.settings.space_based {
                self.bump();
            } else {
                break;
            }
        }
        if token.is_empty() {
            return Err(Error::InvalidSyntax { offset: start });
        }

        // A trailing base letter wins when the digits before it fit that
        // base; otherwise the whole token uses the display base.
        let (digits, base) = match token.chars().last().map(|c| c.to_ascii_lowercase()) {
            Some(suffix) if token.len() > 1 && base_for_suffix(suffix).is_some() => {
                let base = base_for_suffix(suffix).unwrap_or(self.settings.base);
                let digits = &token[..token.len() - 1];
                if digits_fit(digits, base) {
                    (digits.to_string(), base)
                } else {
                    (token.clone(), self.settings.base)
                }
            }
            _ => (token.clone(), self.settings.base),
        };
        if !digits_fit(&digits, base) {
            return Err(Error::InvalidSyntax { offset: start });
        }

        let mut mag = Magnitude::new();
        let base_mag = magnitude::from_u64(base as u64);
        for c in digits.chars() {
            let digit = c.to_digit(base).ok_or(Error::InvalidSyntax { offset: start })?;
            mag = magnitude::mul(&mag, &base_mag, usize::MAX);
            mag = magnitude::add(&mag, &magnitude::from_u64(digit as u64));
        }
        magnitude::mask(&mut mag, self.settings.wordsize as usize);

        let mut out = Vec::new();
        match magnitude::to_u64(&mag) {
            Some(small) => build::small(Tag::BasedInteger, small, &mut out),
            None => build::bignum(Tag::BasedBignum, &mag, &mut out),
        }
        Ok(out)
    }

    // ========================================================================
    //   Words: loop constructs, commands, symbols
    // ========================================================================

    fn parse_word(&mut self) -> Result<Vec<u8>> {
        let word = self.peek_word();
        if word.is_empty() {
            return Err(self.error());
        }
        match word.to_ascii_lowercase().as_str() {
            "start" => {
                self.bump_word();
                self.parse_counted_loop(None)
            }
            "for" => {
                self.bump_word();
                self.skip_spaces();
                let name = self.bump_word();
                if name.is_empty() || !is_identifier(name) {
                    return Err(self.error());
                }
                self.parse_counted_loop(Some(name.to_string()))
            }
            "do" => {
                self.bump_word();
                let (body, _) = self.parse_until_keywords(&["until"])?;
                let (cond, _) = self.parse_until_keywords(&["end"])?;
                let mut loop_body = sized(Tag::Program, &cond);
                loop_body.extend_from_slice(&sized(Tag::Program, &body));
                Ok(sized(Tag::DoUntil, &loop_body))
            }
            "while" => {
                self.bump_word();
                let (cond, _) = self.parse_until_keywords(&["repeat"])?;
                let (body, _) = self.parse_until_keywords(&["end"])?;
                let mut loop_body = sized(Tag::Program, &cond);
                loop_body.extend_from_slice(&sized(Tag::Program, &body));
                Ok(sized(Tag::WhileRepeat, &loop_body))
            }
            "next" | "step" | "until" | "end" | "repeat" => Err(self.error()),
            _ => {
                self.bump_word();
                if let Some(info) = ops::by_name(word) {
                    Ok(command(info.tag))
                } else if is_identifier(word) {
                    let mut out = Vec::new();
                    build::string(Tag::Symbol, word, &mut out);
                    Ok(out)
                } else {
                    Err(self.error())
                }
            }
        }
    }

    fn parse_counted_loop(&mut self, variable: Option<String>) -> Result<Vec<u8>> {
        let (body, terminator) = self.parse_until_keywords(&["next", "step"])?;
        let stepped = terminator == "step";
        let tag = match (&variable, stepped) {
            (None, false) => Tag::StartNext,
            (None, true) => Tag::StartStep,
            (Some(_), false) => Tag::ForNext,
            (Some(_), true) => Tag::ForStep,
        };
        let mut loop_body = Vec::new();
        if let Some(name) = variable {
            build::string(Tag::Symbol, &name, &mut loop_body);
        }
        loop_body.extend_from_slice(&sized(Tag::Program, &body));
        Ok(sized(tag, &loop_body))
    }

    /// Parse objects until one of the stop keywords; returns the body and
    /// which keyword ended it.
    fn parse_until_keywords(&mut self, stops: &[&str]) -> Result<(Vec<u8>, String)> {
        let mut body = Vec::new();
        loop {
            self.skip_spaces();
            if self.at_end() {
                return Err(self.error());
            }
            let word = self.peek_word().to_ascii_lowercase();
            if stops.contains(&word.as_str()) {
                self.bump_word();
                return Ok((body, word));
            }
            body.extend_from_slice(&self.parse_object()?);
        }
    }

    fn bump_operator(&mut self) -> String {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if Self::is_operator_char(c) && token.len() < 2 {
                // Only `==` doubles up; every other operator is one char.
                if !token.is_empty() && !(token == "=" && c == '=') {
                    break;
                }
                token.push(c);
                self.bump();
            } else {
                break;
            }
        }
        token
    }

    // ========================================================================
    //   Algebraic expressions: Pratt parsing straight to postfix
    // ========================================================================

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Vec<u8>> {
        let mut lhs = self.parse_primary()?;
        loop {
            self.skip_spaces();
            let Some((info, consumed)) = self.peek_infix() else {
                break;
            };
            if info.precedence < min_precedence {
                break;
            }
            self.pos += consumed;
            let next_min = if info.right_assoc {
                info.precedence
            } else {
                info.precedence + 1
            };
            let rhs = self.parse_expr(next_min)?;
            lhs.extend_from_slice(&rhs);
            build::command(info.tag, &mut lhs);
        }
        Ok(lhs)
    }

    /// The infix operator at the cursor, if any, and its byte length.
    fn peek_infix(&self) -> Option<(&'static ops::OpInfo, usize)> {
        let c = self.peek()?;
        if Self::is_operator_char(c) {
            let rest = self.rest();
            if rest.starts_with("==") {
                return ops::by_symbol("=", 2).map(|info| (info, 2));
            }
            let token = &rest[..c.len_utf8()];
            let symbol = if token == "=" { "=" } else { token };
            return ops::by_symbol(symbol, 2).map(|info| (info, c.len_utf8()));
        }
        // Word operators: mod, rem.
        let word = self.peek_word();
        if !word.is_empty() {
            if let Some(info) = ops::by_symbol(word.to_ascii_lowercase().as_str(), 2) {
                if info.precedence != precedence::NONE && word.chars().all(|c| c.is_alphabetic())
                {
                    return Some((info, word.len()));
                }
            }
        }
        None
    }

    fn parse_primary(&mut self) -> Result<Vec<u8>> {
        self.skip_spaces();
        let c = self.peek().ok_or(self.error())?;
        match c {
            '(' => {
                self.bump();
                let inner = self.parse_expr(precedence::NONE)?;
                self.skip_spaces();
                self.expect(')')?;
                Ok(inner)
            }
            '-' => {
                self.bump();
                let operand = self.parse_expr(precedence::UNARY)?;
                let mut out = operand;
                build::command(Tag::Neg, &mut out);
                Ok(out)
            }
            '#' => {
                self.bump();
                self.parse_based()
            }
            c if c.is_ascii_digit() || (c == self.settings.decimal_mark && self.starts_number(0)) =>
            {
                self.parse_number()
            }
            c if c.is_alphabetic() || c == '_' => self.parse_algebraic_word(),
            _ => Err(self.error()),
        }
    }

    fn parse_algebraic_word(&mut self) -> Result<Vec<u8>> {
        let word = self.bump_word().to_string();
        self.skip_spaces();
        if !self.eat('(') {
            if !is_identifier(&word) {
                return Err(self.error());
            }
            let mut out = Vec::new();
            build::string(Tag::Symbol, &word, &mut out);
            return Ok(out);
        }

        // Function call: arguments separated by `;`.
        let mut args: Vec<Vec<u8>> = Vec::new();
        loop {
            args.push(self.parse_expr(precedence::NONE)?);
            self.skip_spaces();
            if self.eat(';') {
                continue;
            }
            self.expect(')')?;
            break;
        }

        if let Some(info) = ops::by_name(&word) {
            if info.arity as usize == args.len() {
                let mut out = Vec::new();
                for arg in &args {
                    out.extend_from_slice(arg);
                }
                build::command(info.tag, &mut out);
                return Ok(out);
            }
            return Err(self.error());
        }

        // Unknown name: a funcall object embedded as one atom.
        let arg_slices: Vec<&[u8]> = args.iter().map(|a| a.as_slice()).collect();
        Ok(stax_symbolic::expr::funcall(&word, &arg_slices))
    }
}

fn sized(tag: Tag, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    build::sized(tag, body, &mut out);
    out
}

fn command(tag: Tag) -> Vec<u8> {
    let mut out = Vec::new();
    build::command(tag, &mut out);
    out
}

/// An expression body becomes an `Expression` object, except that a body
/// holding exactly one funcall atom stays a bare funcall.
fn wrap_expression(body: Vec<u8>) -> Vec<u8> {
    if let Ok(tag) = stax_core::object::tag_of(&body) {
        if tag == Tag::Funcall {
            if let Ok(size) = stax_core::object::size_of(&body) {
                if size == body.len() {
                    return body;
                }
            }
        }
    }
    sized(Tag::Expression, &body)
}

fn base_for_suffix(suffix: char) -> Option<u32> {
    match suffix {
        'b' => Some(2),
        'o' => Some(8),
        'd' => Some(10),
        'h' => Some(16),
        _ => None,
    }
}

fn digits_fit(digits: &str, base: u32) -> bool {
    !digits.is_empty() && digits.chars().all(|c| c.to_digit(base).is_some())
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '→' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn magnitude_to_u128(mag: &Magnitude, overflow_exp: &mut i32) -> u128 {
    if mag.len() <= 16 {
        let mut value = 0u128;
        for (index, &byte) in mag.iter().enumerate() {
            value |= u128::from(byte) << (8 * index);
        }
        return value;
    }
    // Literals with more than 38 digits: shed low digits into the
    // exponent; the decimal constructor rounds the rest.
    let mut rest = mag.clone();
    let ten = magnitude::from_u64(10);
    while rest.len() > 16 {
        let (q, _) = magnitude::quorem(&rest, &ten, usize::MAX);
        rest = q;
        *overflow_exp += 1;
    }
    let mut value = 0u128;
    for (index, &byte) in rest.iter().enumerate() {
        value |= u128::from(byte) << (8 * index);
    }
    value
}
