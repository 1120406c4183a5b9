//! Operator and command metadata.
//!
//! One table drives the whole pipeline: the program parser looks commands
//! up by name, the algebraic parser and renderer use arity, precedence and
//! associativity, and the evaluator trusts the arity when popping
//! arguments. The table is complete for every command tag; keeping it in
//! one place keeps dispatch and the tag set in step.

use crate::tag::Tag;

/// Rendering case for command names.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub enum CaseStyle {
    /// `dup`, `sin`
    #[default]
    Lower,
    /// `DUP`, `SIN`
    Upper,
    /// `Dup`, `Sin`
    Capitalized,
}

impl CaseStyle {
    /// Apply this style to a canonical (lowercase) command name.
    pub fn apply(self, name: &str) -> String {
        match self {
            CaseStyle::Lower => name.to_string(),
            CaseStyle::Upper => name.to_uppercase(),
            CaseStyle::Capitalized => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// Precedence levels for algebraic rendering and parsing.
/// Higher binds tighter; `NONE` marks non-algebraic commands.
pub mod precedence {
    pub const NONE: u8 = 0;
    pub const RELATIONAL: u8 = 3;
    pub const ADDITIVE: u8 = 5;
    pub const MULTIPLICATIVE: u8 = 7;
    pub const UNARY: u8 = 9;
    pub const POWER: u8 = 11;
    /// Atoms and function calls never need parentheses.
    pub const FUNCTION: u8 = 15;
}

/// Metadata for one command tag.
#[derive(Copy, Clone, Debug)]
pub struct OpInfo {
    pub tag: Tag,
    /// Canonical name as parsed and rendered in program bodies.
    pub name: &'static str,
    /// Infix/prefix notation inside algebraic expressions, when one exists.
    pub symbol: Option<&'static str>,
    /// Number of operands taken from the stack (or expression body).
    pub arity: u8,
    pub precedence: u8,
    pub right_assoc: bool,
}

use precedence::*;

macro_rules! op {
    ($tag:ident, $name:literal, $arity:literal) => {
        OpInfo {
            tag: Tag::$tag,
            name: $name,
            symbol: None,
            arity: $arity,
            precedence: NONE,
            right_assoc: false,
        }
    };
    ($tag:ident, $name:literal, $arity:literal, fun) => {
        OpInfo {
            tag: Tag::$tag,
            name: $name,
            symbol: Some($name),
            arity: $arity,
            precedence: FUNCTION,
            right_assoc: false,
        }
    };
    ($tag:ident, $name:literal, $sym:literal, $arity:literal, $prec:expr) => {
        OpInfo {
            tag: Tag::$tag,
            name: $name,
            symbol: Some($sym),
            arity: $arity,
            precedence: $prec,
            right_assoc: false,
        }
    };
    ($tag:ident, $name:literal, $sym:literal, $arity:literal, $prec:expr, right) => {
        OpInfo {
            tag: Tag::$tag,
            name: $name,
            symbol: Some($sym),
            arity: $arity,
            precedence: $prec,
            right_assoc: true,
        }
    };
}

/// The complete command table, in tag order.
pub static OPS: &[OpInfo] = &[
    op!(Neg, "neg", "-", 1, UNARY),
    op!(Add, "+", "+", 2, ADDITIVE),
    op!(Sub, "-", "-", 2, ADDITIVE),
    op!(Mul, "*", "*", 2, MULTIPLICATIVE),
    op!(Div, "/", "/", 2, MULTIPLICATIVE),
    op!(Pow, "^", "^", 2, POWER, right),
    op!(Mod, "mod", "mod", 2, MULTIPLICATIVE),
    op!(Rem, "rem", "rem", 2, MULTIPLICATIVE),
    op!(Inv, "inv", 1, fun),
    op!(Sq, "sq", 1, fun),
    op!(Sqrt, "sqrt", 1, fun),
    op!(Abs, "abs", 1, fun),
    op!(Sin, "sin", 1, fun),
    op!(Cos, "cos", 1, fun),
    op!(Tan, "tan", 1, fun),
    op!(Exp, "exp", 1, fun),
    op!(Ln, "ln", 1, fun),
    op!(Eq, "==", "=", 2, RELATIONAL),
    op!(Ne, "≠", "≠", 2, RELATIONAL),
    op!(Lt, "<", "<", 2, RELATIONAL),
    op!(Le, "≤", "≤", 2, RELATIONAL),
    op!(Gt, ">", ">", 2, RELATIONAL),
    op!(Ge, "≥", "≥", 2, RELATIONAL),
    op!(And, "and", 2),
    op!(Or, "or", 2),
    op!(Xor, "xor", 2),
    op!(Not, "not", 1),
    op!(Dup, "dup", 1),
    op!(Drop, "drop", 1),
    op!(Swap, "swap", 2),
    op!(Over, "over", 2),
    op!(Rot, "rot", 3),
    op!(Pick, "pick", 1),
    op!(Roll, "roll", 1),
    op!(Depth, "depth", 0),
    op!(Clear, "clear", 0),
    op!(Sto, "sto", 2),
    op!(Rcl, "rcl", 1),
    op!(Purge, "purge", 1),
    op!(Eval, "eval", 1),
    op!(ToNum, "→num", 1),
    op!(Expand, "expand", 1),
    op!(Collect, "collect", 1),
    op!(Simplify, "simplify", 1),
    op!(Rewrite, "rewrite", 3),
    op!(Stws, "stws", 1),
    op!(Rcws, "rcws", 0),
];

/// Look up command metadata by tag.
pub fn by_tag(tag: Tag) -> Option<&'static OpInfo> {
    OPS.iter().find(|op| op.tag == tag)
}

/// Look up a command by its canonical name, case-insensitively.
pub fn by_name(name: &str) -> Option<&'static OpInfo> {
    OPS.iter().find(|op| {
        op.name == name || op.name.eq_ignore_ascii_case(name)
    })
}

/// Look up an algebraic operator by its notation and arity.
pub fn by_symbol(symbol: &str, arity: u8) -> Option<&'static OpInfo> {
    OPS.iter()
        .find(|op| op.symbol == Some(symbol) && op.arity == arity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_tag_has_metadata() {
        for raw in 0..128u8 {
            if let Some(tag) = Tag::from_u8(raw) {
                if tag.is_command() {
                    assert!(by_tag(tag).is_some(), "missing op entry for {:?}", tag);
                }
            }
        }
    }

    #[test]
    fn no_metadata_for_data_tags() {
        assert!(by_tag(Tag::Integer).is_none());
        assert!(by_tag(Tag::List).is_none());
        assert!(by_tag(Tag::ForNext).is_none());
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(by_name("dup").unwrap().tag, Tag::Dup);
        assert_eq!(by_name("DUP").unwrap().tag, Tag::Dup);
        assert_eq!(by_name("Sin").unwrap().tag, Tag::Sin);
        assert!(by_name("nosuch").is_none());
    }

    #[test]
    fn symbol_lookup_distinguishes_arity() {
        assert_eq!(by_symbol("-", 2).unwrap().tag, Tag::Sub);
        assert_eq!(by_symbol("-", 1).unwrap().tag, Tag::Neg);
        assert_eq!(by_symbol("^", 2).unwrap().tag, Tag::Pow);
    }

    #[test]
    fn power_is_right_associative() {
        assert!(by_tag(Tag::Pow).unwrap().right_assoc);
        assert!(!by_tag(Tag::Sub).unwrap().right_assoc);
    }

    #[test]
    fn precedence_ordering() {
        let add = by_tag(Tag::Add).unwrap().precedence;
        let mul = by_tag(Tag::Mul).unwrap().precedence;
        let pow = by_tag(Tag::Pow).unwrap().precedence;
        let eq = by_tag(Tag::Eq).unwrap().precedence;
        assert!(eq < add);
        assert!(add < mul);
        assert!(mul < pow);
    }

    #[test]
    fn case_styles() {
        assert_eq!(CaseStyle::Lower.apply("dup"), "dup");
        assert_eq!(CaseStyle::Upper.apply("dup"), "DUP");
        assert_eq!(CaseStyle::Capitalized.apply("dup"), "Dup");
    }
}
