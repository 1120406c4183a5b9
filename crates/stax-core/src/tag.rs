//! The closed set of object tags.
//!
//! Every heap object begins with one of these tags encoded as LEB128. The
//! set is deliberately closed: dispatch stays in exhaustive matches and the
//! collector can walk any object knowing only its tag. All discriminants
//! are below 128 so a tag always encodes as a single byte.

macro_rules! tags {
    ($($name:ident = $value:literal),* $(,)?) => {
        /// Type id of a heap object.
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum Tag {
            $($name = $value),*
        }

        impl Tag {
            /// Decode a tag from its wire value.
            pub fn from_u8(value: u8) -> Option<Tag> {
                match value {
                    $($value => Some(Tag::$name),)*
                    _ => None,
                }
            }

            /// Internal name, mostly for diagnostics.
            pub fn name(self) -> &'static str {
                match self {
                    $(Tag::$name => stringify!($name)),*
                }
            }
        }
    };
}

tags! {
    // Numbers. Sign lives in the tag; based variants share the payload
    // layout of their signed counterparts.
    Integer = 0,
    NegInteger = 1,
    Bignum = 2,
    NegBignum = 3,
    BasedInteger = 4,
    BasedBignum = 5,
    Fraction = 6,
    NegFraction = 7,
    BigFraction = 8,
    NegBigFraction = 9,
    Decimal = 10,

    // Atoms
    Symbol = 11,
    Text = 12,

    // Composites: two embedded children
    Rectangular = 13,
    Polar = 14,

    // Composites: length-prefixed body of embedded objects
    List = 15,
    Array = 16,
    Program = 17,
    Expression = 18,
    Funcall = 19,

    // Loop objects: length-prefixed body of embedded sub-objects
    StartNext = 20,
    StartStep = 21,
    ForNext = 22,
    ForStep = 23,
    DoUntil = 24,
    WhileRepeat = 25,

    // Arithmetic commands
    Neg = 32,
    Add = 33,
    Sub = 34,
    Mul = 35,
    Div = 36,
    Pow = 37,
    Mod = 38,
    Rem = 39,
    Inv = 40,
    Sq = 41,
    Sqrt = 42,
    Abs = 43,
    Sin = 44,
    Cos = 45,
    Tan = 46,
    Exp = 47,
    Ln = 48,

    // Comparisons
    Eq = 56,
    Ne = 57,
    Lt = 58,
    Le = 59,
    Gt = 60,
    Ge = 61,

    // Logic, bitwise on based numbers
    And = 64,
    Or = 65,
    Xor = 66,
    Not = 67,

    // Stack commands
    Dup = 72,
    Drop = 73,
    Swap = 74,
    Over = 75,
    Rot = 76,
    Pick = 77,
    Roll = 78,
    Depth = 79,
    Clear = 80,

    // Directory and evaluation commands
    Sto = 88,
    Rcl = 89,
    Purge = 90,
    Eval = 91,
    ToNum = 92,

    // Symbolic commands
    Expand = 96,
    Collect = 97,
    Simplify = 98,
    Rewrite = 99,

    // Word size control for based numbers
    Stws = 104,
    Rcws = 105,
}

impl Tag {
    /// The wire value of this tag.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for plain (non-based) integer kinds, small or big.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Tag::Integer | Tag::NegInteger | Tag::Bignum | Tag::NegBignum
        )
    }

    /// True for based integer kinds.
    pub fn is_based(self) -> bool {
        matches!(self, Tag::BasedInteger | Tag::BasedBignum)
    }

    /// True for fraction kinds.
    pub fn is_fraction(self) -> bool {
        matches!(
            self,
            Tag::Fraction | Tag::NegFraction | Tag::BigFraction | Tag::NegBigFraction
        )
    }

    /// True if the payload is a single LEB128 magnitude.
    pub fn is_small_payload(self) -> bool {
        matches!(self, Tag::Integer | Tag::NegInteger | Tag::BasedInteger)
    }

    /// True if the payload is a length-prefixed run of magnitude bytes.
    pub fn is_big_payload(self) -> bool {
        matches!(self, Tag::Bignum | Tag::NegBignum | Tag::BasedBignum)
    }

    /// True for the kinds carrying a negative sign in the tag.
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Tag::NegInteger | Tag::NegBignum | Tag::NegFraction | Tag::NegBigFraction
        )
    }

    /// True for any numeric kind (integers, fractions, decimals, based).
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_based() || self.is_fraction() || self == Tag::Decimal
    }

    /// True for loop objects.
    pub fn is_loop(self) -> bool {
        matches!(
            self,
            Tag::StartNext
                | Tag::StartStep
                | Tag::ForNext
                | Tag::ForStep
                | Tag::DoUntil
                | Tag::WhileRepeat
        )
    }

    /// True for the length-prefixed composite kinds (including loops).
    pub fn is_sized_composite(self) -> bool {
        matches!(
            self,
            Tag::List | Tag::Array | Tag::Program | Tag::Expression | Tag::Funcall
        ) || self.is_loop()
    }

    /// True for commands: tag-only objects dispatched to a handler.
    pub fn is_command(self) -> bool {
        self.as_u8() >= Tag::Neg.as_u8()
    }

    /// True for objects that evaluate to themselves by pushing on the stack.
    pub fn is_self_evaluating(self) -> bool {
        self.is_numeric()
            || matches!(
                self,
                Tag::Text
                    | Tag::Rectangular
                    | Tag::Polar
                    | Tag::List
                    | Tag::Array
                    | Tag::Expression
                    | Tag::Funcall
            )
    }

    /// The same magnitude with the opposite sign, where sign lives in the
    /// tag. Based kinds are unchanged; they negate by computing `0 - x`.
    pub fn opposite(self) -> Tag {
        match self {
            Tag::Integer => Tag::NegInteger,
            Tag::NegInteger => Tag::Integer,
            Tag::Bignum => Tag::NegBignum,
            Tag::NegBignum => Tag::Bignum,
            Tag::Fraction => Tag::NegFraction,
            Tag::NegFraction => Tag::Fraction,
            Tag::BigFraction => Tag::NegBigFraction,
            Tag::NegBigFraction => Tag::BigFraction,
            other => other,
        }
    }

    /// Tag of a product or quotient given the operand tags: negative
    /// exactly when the operand signs differ. Based operands stay based.
    pub fn product(self, other: Tag) -> Tag {
        if self.is_based() || other.is_based() {
            return Tag::BasedBignum;
        }
        if self.is_negative() == other.is_negative() {
            Tag::Bignum
        } else {
            Tag::NegBignum
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_roundtrip() {
        for value in 0..128u8 {
            if let Some(tag) = Tag::from_u8(value) {
                assert_eq!(tag.as_u8(), value);
            }
        }
        assert_eq!(Tag::from_u8(Tag::Integer.as_u8()), Some(Tag::Integer));
        assert_eq!(Tag::from_u8(Tag::Rcws.as_u8()), Some(Tag::Rcws));
        assert_eq!(Tag::from_u8(126), None);
    }

    #[test]
    fn classification() {
        assert!(Tag::Integer.is_integer());
        assert!(Tag::NegBignum.is_integer());
        assert!(!Tag::BasedInteger.is_integer());
        assert!(Tag::BasedBignum.is_based());
        assert!(Tag::NegBigFraction.is_fraction());
        assert!(Tag::Decimal.is_numeric());
        assert!(Tag::ForNext.is_loop());
        assert!(Tag::Add.is_command());
        assert!(!Tag::List.is_command());
        assert!(Tag::List.is_self_evaluating());
        assert!(!Tag::Program.is_self_evaluating());
    }

    #[test]
    fn opposite_sign() {
        assert_eq!(Tag::Integer.opposite(), Tag::NegInteger);
        assert_eq!(Tag::NegBignum.opposite(), Tag::Bignum);
        assert_eq!(Tag::BasedBignum.opposite(), Tag::BasedBignum);
    }

    #[test]
    fn product_sign() {
        assert_eq!(Tag::Bignum.product(Tag::Bignum), Tag::Bignum);
        assert_eq!(Tag::Bignum.product(Tag::NegBignum), Tag::NegBignum);
        assert_eq!(Tag::NegBignum.product(Tag::NegBignum), Tag::Bignum);
        assert_eq!(Tag::BasedBignum.product(Tag::Bignum), Tag::BasedBignum);
    }

    #[test]
    fn tags_fit_one_leb_byte() {
        for value in [
            Tag::Integer,
            Tag::Decimal,
            Tag::WhileRepeat,
            Tag::Ln,
            Tag::Ge,
            Tag::Clear,
            Tag::ToNum,
            Tag::Rewrite,
            Tag::Rcws,
        ] {
            assert!(value.as_u8() < 128);
        }
    }
}
