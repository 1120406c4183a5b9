//! Numeric tower of the stax calculator: the unsigned magnitude kernel,
//! signed small/big integers with automatic widening, based numbers with
//! word-size masking, exact fractions, and the decimal adapter.

pub mod bignum;
pub mod decimal;
pub mod fraction;
pub mod magnitude;

pub use bignum::{make_int, read_int, Int};
pub use decimal::{make_decimal, read_decimal, Decimal};
pub use fraction::{make_rational, read_rational, Rational};
pub use magnitude::Magnitude;
