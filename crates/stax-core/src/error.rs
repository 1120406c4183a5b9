//! The closed error taxonomy.
//!
//! Every fallible core operation returns exactly one of these kinds; they
//! propagate explicitly and are surfaced by name to the front end. There is
//! no cross-operation "last error" state.

use thiserror::Error;

/// Recoverable evaluation errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("divide by zero")]
    ZeroDivide,

    #[error("number is too big")]
    NumberTooBig,

    #[error("out of memory")]
    OutOfMemory,

    #[error("bad argument type")]
    TypeMismatch,

    #[error("argument outside domain")]
    ValueOutOfRange,

    #[error("undefined name")]
    UndefinedName,

    #[error("too few arguments")]
    NotEnoughArguments,

    /// Parse failure, with the byte offset where parsing stopped.
    #[error("syntax error at byte {offset}")]
    InvalidSyntax { offset: usize },

    #[error("invalid plot parameters")]
    InvalidPlotParameters,

    /// The cooperative interrupt flag was raised.
    #[error("interrupted")]
    Interrupted,

    #[error("not yet implemented")]
    Unimplemented,
}

impl Error {
    /// Stable identifier used by front ends to map errors to help topics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::ZeroDivide => "zero_divide",
            Error::NumberTooBig => "number_too_big",
            Error::OutOfMemory => "out_of_memory",
            Error::TypeMismatch => "type_mismatch",
            Error::ValueOutOfRange => "value_out_of_range",
            Error::UndefinedName => "undefined_name",
            Error::NotEnoughArguments => "not_enough_arguments",
            Error::InvalidSyntax { .. } => "invalid_syntax",
            Error::InvalidPlotParameters => "invalid_ppar",
            Error::Interrupted => "interrupted",
            Error::Unimplemented => "unimplemented",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(Error::ZeroDivide.to_string(), "divide by zero");
        assert_eq!(
            Error::InvalidSyntax { offset: 12 }.to_string(),
            "syntax error at byte 12"
        );
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(Error::ZeroDivide.kind_name(), "zero_divide");
        assert_eq!(Error::NotEnoughArguments.kind_name(), "not_enough_arguments");
        assert_eq!(
            Error::InvalidSyntax { offset: 0 }.kind_name(),
            "invalid_syntax"
        );
    }
}
