//! Symbolic expression engine: postfix expression bodies, compiled
//! pattern/template rules, a bottom-up rewrite engine with fixpoint
//! iteration, and the published normalization rule sets.

pub mod expr;
pub mod pattern;
pub mod rewrite;
pub mod rules;

pub use expr::{make_expression, read_expression, Term};
pub use pattern::{AtomKind, Bindings, Rule};
pub use rewrite::{rewrite_all, rewrite_once};
pub use rules::{as_difference_for_solve, collect, expand, simplify, simplify_products};
