//! Published normalization rule sets.
//!
//! These sets are part of the external contract: user-written rules
//! compose with them, so their effect is kept stable. Rule bodies are
//! data, built once on first use and applied by the generic engine.

use std::sync::OnceLock;

use stax_core::{Interrupt, Result, Tag};

use crate::expr::{binary, int, structure, sym, unary, Term};
use crate::pattern::Rule;
use crate::rewrite::{rewrite_all, rewrite_once, rewrite_stages};

fn add(x: &[u8], y: &[u8]) -> Vec<u8> {
    binary(Tag::Add, x, y)
}

fn sub(x: &[u8], y: &[u8]) -> Vec<u8> {
    binary(Tag::Sub, x, y)
}

fn mul(x: &[u8], y: &[u8]) -> Vec<u8> {
    binary(Tag::Mul, x, y)
}

fn div(x: &[u8], y: &[u8]) -> Vec<u8> {
    binary(Tag::Div, x, y)
}

fn pow(x: &[u8], y: &[u8]) -> Vec<u8> {
    binary(Tag::Pow, x, y)
}

fn neg(x: &[u8]) -> Vec<u8> {
    unary(Tag::Neg, x)
}

fn rule(pattern: Vec<u8>, template: Vec<u8>) -> Rule {
    Rule::compile(pattern, template).expect("invalid built-in rule")
}

/// Distribution: products over sums, powers over products.
fn expand_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let (a, b, c) = (sym("a"), sym("b"), sym("c"));
        vec![
            // Squares of sums and differences unfold directly.
            rule(
                pow(&add(&a, &b), &int(2)),
                add(
                    &add(&pow(&a, &int(2)), &mul(&mul(&int(2), &a), &b)),
                    &pow(&b, &int(2)),
                ),
            ),
            rule(
                pow(&sub(&a, &b), &int(2)),
                add(
                    &sub(&pow(&a, &int(2)), &mul(&mul(&int(2), &a), &b)),
                    &pow(&b, &int(2)),
                ),
            ),
            // Distribute multiplication over sums and differences.
            rule(mul(&add(&a, &b), &c), add(&mul(&a, &c), &mul(&b, &c))),
            rule(mul(&c, &add(&a, &b)), add(&mul(&c, &a), &mul(&c, &b))),
            rule(mul(&sub(&a, &b), &c), sub(&mul(&a, &c), &mul(&b, &c))),
            rule(mul(&c, &sub(&a, &b)), sub(&mul(&c, &a), &mul(&c, &b))),
            // Powers distribute over products and split over sums.
            rule(pow(&mul(&a, &b), &c), mul(&pow(&a, &c), &pow(&b, &c))),
            rule(pow(&a, &add(&b, &c)), mul(&pow(&a, &b), &pow(&a, &c))),
        ]
    })
}

/// Combining like terms and pulling common factors.
fn collect_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let (a, b, x) = (sym("a"), sym("b"), sym("x"));
        vec![
            rule(add(&mul(&a, &x), &mul(&b, &x)), mul(&add(&a, &b), &x)),
            rule(add(&mul(&x, &a), &mul(&x, &b)), mul(&x, &add(&a, &b))),
            rule(add(&mul(&a, &x), &x), mul(&add(&a, &int(1)), &x)),
            rule(add(&x, &mul(&a, &x)), mul(&add(&int(1), &a), &x)),
            rule(add(&x, &x), mul(&int(2), &x)),
            rule(sub(&mul(&a, &x), &mul(&b, &x)), mul(&sub(&a, &b), &x)),
            rule(sub(&mul(&a, &x), &x), mul(&sub(&a, &int(1)), &x)),
            rule(sub(&x, &mul(&a, &x)), mul(&sub(&int(1), &a), &x)),
            rule(sub(&x, &x), int(0)),
        ]
    })
}

/// Identity cleanup applied by `simplify`.
fn simplify_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let x = sym("x");
        vec![
            rule(add(&x, &int(0)), x.clone()),
            rule(add(&int(0), &x), x.clone()),
            rule(sub(&x, &int(0)), x.clone()),
            rule(sub(&int(0), &x), neg(&x)),
            rule(sub(&x, &x), int(0)),
            rule(mul(&x, &int(1)), x.clone()),
            rule(mul(&int(1), &x), x.clone()),
            rule(mul(&x, &int(0)), int(0)),
            rule(mul(&int(0), &x), int(0)),
            rule(div(&x, &int(1)), x.clone()),
            rule(div(&x, &x), int(1)),
            rule(div(&int(0), &x), int(0)),
            rule(pow(&x, &int(1)), x.clone()),
            rule(pow(&x, &int(0)), int(1)),
            rule(pow(&int(1), &x), int(1)),
            rule(neg(&neg(&x)), x.clone()),
            rule(neg(&int(0)), int(0)),
            rule(unary(Tag::Inv, &unary(Tag::Inv, &x)), x.clone()),
            rule(unary(Tag::Inv, &int(1)), int(1)),
        ]
    })
}

/// `A = B` becomes `A - B`, the form a root solver wants.
fn difference_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let (a, b) = (sym("a"), sym("b"));
        vec![rule(binary(Tag::Eq, &a, &b), sub(&a, &b))]
    })
}

/// Distribute products over sums and powers over products, to fixpoint.
pub fn expand(body: &[u8], interrupt: &Interrupt) -> Result<Vec<u8>> {
    rewrite_all(body, expand_rules(), interrupt)
}

/// Combine like terms and pull common factors, to fixpoint.
pub fn collect(body: &[u8], interrupt: &Interrupt) -> Result<Vec<u8>> {
    rewrite_all(body, collect_rules(), interrupt)
}

/// Rewrite `A = B` into `A - B` for the solver.
pub fn as_difference_for_solve(body: &[u8]) -> Result<Vec<u8>> {
    let (result, _) = rewrite_once(body, difference_rules())?;
    Ok(result)
}

/// Compose identity cleanup, collection and product-chain normalization,
/// iterating until none of them changes the expression.
pub fn simplify(body: &[u8], interrupt: &Interrupt) -> Result<Vec<u8>> {
    let mut current = body.to_vec();
    // The stages converge on their own; the round cap only guards
    // against a rule set oscillating with the product ordering.
    for _round in 0..64 {
        interrupt.check()?;
        let rewritten =
            rewrite_stages(&current, &[simplify_rules(), collect_rules()], interrupt)?;
        let normalized = simplify_products(&rewritten)?;
        if normalized == current {
            break;
        }
        current = normalized;
    }
    Ok(current)
}

/// Normalize product chains to a canonical operand order: numeric
/// factors first, then symbols, then everything else, ties broken by
/// serialized bytes; chains re-associate to the left.
pub fn simplify_products(body: &[u8]) -> Result<Vec<u8>> {
    match structure(body)? {
        Term::Atom(atom) => Ok(atom.to_vec()),
        Term::Apply { op: Tag::Mul, .. } => {
            let mut factors = Vec::new();
            flatten_product(body, &mut factors)?;
            factors.sort_by(|a, b| factor_key(a).cmp(&factor_key(b)));
            let mut chain = factors[0].clone();
            for factor in &factors[1..] {
                chain = mul(&chain, factor);
            }
            Ok(chain)
        }
        Term::Apply { op, args } => {
            let mut out = Vec::with_capacity(body.len());
            for arg in args {
                out.extend_from_slice(&simplify_products(arg)?);
            }
            stax_core::object::build::command(op, &mut out);
            Ok(out)
        }
    }
}

fn flatten_product(term: &[u8], factors: &mut Vec<Vec<u8>>) -> Result<()> {
    match structure(term)? {
        Term::Apply { op: Tag::Mul, args } => {
            for arg in args {
                flatten_product(arg, factors)?;
            }
            Ok(())
        }
        _ => {
            factors.push(simplify_products(term)?);
            Ok(())
        }
    }
}

fn factor_key(factor: &[u8]) -> (u8, &[u8]) {
    let category = match stax_core::object::tag_of(factor) {
        Ok(tag) if tag.is_numeric() => 0,
        Ok(Tag::Symbol) => 1,
        _ => 2,
    };
    (category, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Interrupt {
        Interrupt::new()
    }

    #[test]
    fn expand_square_of_sum() {
        // (a+b)^2 → a^2 + 2*a*b + b^2
        let subject = pow(&add(&sym("a"), &sym("b")), &int(2));
        let result = expand(&subject, &flag()).unwrap();
        let expected = add(
            &add(
                &pow(&sym("a"), &int(2)),
                &mul(&mul(&int(2), &sym("a")), &sym("b")),
            ),
            &pow(&sym("b"), &int(2)),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn expand_distributes_products() {
        // (a+b)*(c+d) fully distributes.
        let subject = mul(&add(&sym("a"), &sym("b")), &add(&sym("c"), &sym("d")));
        let result = expand(&subject, &flag()).unwrap();
        // a*c + a*d + b*c + b*d, in the association the rules produce.
        let expected = add(
            &add(
                &mul(&sym("a"), &sym("c")),
                &mul(&sym("a"), &sym("d")),
            ),
            &add(
                &mul(&sym("b"), &sym("c")),
                &mul(&sym("b"), &sym("d")),
            ),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn collect_common_factor() {
        // a*x + b*x + c → (a+b)*x + c
        let subject = add(
            &add(
                &mul(&sym("a"), &sym("x")),
                &mul(&sym("b"), &sym("x")),
            ),
            &sym("c"),
        );
        let result = collect(&subject, &flag()).unwrap();
        let expected = add(
            &mul(&add(&sym("a"), &sym("b")), &sym("x")),
            &sym("c"),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn collect_doubles_repeated_term() {
        let subject = add(&sym("y"), &sym("y"));
        let result = collect(&subject, &flag()).unwrap();
        assert_eq!(result, mul(&int(2), &sym("y")));
    }

    #[test]
    fn simplify_identities() {
        // (x*1 + 0) ^ 1 → x
        let subject = pow(&add(&mul(&sym("Q"), &int(1)), &int(0)), &int(1));
        let result = simplify(&subject, &flag()).unwrap();
        assert_eq!(result, sym("Q"));
    }

    #[test]
    fn simplify_is_idempotent() {
        let subject = add(&mul(&sym("A"), &int(1)), &sub(&sym("B"), &sym("B")));
        let once = simplify(&subject, &flag()).unwrap();
        let twice = simplify(&once, &flag()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, sym("A"));
    }

    #[test]
    fn product_chains_sort_canonically() {
        // b*(a*2) → (2*a)*b
        let subject = mul(&sym("b"), &mul(&sym("a"), &int(2)));
        let result = simplify_products(&subject).unwrap();
        let expected = mul(&mul(&int(2), &sym("a")), &sym("b"));
        assert_eq!(result, expected);
    }

    #[test]
    fn equation_to_difference() {
        let subject = binary(Tag::Eq, &sym("A"), &sym("B"));
        let result = as_difference_for_solve(&subject).unwrap();
        assert_eq!(result, sub(&sym("A"), &sym("B")));
    }

    #[test]
    fn difference_leaves_non_equations_alone() {
        let subject = add(&sym("A"), &sym("B"));
        let result = as_difference_for_solve(&subject).unwrap();
        assert_eq!(result, subject);
    }
}
