//! Symbolic expressions end to end.

use super::{assert_stack, assert_top, eval_stack};

#[test]
fn expressions_push_as_data() {
    assert_stack("'x+1'", &["'x+1'"]);
    assert_stack("'sin(x)^2'", &["'sin(x)^2'"]);
}

#[test]
fn symbolic_arithmetic_builds_expressions() {
    assert_stack("'x' 1 +", &["'x+1'"]);
    assert_stack("2 'x' *", &["'2*x'"]);
    assert_stack("'x' 'y' -", &["'x-y'"]);
    assert_stack("'x+1' 2 ^", &["'(x+1)^2'"]);
}

#[test]
fn unbound_names_stay_symbolic() {
    assert_stack("q 1 +", &["'q+1'"]);
}

#[test]
fn expand_square() {
    assert_top("'(a+b)^2' expand", "'a^2+2*a*b+b^2'");
}

#[test]
fn expand_difference_square() {
    assert_top("'(a-b)^2' expand", "'a^2-2*a*b+b^2'");
}

#[test]
fn expand_distribution() {
    assert_top("'(a+b)*c' expand", "'a*c+b*c'");
    assert_top("'a^(b+c)' expand", "'a^b*a^c'");
}

#[test]
fn collect_like_terms() {
    assert_top("'a*x+b*x+c' collect", "'(a+b)*x+c'");
    assert_top("'y+y' collect", "'2*y'");
    assert_top("'a*x-b*x' collect", "'(a-b)*x'");
}

#[test]
fn simplify_identities() {
    assert_top("'x+0' simplify", "'x'");
    assert_top("'1*x' simplify", "'x'");
    assert_top("'x^1' simplify", "'x'");
    assert_top("'x-x' simplify", "0");
    assert_top("'x/x' simplify", "1");
}

#[test]
fn simplify_is_idempotent() {
    let first = eval_stack(&["'x*1+0*y' simplify"]);
    let line = format!("{} simplify", first[0]);
    let second = eval_stack(&[line.as_str()]);
    assert_eq!(first, second);
}

#[test]
fn rewrite_with_user_rule() {
    assert_top("'A+0' 'x+0' 'x' rewrite", "'A'");
    // Repeated holes require equal subterms.
    assert_top("'B-B' 'x-x' '0' rewrite", "0");
    assert_top("'B-C' 'x-x' '0' rewrite", "'B-C'");
}

#[test]
fn rewrite_applies_to_subterms() {
    assert_top("'(A+0)*B' 'x+0' 'x' rewrite", "'A*B'");
}

#[test]
fn rewrite_without_match_is_identity() {
    assert_top("'A*B' 'x+0' 'x' rewrite", "'A*B'");
}

#[test]
fn eval_with_bindings() {
    let stack = eval_stack(&["4 'x' sto", "'3*x+2' eval"]);
    assert_eq!(stack, vec!["14"]);
}

#[test]
fn to_num_resolves_or_errors() {
    let stack = eval_stack(&["2 'r' sto", "'r^2+1' →num"]);
    assert_eq!(stack, vec!["5"]);
}

#[test]
fn equation_rendering_roundtrip() {
    assert_stack("'a=b'", &["'a=b'"]);
}

#[test]
fn funcall_roundtrip() {
    assert_stack("'g(x;y)+1'", &["'g(x;y)+1'"]);
}
