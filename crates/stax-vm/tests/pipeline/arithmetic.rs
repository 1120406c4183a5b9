//! Arithmetic across the numeric tower.

use super::{assert_stack, assert_top, eval_stack};

#[test]
fn integer_basics() {
    assert_stack("1 2 +", &["3"]);
    assert_stack("10 4 -", &["6"]);
    assert_stack("6 7 *", &["42"]);
    assert_stack("2 10 ^", &["1024"]);
}

#[test]
fn negative_results() {
    assert_stack("3 5 -", &["-2"]);
    assert_stack("-3 -5 +", &["-8"]);
    assert_stack("-3 5 *", &["-15"]);
}

#[test]
fn widening_and_narrowing() {
    // 2^64 is past the small integer, its difference comes back down.
    assert_stack("2 64 ^", &["18446744073709551616"]);
    assert_stack("2 64 ^ 2 64 ^ -", &["0"]);
    assert_stack("2 64 ^ 1 +", &["18446744073709551617"]);
}

#[test]
fn associativity_identities() {
    // (x + y) - y = x
    assert_stack("123456789012345678901234567890 999 + 999 -", &["123456789012345678901234567890"]);
    // (x * y) / y = x when y divides the product
    assert_stack("123456789012345678901234567890 7 * 7 /", &["123456789012345678901234567890"]);
}

#[test]
fn division_and_fractions() {
    assert_stack("1 3 /", &["1/3"]);
    assert_stack("6 4 /", &["3/2"]);
    assert_stack("6 3 /", &["2"]);
    assert_stack("-6 4 /", &["-3/2"]);
}

#[test]
fn fraction_arithmetic() {
    assert_stack("1 2 / 1 3 / +", &["5/6"]);
    assert_stack("1 2 / 1 3 / -", &["1/6"]);
    assert_stack("1 3 / 2 3 / +", &["1"]);
    assert_stack("2 3 / 3 4 / *", &["1/2"]);
}

#[test]
fn quotient_and_remainder() {
    assert_stack("17 5 mod", &["2"]);
    assert_stack("17 5 rem", &["2"]);
    assert_stack("-17 5 mod", &["3"]);
    assert_stack("-17 5 rem", &["-2"]);
}

#[test]
fn euclidean_identity() {
    // y = ((y - y rem x) / x) * x + (y rem x); the inner division is
    // exact, so the whole chain stays in integers.
    for (y, x) in [(100i64, 7i64), (255, 16), (12345, 89)] {
        let line = format!("{y} {y} {x} rem - {x} / {x} * {y} {x} rem +");
        let result = eval_stack(&[line.as_str()]);
        assert_eq!(result, vec![y.to_string()]);
    }
}

#[test]
fn decimal_arithmetic() {
    assert_stack("1.5 2.25 +", &["3.75"]);
    assert_stack("0.1 0.2 +", &["0.3"]);
    assert_stack("1. 3. /", &["0.3333333333333333333333333333333333"]);
    assert_stack("2.5 4 *", &["10."]);
}

#[test]
fn mixed_exact_and_decimal() {
    assert_stack("1 2 / 0.5 +", &["1."]);
    assert_stack("2 1.5 *", &["3."]);
}

#[test]
fn powers() {
    assert_stack("2 -3 ^", &["1/8"]);
    assert_stack("1.5 2 ^", &["2.25"]);
    assert_stack("9 0 ^", &["1"]);
}

#[test]
fn unary_functions() {
    assert_stack("5 neg", &["-5"]);
    assert_stack("-5 abs", &["5"]);
    assert_stack("12 sq", &["144"]);
    assert_stack("4 inv", &["1/4"]);
    assert_top("16 sqrt", "4.");
}

#[test]
fn comparisons() {
    assert_stack("1 2 <", &["1"]);
    assert_stack("2 1 <", &["0"]);
    assert_stack("2 2 ≤", &["1"]);
    assert_stack("3 3 ==", &["1"]);
    assert_stack("3 4 ≠", &["1"]);
    assert_stack("1 2 / 2 4 / ==", &["1"]);
}

#[test]
fn comparison_across_kinds() {
    assert_stack("1 2 / 0.5 ==", &["1"]);
    assert_stack("1 2 / 0.6 <", &["1"]);
    assert_stack("-1 0.5 <", &["1"]);
}

#[test]
fn number_too_big_guard() {
    super::assert_error("2 100000 ^", "number_too_big");
}
