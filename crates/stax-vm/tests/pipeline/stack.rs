//! Stack manipulation commands.

use super::{assert_stack, assert_error};

#[test]
fn dup_drop() {
    assert_stack("5 dup", &["5", "5"]);
    assert_stack("5 6 drop", &["5"]);
}

#[test]
fn swap_over_rot() {
    assert_stack("1 2 swap", &["2", "1"]);
    assert_stack("1 2 over", &["1", "2", "1"]);
    assert_stack("1 2 3 rot", &["2", "3", "1"]);
}

#[test]
fn pick_copies_nth() {
    assert_stack("10 20 30 1 pick", &["10", "20", "30", "30"]);
    assert_stack("10 20 30 3 pick", &["10", "20", "30", "10"]);
}

#[test]
fn roll_moves_nth() {
    assert_stack("10 20 30 2 roll", &["10", "30", "20"]);
    assert_stack("10 20 30 3 roll", &["20", "30", "10"]);
    assert_stack("10 20 30 1 roll", &["10", "20", "30"]);
}

#[test]
fn depth_and_clear() {
    assert_stack("depth", &["0"]);
    assert_stack("9 9 9 depth", &["9", "9", "9", "3"]);
    assert_stack("1 2 3 clear depth", &["0"]);
}

#[test]
fn underflow_errors() {
    assert_error("dup", "not_enough_arguments");
    assert_error("swap", "not_enough_arguments");
    assert_error("1 swap", "not_enough_arguments");
    assert_error("1 2 3 4 pick", "not_enough_arguments");
    assert_error("5 roll", "not_enough_arguments");
}

#[test]
fn pick_zero_is_invalid() {
    assert_error("1 0 pick", "not_enough_arguments");
}
