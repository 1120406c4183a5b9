//! Loops and control flow.

use super::{assert_stack, eval_stack};
use stax_vm::Vm;

#[test]
fn start_next() {
    assert_stack("1 4 start 7 next", &["7", "7", "7", "7"]);
}

#[test]
fn for_next_counts_up() {
    assert_stack("1 5 for i i next", &["1", "2", "3", "4", "5"]);
}

#[test]
fn for_next_uses_counter_in_body() {
    assert_stack("0 1 4 for i i + next", &["10"]);
}

#[test]
fn start_step_descending() {
    assert_stack("10 1 start 7 -4 step", &["7", "7", "7"]);
}

#[test]
fn for_step_stride() {
    assert_stack("0 10 for i i 5 step", &["0", "5", "10"]);
}

#[test]
fn do_until_post_test() {
    let stack = eval_stack(&[
        "1 'n' sto",
        "do n 2 * 'n' sto until n 50 > end",
        "n",
    ]);
    assert_eq!(stack, vec!["64"]);
}

#[test]
fn while_repeat_pre_test() {
    let stack = eval_stack(&[
        "0 'total' sto 1 'k' sto",
        "while k 5 ≤ repeat total k + 'total' sto k 1 + 'k' sto end",
        "total",
    ]);
    assert_eq!(stack, vec!["15"]);
}

#[test]
fn while_false_never_runs() {
    assert_stack("while 0 repeat 99 end depth", &["0"]);
}

#[test]
fn nested_counted_loops() {
    assert_stack(
        "0 1 3 for i 1 3 for j i j * + next next",
        &["36"],
    );
}

#[test]
fn loops_inside_stored_programs() {
    let stack = eval_stack(&[
        "« 0 swap 1 swap for i i + next » 'sumto' sto",
        "10 sumto",
        "100 sumto",
    ]);
    assert_eq!(stack, vec!["55", "5050"]);
}

#[test]
fn interrupted_loop_rolls_back() {
    let mut vm = Vm::new();
    vm.run_source("42").unwrap();
    vm.interrupt.raise();
    let err = vm.run_source("1 100 start 1 next").unwrap_err();
    assert_eq!(err.kind_name(), "interrupted");
    vm.interrupt.clear();
    assert_eq!(super::rendered(&vm), vec!["42"]);
}
