//! Full end-to-end scenarios combining several subsystems.

use super::{eval_stack, rendered};
use stax_vm::Vm;

#[test]
fn huge_product_renders_exactly() {
    let stack = eval_stack(&[
        "123456789012345678901234567890",
        "987654321098765432109876543210",
        "*",
    ]);
    assert_eq!(
        stack,
        vec!["121932631137021795226185032733622923332237463801111263526900"]
    );
}

#[test]
fn expand_square_of_sum() {
    let stack = eval_stack(&["'(a+b)^2' expand"]);
    assert_eq!(stack, vec!["'a^2+2*a*b+b^2'"]);
}

#[test]
fn collect_common_factor() {
    let stack = eval_stack(&["'a*x+b*x+c' collect"]);
    assert_eq!(stack, vec!["'(a+b)*x+c'"]);
}

#[test]
fn based_xor_with_word_size_8() {
    let stack = eval_stack(&["8 stws", "#FFh #F0h xor"]);
    assert_eq!(stack, vec!["#Fh"]);
}

#[test]
fn counted_loop_fills_the_stack() {
    let stack = eval_stack(&["« 1 10 for i i next »", "eval"]);
    assert_eq!(
        stack,
        (1..=10).map(|n| n.to_string()).collect::<Vec<_>>()
    );
}

#[test]
fn zero_divide_restores_the_operands() {
    let mut vm = Vm::new();
    vm.run_source("1").unwrap();
    vm.run_source("0").unwrap();
    let err = vm.run_source("/").unwrap_err();
    assert_eq!(err.kind_name(), "zero_divide");
    assert_eq!(rendered(&vm), vec!["1", "0"]);
}

#[test]
fn gc_is_transparent_across_a_session() {
    let mut vm = Vm::new();
    vm.run_source("« 2 * » 'double' sto").unwrap();
    vm.run_source("1 20 for i i double next").unwrap();
    let before = rendered(&vm);
    vm.rt.gc();
    assert_eq!(rendered(&vm), before);
    vm.run_source("+").unwrap();
    vm.rt.gc();
    vm.run_source("+").unwrap();
    let top = vm.render_level(0).unwrap();
    assert_eq!(top, (40 + 38 + 36).to_string());
}

#[test]
fn persistence_roundtrip_through_blob() {
    let mut vm = Vm::new();
    vm.run_source("42 'answer' sto").unwrap();
    vm.run_source("1 2 +").unwrap();
    let mut blob = Vec::new();
    stax_runtime::save_blob(&vm.rt, &mut blob).unwrap();

    let mut restored = Vm::new();
    stax_runtime::load_blob(&mut restored.rt, &mut blob.as_slice()).unwrap();
    assert_eq!(rendered(&restored), vec!["3"]);
    restored.run_source("answer 1 +").unwrap();
    assert_eq!(restored.render_level(0).unwrap(), "43");
}
