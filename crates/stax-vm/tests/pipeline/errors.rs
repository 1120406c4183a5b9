//! Error propagation and recovery.

use super::assert_error;
use stax_vm::Vm;

#[test]
fn zero_divide() {
    assert_error("1 0 /", "zero_divide");
    assert_error("1 2 / 0 *  1 swap /", "zero_divide");
    assert_error("0 inv", "zero_divide");
}

#[test]
fn type_mismatch() {
    assert_error("\"text\" 1 +", "type_mismatch");
    assert_error("{ 1 } 2 *", "type_mismatch");
    assert_error("1 'x' 'y' rot sto drop", "type_mismatch");
}

#[test]
fn undefined_name() {
    assert_error("'nosuch' rcl", "undefined_name");
}

#[test]
fn not_enough_arguments() {
    assert_error("+", "not_enough_arguments");
    assert_error("1 +", "not_enough_arguments");
}

#[test]
fn invalid_syntax_has_offset() {
    let mut vm = Vm::new();
    let err = vm.run_source("1 2 'a+'").unwrap_err();
    match err {
        stax_core::Error::InvalidSyntax { offset } => assert_eq!(offset, 7),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn number_too_big_is_recoverable() {
    let mut vm = Vm::new();
    vm.run_source("42").unwrap();
    let err = vm.run_source("2 1000000 ^").unwrap_err();
    assert_eq!(err.kind_name(), "number_too_big");
    // The earlier stack survives and the machine keeps working.
    vm.run_source("1 +").unwrap();
    assert_eq!(super::rendered(&vm), vec!["43"]);
}

#[test]
fn error_aborts_rest_of_program() {
    let mut vm = Vm::new();
    let err = vm.run_source("1 0 / 42").unwrap_err();
    assert_eq!(err.kind_name(), "zero_divide");
    // The failed action rolled back: no 42 either.
    assert_eq!(vm.rt.depth(), 0);
}

#[test]
fn errors_do_not_poison_later_actions() {
    let mut vm = Vm::new();
    assert!(vm.run_source("+").is_err());
    vm.run_source("2 3 +").unwrap();
    assert_eq!(super::rendered(&vm), vec!["5"]);
}

#[test]
fn out_of_memory_reported() {
    let mut vm = Vm::new();
    vm.rt = stax_runtime::Runtime::with_capacity(128);
    // Fill the heap with stack-rooted text objects until it fails.
    let mut failed = None;
    for _ in 0..64 {
        if let Err(e) = vm.run_source("\"0123456789abcdef\"") {
            failed = Some(e);
            break;
        }
    }
    assert_eq!(failed, Some(stax_core::Error::OutOfMemory));
}
