//! End-to-end evaluation tests.
//!
//! These drive the complete parse → evaluate → render path through the
//! public `Vm`. Tests are organized into modules by functionality.

use stax_vm::Vm;

mod arithmetic;
mod binary_int;
mod errors;
mod flow;
mod scenarios;
mod stack;
mod symbolic;

// ============================================================================
// Test Helpers
// ============================================================================

/// Evaluate source lines and return the rendered stack, bottom to top.
pub fn eval_stack(lines: &[&str]) -> Vec<String> {
    let mut vm = Vm::new();
    for line in lines {
        vm.run_source(line)
            .unwrap_or_else(|e| panic!("eval failed for '{line}': {e:?}"));
    }
    rendered(&vm)
}

/// Rendered stack contents, bottom to top.
pub fn rendered(vm: &Vm) -> Vec<String> {
    let depth = vm.rt.depth();
    (0..depth)
        .rev()
        .map(|level| vm.render_level(level).unwrap())
        .collect()
}

/// Evaluate one line and check the rendered stack.
pub fn assert_stack(code: &str, expected: &[&str]) {
    let actual = eval_stack(&[code]);
    assert_eq!(
        actual, expected,
        "stack mismatch for '{code}': expected {expected:?}, got {actual:?}"
    );
}

/// Evaluate one line and check the rendered top of stack.
pub fn assert_top(code: &str, expected: &str) {
    let actual = eval_stack(&[code]);
    assert_eq!(
        actual.last().map(String::as_str),
        Some(expected),
        "top of stack mismatch for '{code}'"
    );
}

/// Check that a line fails with the given error kind.
pub fn assert_error(code: &str, kind: &str) {
    let mut vm = Vm::new();
    match vm.run_source(code) {
        Ok(()) => panic!("expected '{kind}' error for '{code}', but it succeeded"),
        Err(e) => assert_eq!(
            e.kind_name(),
            kind,
            "wrong error for '{code}': got {e:?}"
        ),
    }
}
