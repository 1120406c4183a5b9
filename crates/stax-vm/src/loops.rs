//! Loop objects.
//!
//! A loop object embeds its sub-programs (and, for the named variants, a
//! loop variable symbol); the counted bounds come off the stack when the
//! loop runs. Every iteration polls the interrupt flag, so even an
//! intentionally infinite loop unwinds cleanly when the front end raises
//! it. Named counters bind in a fresh local frame that is dropped on
//! every exit path.

use stax_core::{object, Error, Result, Tag};
use stax_arith::bignum;

use crate::arith;
use crate::vm::Vm;

/// Evaluate a loop object from its byte encoding.
pub fn eval_loop(vm: &mut Vm, bytes: &[u8]) -> Result<()> {
    let tag = object::tag_of(bytes)?;
    let body = object::body(bytes)?;
    let children: Vec<Vec<u8>> = object::objects(body)
        .map(|o| o.map(|b| b.to_vec()))
        .collect::<Result<_>>()?;

    match tag {
        Tag::StartNext | Tag::StartStep => {
            let [program] = children.as_slice() else {
                return Err(Error::TypeMismatch);
            };
            counted(vm, None, program, tag == Tag::StartStep)
        }
        Tag::ForNext | Tag::ForStep => {
            let [name, program] = children.as_slice() else {
                return Err(Error::TypeMismatch);
            };
            let name = object::text_str(name)?.to_string();
            counted(vm, Some(name), program, tag == Tag::ForStep)
        }
        Tag::DoUntil => {
            let [condition, program] = children.as_slice() else {
                return Err(Error::TypeMismatch);
            };
            do_until(vm, condition, program)
        }
        Tag::WhileRepeat => {
            let [condition, program] = children.as_slice() else {
                return Err(Error::TypeMismatch);
            };
            while_repeat(vm, condition, program)
        }
        _ => Err(Error::TypeMismatch),
    }
}

/// Pop a loop bound as a machine integer.
fn pop_bound(vm: &mut Vm) -> Result<i64> {
    let id = vm.rt.pop()?;
    let value = bignum::read_int(&vm.rt, id).map_err(|e| {
        vm.rt.push(id);
        e
    })?;
    value.to_i64().ok_or(Error::ValueOutOfRange)
}

/// Counted loops: `a b start … next`, `a b for v … step` and friends.
/// The counter starts at `a` and advances by 1 (or by the value the body
/// leaves on the stack, for the stepped forms) until it passes `b` in
/// the step's direction.
fn counted(vm: &mut Vm, variable: Option<String>, program: &[u8], stepping: bool) -> Result<()> {
    let last = pop_bound(vm)?;
    let first = match pop_bound(vm) {
        Ok(v) => v,
        Err(e) => return Err(e),
    };
    let body = object::body(program)?.to_vec();

    let named = variable.is_some();
    if named {
        vm.rt.push_frame();
    }
    let result = counted_iterations(vm, variable.as_deref(), &body, first, last, stepping);
    if named {
        vm.rt.pop_frame();
    }
    result
}

fn counted_iterations(
    vm: &mut Vm,
    variable: Option<&str>,
    body: &[u8],
    first: i64,
    last: i64,
    stepping: bool,
) -> Result<()> {
    let mut counter = first;
    if counter > last && !stepping {
        // An empty ascending range runs zero times; stepped loops get a
        // chance to run downward.
        return Ok(());
    }
    loop {
        vm.interrupt.check()?;
        if let Some(name) = variable {
            let id = vm.rt.make_integer(counter)?;
            vm.rt.bind_local(name, id);
        }
        vm.eval_body(body)?;

        let step = if stepping { pop_bound(vm)? } else { 1 };
        counter = counter.checked_add(step).ok_or(Error::ValueOutOfRange)?;
        let done = if step >= 0 {
            counter > last
        } else {
            counter < last
        };
        if done {
            return Ok(());
        }
    }
}

/// `do … until … end`: body first, then the condition; stops when the
/// condition turns truthy.
fn do_until(vm: &mut Vm, condition: &[u8], program: &[u8]) -> Result<()> {
    let cond_body = object::body(condition)?.to_vec();
    let loop_body = object::body(program)?.to_vec();
    loop {
        vm.interrupt.check()?;
        vm.eval_body(&loop_body)?;
        vm.eval_body(&cond_body)?;
        let flag = vm.rt.pop()?;
        if arith::truthy(vm, flag)? {
            return Ok(());
        }
    }
}

/// `while … repeat … end`: condition first; the body only runs while it
/// holds.
fn while_repeat(vm: &mut Vm, condition: &[u8], program: &[u8]) -> Result<()> {
    let cond_body = object::body(condition)?.to_vec();
    let loop_body = object::body(program)?.to_vec();
    loop {
        vm.interrupt.check()?;
        vm.eval_body(&cond_body)?;
        let flag = vm.rt.pop()?;
        if !arith::truthy(vm, flag)? {
            return Ok(());
        }
        vm.eval_body(&loop_body)?;
    }
}
