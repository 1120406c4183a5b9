//! The rewrite engine.
//!
//! `rewrite_once` walks a subject bottom-up and applies at most one rule
//! at every subterm; `rewrite_all` iterates whole passes to a fixpoint,
//! polling the interrupt flag between passes. Both are pure functions
//! from postfix body to postfix body; nothing here allocates on the
//! object heap.

use stax_core::{Interrupt, Result};

use crate::expr::{structure, Term};
use crate::pattern::{Bindings, Rule};

/// Passes after which a fixpoint iteration gives up. A rule set that is
/// still changing after this many passes is cycling, not converging.
const MAX_PASSES: usize = 256;

/// One bottom-up pass: children first, then at most one matching rule at
/// the rebuilt node. Returns the new body and whether anything changed.
pub fn rewrite_once(subject: &[u8], rules: &[Rule]) -> Result<(Vec<u8>, bool)> {
    let mut binds = Bindings::new();
    rewrite_term(subject, rules, &mut binds)
}

fn rewrite_term(term: &[u8], rules: &[Rule], binds: &mut Bindings) -> Result<(Vec<u8>, bool)> {
    let (rebuilt, mut changed) = match structure(term)? {
        Term::Atom(atom) => (atom.to_vec(), false),
        Term::Apply { op, args } => {
            let mut body = Vec::with_capacity(term.len());
            let mut child_changed = false;
            for arg in args {
                let (new_arg, arg_changed) = rewrite_term(arg, rules, binds)?;
                child_changed = child_changed || arg_changed;
                body.extend_from_slice(&new_arg);
            }
            stax_core::object::build::command(op, &mut body);
            (body, child_changed)
        }
    };

    // One application per subterm and per pass.
    for rule in rules {
        if rule.match_into(&rebuilt, binds)? {
            let replaced = rule.instantiate(binds)?;
            changed = true;
            return Ok((replaced, changed));
        }
    }
    Ok((rebuilt, changed))
}

/// Apply a rule set to fixpoint. The result no longer matches any rule,
/// or the pass limit was hit (cycling rule sets stop without erroring;
/// the interrupt flag aborts with `Interrupted`).
pub fn rewrite_all(subject: &[u8], rules: &[Rule], interrupt: &Interrupt) -> Result<Vec<u8>> {
    let mut current = subject.to_vec();
    for _pass in 0..MAX_PASSES {
        interrupt.check()?;
        let (next, changed) = rewrite_once(&current, rules)?;
        if !changed {
            return Ok(next);
        }
        current = next;
    }
    Ok(current)
}

/// Chain several independently converging stages, re-running the whole
/// chain until none of them changes the subject.
pub fn rewrite_stages(
    subject: &[u8],
    stages: &[&[Rule]],
    interrupt: &Interrupt,
) -> Result<Vec<u8>> {
    let mut current = subject.to_vec();
    for _round in 0..MAX_PASSES {
        interrupt.check()?;
        let mut changed = false;
        for stage in stages {
            let next = rewrite_all(&current, stage, interrupt)?;
            if next != current {
                changed = true;
                current = next;
            }
        }
        if !changed {
            return Ok(current);
        }
    }
    Ok(current)
}
