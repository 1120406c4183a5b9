//! Cooperative cancellation.
//!
//! There is no preemption anywhere in the core: long-running operations
//! poll this flag at documented suspension points (per loop iteration,
//! between rewrite passes, per digit chunk when rendering huge bignums)
//! and unwind with `Error::Interrupted`. The flag is monotonic within one
//! user action; only the front end clears it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// Shared interrupt flag. Cloning yields another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the current evaluation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Acknowledge and clear; the front end calls this, not the core.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Poll at a suspension point.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_raised() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
