//! Monotonic shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide stop signal for worker loops.
///
/// Starts lowered and can be raised exactly once; there is no reset.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    raised: AtomicBool,
}

impl ShutdownSignal {
    /// Create a lowered signal.
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Raise the signal.
    ///
    /// Returns `true` for the call that performed the false → true
    /// transition and `false` for every later call.
    pub fn raise(&self) -> bool {
        self.raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the signal has been raised.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
