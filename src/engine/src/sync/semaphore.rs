//! Dynamically-initialized counting semaphore.
//!
//! This module provides the blocking counting semaphore every level and the
//! shared buffer are built on.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A counting semaphore with a fixed maximum that starts closed.
///
/// A new resource holds no permits: `acquire` blocks until `initialize`
/// opens it at full capacity. Releases never push the count above the
/// maximum; callers that over-release lose the excess silently.
///
/// # Example
///
/// ```
/// use ascent_engine::sync::BoundedResource;
///
/// let scaffolding = BoundedResource::new(3);
/// assert!(!scaffolding.try_acquire());
///
/// scaffolding.initialize();
/// scaffolding.acquire();
/// assert_eq!(scaffolding.in_use(), 1);
/// scaffolding.release(1);
/// ```
#[derive(Debug)]
pub struct BoundedResource {
    /// Available permits; only touched under this lock.
    state: Mutex<ResourceState>,
    /// Signalled on every initialize and release.
    changed: Condvar,
    /// Capacity set at construction.
    max_permits: usize,
}

#[derive(Debug)]
struct ResourceState {
    available: usize,
    initialized: bool,
}

impl BoundedResource {
    /// Create a closed resource with capacity `max_permits`.
    pub fn new(max_permits: usize) -> Self {
        Self {
            state: Mutex::new(ResourceState {
                available: 0,
                initialized: false,
            }),
            changed: Condvar::new(),
            max_permits,
        }
    }

    /// Open the resource at full capacity and wake every waiter.
    ///
    /// Must be called once, before the resource is shared.
    pub fn initialize(&self) {
        let mut state = self.lock();
        debug_assert!(!state.initialized, "resource initialized twice");
        state.initialized = true;
        state.available = self.max_permits;
        self.changed.notify_all();
    }

    /// Whether `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Block until a permit is available, then take it.
    ///
    /// Never fails; a resource that is never initialized or never released
    /// blocks the caller forever.
    pub fn acquire(&self) {
        let mut state = self.lock();
        while state.available == 0 {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.available -= 1;
    }

    /// Take a permit if one is available right now.
    ///
    /// Returns `true` if a permit was taken, `false` without side effects
    /// otherwise.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if state.available > 0 {
            state.available -= 1;
            true
        } else {
            false
        }
    }

    /// Return `permits` permits, capped at the maximum, and wake every waiter.
    ///
    /// Returns how many permits were actually added.
    pub fn release(&self, permits: usize) -> usize {
        let mut state = self.lock();
        let before = state.available;
        state.available = before.saturating_add(permits).min(self.max_permits);
        self.changed.notify_all();
        state.available - before
    }

    /// Point-in-time count of available permits.
    ///
    /// Diagnostic only: the value may be stale as soon as it is returned.
    pub fn available(&self) -> usize {
        self.lock().available
    }

    /// Capacity of the resource.
    pub fn max(&self) -> usize {
        self.max_permits
    }

    /// Point-in-time count of permits currently held.
    pub fn in_use(&self) -> usize {
        self.max_permits - self.available()
    }

    fn lock(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn opened(max: usize) -> BoundedResource {
        let res = BoundedResource::new(max);
        res.initialize();
        res
    }

    #[test]
    fn test_starts_closed() {
        let res = BoundedResource::new(2);
        assert!(!res.is_initialized());
        assert_eq!(res.available(), 0);
        assert!(!res.try_acquire());

        res.initialize();
        assert!(res.is_initialized());
        assert_eq!(res.available(), 2);
    }

    #[test]
    fn test_try_acquire() {
        let res = opened(2);

        // Should succeed twice
        assert!(res.try_acquire());
        assert!(res.try_acquire());

        // Third should fail and leave the count alone
        assert!(!res.try_acquire());
        assert_eq!(res.available(), 0);
        assert_eq!(res.in_use(), 2);
    }

    #[test]
    fn test_release_is_capped() {
        let res = opened(3);
        assert!(res.try_acquire());

        // Release more than was taken: only one fits
        assert_eq!(res.release(5), 1);
        assert_eq!(res.available(), 3);
        assert_eq!(res.release(1), 0);
        assert_eq!(res.available(), 3);
    }

    #[test]
    fn test_batch_release() {
        let res = opened(4);
        for _ in 0..4 {
            res.acquire();
        }
        assert_eq!(res.release(3), 3);
        assert_eq!(res.available(), 3);
    }

    #[test]
    fn test_acquire_waits_for_initialize() {
        let res = Arc::new(BoundedResource::new(1));
        let waiter = {
            let res = res.clone();
            thread::spawn(move || {
                res.acquire();
                res.in_use()
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        res.initialize();
        assert_eq!(waiter.join().unwrap(), 1);
    }

    #[test]
    fn test_release_wakes_blocked_acquire() {
        let res = Arc::new(opened(1));
        res.acquire();

        let waiter = {
            let res = res.clone();
            thread::spawn(move || res.acquire())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        res.release(1);
        waiter.join().unwrap();
        assert_eq!(res.available(), 0);
    }

    #[test]
    fn test_permits_never_exceed_max_under_contention() {
        let res = Arc::new(opened(3));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let res = res.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        res.acquire();
                        assert!(res.available() <= res.max());
                        res.release(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(res.available(), 3);
    }
}
