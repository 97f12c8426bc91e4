//! Shared replenished buffer feeding level 0.
//!
//! The buffer pairs a [`BoundedResource`] with an explicit stock counter.
//! Both are only ever changed together while the buffer lock is held, so
//! any snapshot taken under that lock sees `count == available`.
//!
//! Two conditions hang off the buffer lock: workers wait on *stocked* for a
//! unit to draw, the controller waits on *space* for a deficit to refill.
//! Closing the buffer broadcasts both, which is how shutdown reaches a
//! worker parked on an empty buffer.

use core::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::sync::{BoundedResource, ShutdownSignal};

/// Returned by [`SharedBuffer::draw_one`] once the buffer has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferClosed;

impl fmt::Display for BufferClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shared buffer closed")
    }
}

impl std::error::Error for BufferClosed {}

/// Outcome of a restock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restock {
    /// Units added.
    pub added: usize,
    /// Units in stock afterwards.
    pub total: usize,
}

/// Why [`SharedBuffer::wait_for_deficit`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Stock is below capacity.
    Deficit,
    /// A worker found no placement capacity and asked for a completion check.
    Audit,
    /// The buffer was closed or shutdown was raised.
    Shutdown,
}

/// Consistent view of the buffer, taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSnapshot {
    /// Units in stock.
    pub count: usize,
    /// Permits available on the underlying resource.
    pub available: usize,
    /// Buffer capacity.
    pub capacity: usize,
}

#[derive(Debug)]
struct BufferState {
    count: usize,
    closed: bool,
    audit_requested: bool,
}

/// Level-0 supply: restocked by the controller, drained one unit at a time
/// by workers.
#[derive(Debug)]
pub struct SharedBuffer {
    resource: BoundedResource,
    state: Mutex<BufferState>,
    stocked: Condvar,
    space: Condvar,
}

impl SharedBuffer {
    /// Create a closed, empty buffer of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            resource: BoundedResource::new(capacity),
            state: Mutex::new(BufferState {
                count: 0,
                closed: false,
                audit_requested: false,
            }),
            stocked: Condvar::new(),
            space: Condvar::new(),
        }
    }

    /// Open the buffer fully stocked.
    pub fn open(&self) {
        let mut state = self.lock();
        self.resource.initialize();
        state.count = self.resource.available();
        self.stocked.notify_all();
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.resource.max()
    }

    /// Take one unit, waiting while the buffer is empty.
    ///
    /// Fails only once the buffer has been closed; a closed buffer hands out
    /// nothing even if units remain in stock.
    pub fn draw_one(&self) -> Result<(), BufferClosed> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Err(BufferClosed);
            }
            if self.resource.try_acquire() {
                state.count -= 1;
                self.space.notify_one();
                return Ok(());
            }
            state = self
                .stocked
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Give back a unit that could not be used.
    ///
    /// Also asks the controller to re-check completion. If the controller
    /// refilled the buffer in the meantime the unit no longer fits and is
    /// discarded. Returns whether the unit went back into stock.
    pub fn return_one(&self) -> bool {
        let mut state = self.lock();
        let added = self.resource.release(1);
        state.count += added;
        state.audit_requested = true;
        self.stocked.notify_one();
        self.space.notify_one();
        added == 1
    }

    /// Refill up to `target` units (capped at capacity).
    ///
    /// A buffer already at `target` is left untouched and nobody is woken.
    pub fn restock_to(&self, target: usize) -> Restock {
        let mut state = self.lock();
        let target = target.min(self.capacity());
        let deficit = target.saturating_sub(state.count);
        if deficit > 0 {
            let added = self.resource.release(deficit);
            debug_assert_eq!(added, deficit, "buffer count out of step with its resource");
            state.count += added;
            self.stocked.notify_all();
        }
        Restock {
            added: deficit,
            total: state.count,
        }
    }

    /// Block until the controller has something to do.
    pub fn wait_for_deficit(&self, shutdown: &ShutdownSignal) -> Wake {
        let mut state = self.lock();
        loop {
            if state.closed || shutdown.is_raised() {
                return Wake::Shutdown;
            }
            if state.count < self.capacity() {
                state.audit_requested = false;
                return Wake::Deficit;
            }
            if state.audit_requested {
                state.audit_requested = false;
                return Wake::Audit;
            }
            state = self
                .space
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Close the buffer and wake every waiter on either condition.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.stocked.notify_all();
        self.space.notify_all();
    }

    /// Whether the buffer has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Snapshot count and resource together.
    pub fn snapshot(&self) -> BufferSnapshot {
        let state = self.lock();
        BufferSnapshot {
            count: state.count,
            available: self.resource.available(),
            capacity: self.capacity(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn assert_consistent(buffer: &SharedBuffer) {
        let snap = buffer.snapshot();
        assert_eq!(snap.count, snap.available, "{:?}", snap);
        assert!(snap.count <= snap.capacity);
    }

    #[test]
    fn test_open_fills_buffer() {
        let buffer = SharedBuffer::new(7);
        assert_eq!(buffer.snapshot().count, 0);
        buffer.open();
        assert_eq!(
            buffer.snapshot(),
            BufferSnapshot {
                count: 7,
                available: 7,
                capacity: 7
            }
        );
    }

    #[test]
    fn test_draw_and_restock() {
        let buffer = SharedBuffer::new(3);
        buffer.open();

        buffer.draw_one().unwrap();
        buffer.draw_one().unwrap();
        assert_eq!(buffer.snapshot().count, 1);
        assert_consistent(&buffer);

        assert_eq!(buffer.restock_to(3), Restock { added: 2, total: 3 });
        assert_consistent(&buffer);
    }

    #[test]
    fn test_restock_at_target_is_noop() {
        let buffer = SharedBuffer::new(4);
        buffer.open();
        assert_eq!(buffer.restock_to(4), Restock { added: 0, total: 4 });
        assert_eq!(buffer.restock_to(2), Restock { added: 0, total: 4 });
        assert_consistent(&buffer);
    }

    #[test]
    fn test_restock_caps_target() {
        let buffer = SharedBuffer::new(2);
        buffer.open();
        buffer.draw_one().unwrap();
        assert_eq!(buffer.restock_to(10), Restock { added: 1, total: 2 });
        assert_consistent(&buffer);
    }

    #[test]
    fn test_return_one_into_full_buffer_is_dropped() {
        let buffer = SharedBuffer::new(2);
        buffer.open();
        buffer.draw_one().unwrap();
        buffer.restock_to(2);

        assert!(!buffer.return_one());
        assert_eq!(buffer.snapshot().count, 2);
        assert_consistent(&buffer);
    }

    #[test]
    fn test_return_one_requests_audit() {
        let buffer = SharedBuffer::new(1);
        buffer.open();
        buffer.draw_one().unwrap();
        assert!(buffer.return_one());

        let shutdown = ShutdownSignal::new();
        assert_eq!(buffer.wait_for_deficit(&shutdown), Wake::Audit);

        buffer.draw_one().unwrap();
        assert_eq!(buffer.wait_for_deficit(&shutdown), Wake::Deficit);
    }

    #[test]
    fn test_wait_for_deficit_sees_shutdown() {
        let buffer = SharedBuffer::new(1);
        buffer.open();
        let shutdown = ShutdownSignal::new();
        shutdown.raise();
        assert_eq!(buffer.wait_for_deficit(&shutdown), Wake::Shutdown);
    }

    #[test]
    fn test_draw_wakes_controller() {
        let buffer = Arc::new(SharedBuffer::new(2));
        buffer.open();
        let shutdown = Arc::new(ShutdownSignal::new());

        let controller = {
            let buffer = buffer.clone();
            let shutdown = shutdown.clone();
            thread::spawn(move || buffer.wait_for_deficit(&shutdown))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!controller.is_finished());

        buffer.draw_one().unwrap();
        assert_eq!(controller.join().unwrap(), Wake::Deficit);
    }

    #[test]
    fn test_close_releases_parked_drawers() {
        let buffer = Arc::new(SharedBuffer::new(1));
        buffer.open();
        buffer.draw_one().unwrap();

        let drawers: Vec<_> = (0..3)
            .map(|_| {
                let buffer = buffer.clone();
                thread::spawn(move || buffer.draw_one())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        buffer.close();

        for drawer in drawers {
            assert_eq!(drawer.join().unwrap(), Err(BufferClosed));
        }
        assert!(buffer.is_closed());
    }

    #[test]
    fn test_concurrent_draws_stay_consistent() {
        let buffer = Arc::new(SharedBuffer::new(5));
        buffer.open();

        let drawers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = buffer.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        buffer.draw_one().unwrap();
                        let snap = buffer.snapshot();
                        assert_eq!(snap.count, snap.available);
                        buffer.return_one();
                    }
                })
            })
            .collect();

        for drawer in drawers {
            drawer.join().unwrap();
        }
        assert_eq!(buffer.snapshot().count, 5);
        assert_consistent(&buffer);
    }
}
