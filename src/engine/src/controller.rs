//! Controller loop: refill the buffer, detect completion.

use ascent_common::event::Event;

use crate::buffer::Wake;
use crate::engine::Shared;

/// Where the controller is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for the buffer to drop below capacity.
    WaitForDeficit,
    /// Refilling the buffer.
    Restock,
    /// Checking whether every level is full.
    CheckComplete,
    /// Loop finished.
    Stopped,
}

/// What the controller did before stopping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Restocks that added at least one unit.
    pub restocks: usize,
    /// Units added over all restocks.
    pub units_restocked: usize,
    /// Completion checks requested by workers that found no capacity.
    pub audits: usize,
    /// Whether this controller raised the shutdown signal.
    pub completed: bool,
}

pub(crate) struct Controller<'a> {
    shared: &'a Shared,
    state: ControllerState,
    stats: ControllerStats,
}

impl<'a> Controller<'a> {
    pub(crate) fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            state: ControllerState::WaitForDeficit,
            stats: ControllerStats::default(),
        }
    }

    pub(crate) fn run(mut self) -> ControllerStats {
        let shared = self.shared;
        let capacity = shared.buffer.capacity();

        loop {
            self.transition(ControllerState::WaitForDeficit);
            match shared.buffer.wait_for_deficit(&shared.shutdown) {
                Wake::Shutdown => break,
                Wake::Audit => self.stats.audits += 1,
                Wake::Deficit => {}
            }

            self.transition(ControllerState::Restock);
            let restock = shared.buffer.restock_to(capacity);
            if restock.added > 0 {
                self.stats.restocks += 1;
                self.stats.units_restocked += restock.added;
                shared.sink.emit(Event::Restocked {
                    added: restock.added,
                    total: restock.total,
                });
            }

            self.transition(ControllerState::CheckComplete);
            if shared.levels.is_exhausted() {
                self.stats.completed = shared.shutdown.raise();
                shared.buffer.close();
                log::info!("every level is full, shutting down");
                shared.sink.emit(Event::Completed);
                break;
            }
        }

        self.transition(ControllerState::Stopped);
        self.stats
    }

    fn transition(&mut self, next: ControllerState) {
        log::trace!("controller: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
