//! Worker loop: draw a unit, claim a level, climb, place, descend.

use ascent_common::event::{Event, WorkerId};

use crate::engine::Shared;

/// Where a worker is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Between iterations.
    Idle,
    /// Waiting for a unit from the shared buffer.
    DrawUnit,
    /// Looking for a level with placement capacity.
    SelectLevel,
    /// No level had capacity; giving the unit back.
    ReturnUnit,
    /// Acquiring scaffolding from the ground up.
    ClimbChain,
    /// Placing at the chosen level.
    Place,
    /// Releasing scaffolding from the top down.
    DescendChain,
    /// Loop finished.
    Stopped,
}

/// What a worker did before stopping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Successful placements.
    pub placements: usize,
    /// Units given back because no level had capacity.
    pub returns: usize,
}

pub(crate) struct Worker<'a> {
    id: WorkerId,
    shared: &'a Shared,
    state: WorkerState,
    stats: WorkerStats,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(id: WorkerId, shared: &'a Shared) -> Self {
        Self {
            id,
            shared,
            state: WorkerState::Idle,
            stats: WorkerStats::default(),
        }
    }

    pub(crate) fn run(mut self) -> WorkerStats {
        let shared = self.shared;
        log::debug!("{} started", self.id);
        shared.sink.emit(Event::WorkerStarted { worker: self.id });

        while !shared.shutdown.is_raised() {
            self.transition(WorkerState::DrawUnit);
            if shared.buffer.draw_one().is_err() {
                break;
            }

            self.transition(WorkerState::SelectLevel);
            match shared.levels.claim_highest() {
                Some(level) => self.place_at(level),
                None => self.return_unit(),
            }
            self.transition(WorkerState::Idle);
        }

        self.transition(WorkerState::Stopped);
        log::debug!(
            "{} finished ({} placements, {} returns)",
            self.id,
            self.stats.placements,
            self.stats.returns
        );
        shared.sink.emit(Event::WorkerStopped { worker: self.id });
        self.stats
    }

    /// The placement permit for `level` is already held.
    fn place_at(&mut self, level: usize) {
        let shared = self.shared;
        let worker = self.id;

        self.transition(WorkerState::ClimbChain);
        let chain = shared.levels.climb(level, |step| {
            shared.sink.emit(Event::Climbed {
                worker,
                level: step.level,
                in_use: step.in_use,
                capacity: step.capacity,
            })
        });

        self.transition(WorkerState::Place);
        let placed = shared.levels.record_placement(level);
        self.stats.placements += 1;
        shared.sink.emit(Event::Placed {
            worker,
            level,
            placed,
            capacity: shared.levels.level(level).placement().max(),
        });
        shared.pacer.pause(shared.placement_delay);

        self.transition(WorkerState::DescendChain);
        chain.descend(|step| {
            shared.sink.emit(Event::Descended {
                worker,
                level: step.level,
                in_use: step.in_use,
                capacity: step.capacity,
            })
        });
        shared.sink.emit(Event::ReturnedToGround { worker });
    }

    fn return_unit(&mut self) {
        self.transition(WorkerState::ReturnUnit);
        self.shared.buffer.return_one();
        self.stats.returns += 1;
        self.shared
            .sink
            .emit(Event::UnitReturned { worker: self.id });
        // nothing left to claim until the controller notices; let it run
        std::thread::yield_now();
    }

    fn transition(&mut self, next: WorkerState) {
        log::trace!("{}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}
