//! Status events emitted by the engine.
//!
//! Levels are indexed from 0 in every event; the console renders them
//! 1-based.

use core::fmt;
use bitflags::bitflags;

/// Identity of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

bitflags! {
    /// Categories of events, used by sinks to filter what they keep.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventKind: u32 {
        const LIFECYCLE = 1 << 0; // worker started / stopped
        const RESTOCK   = 1 << 1;
        const CLIMB     = 1 << 2;
        const PLACE     = 1 << 3;
        const DESCEND   = 1 << 4; // includes the return to ground
        const RETURN    = 1 << 5; // unit handed back to the buffer
        const COMPLETE  = 1 << 6;
    }
}

/// A status record delivered to the caller's event sink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// A worker thread entered its loop.
    WorkerStarted {
        /// The worker.
        worker: WorkerId,
    },
    /// The controller refilled the shared buffer.
    Restocked {
        /// Units added by this restock.
        added: usize,
        /// Units in stock afterwards.
        total: usize,
    },
    /// A worker acquired scaffolding at `level`.
    Climbed {
        /// The worker.
        worker: WorkerId,
        /// Level just acquired.
        level: usize,
        /// Scaffolding slots in use at `level` after the acquire.
        in_use: usize,
        /// Scaffolding capacity of `level`.
        capacity: usize,
    },
    /// A worker placed at `level`.
    Placed {
        /// The worker.
        worker: WorkerId,
        /// Level placed on.
        level: usize,
        /// Placements at `level` so far, this one included.
        placed: usize,
        /// Placement capacity of `level`.
        capacity: usize,
    },
    /// A worker released scaffolding at `level`.
    Descended {
        /// The worker.
        worker: WorkerId,
        /// Level just released.
        level: usize,
        /// Scaffolding slots in use at `level` after the release.
        in_use: usize,
        /// Scaffolding capacity of `level`.
        capacity: usize,
    },
    /// A worker released its whole chain and is back on the ground.
    ReturnedToGround {
        /// The worker.
        worker: WorkerId,
    },
    /// A worker found no placement capacity and gave its unit back.
    UnitReturned {
        /// The worker.
        worker: WorkerId,
    },
    /// A worker thread left its loop.
    WorkerStopped {
        /// The worker.
        worker: WorkerId,
    },
    /// Every level's placement capacity is consumed; shutdown raised.
    Completed,
}

impl Event {
    /// Category of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::WorkerStarted { .. } | Event::WorkerStopped { .. } => EventKind::LIFECYCLE,
            Event::Restocked { .. } => EventKind::RESTOCK,
            Event::Climbed { .. } => EventKind::CLIMB,
            Event::Placed { .. } => EventKind::PLACE,
            Event::Descended { .. } | Event::ReturnedToGround { .. } => EventKind::DESCEND,
            Event::UnitReturned { .. } => EventKind::RETURN,
            Event::Completed => EventKind::COMPLETE,
        }
    }

    /// Worker the event belongs to, if any.
    pub fn worker(&self) -> Option<WorkerId> {
        match self {
            Event::WorkerStarted { worker }
            | Event::Climbed { worker, .. }
            | Event::Placed { worker, .. }
            | Event::Descended { worker, .. }
            | Event::ReturnedToGround { worker }
            | Event::UnitReturned { worker }
            | Event::WorkerStopped { worker } => Some(*worker),
            Event::Restocked { .. } | Event::Completed => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::WorkerStarted { worker } => write!(f, "{} started", worker),
            Event::Restocked { added, total } => {
                write!(f, "restocked {} units (total: {})", added, total)
            }
            Event::Climbed {
                worker,
                level,
                in_use,
                capacity,
            } => write!(
                f,
                "{} climbed to level {} [used: {}/{}]",
                worker,
                level + 1,
                in_use,
                capacity
            ),
            Event::Placed {
                worker,
                level,
                placed,
                capacity,
            } => write!(
                f,
                "{} placed on level {} [total: {}/{}]",
                worker,
                level + 1,
                placed,
                capacity
            ),
            Event::Descended {
                worker,
                level,
                in_use,
                capacity,
            } => write!(
                f,
                "{} left level {} [used: {}/{}]",
                worker,
                level + 1,
                in_use,
                capacity
            ),
            Event::ReturnedToGround { worker } => write!(f, "{} returned to the ground", worker),
            Event::UnitReturned { worker } => write!(f, "{} found no free level", worker),
            Event::WorkerStopped { worker } => write!(f, "{} finished", worker),
            Event::Completed => write!(f, "all levels complete, shutting down"),
        }
    }
}
