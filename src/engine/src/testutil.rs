//! Test infrastructure for the Ascent engine.
//!
//! Provides a sink that records every event and checkers that replay a
//! recorded event log against the engine's ordering and capacity rules.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use ascent_common::EngineConfig;
//! use ascent_engine::testutil::{check_placement_bounds, check_stack_discipline, RecordingSink};
//! use ascent_engine::{Engine, NoPause};
//!
//! let sink = Arc::new(RecordingSink::new());
//! let config = EngineConfig::new(&[2], &[3], 2, 2).unwrap();
//! Engine::new(config.clone(), sink.clone()).unwrap().with_pacer(NoPause).run().unwrap();
//!
//! let events = sink.events();
//! check_stack_discipline(&events).unwrap();
//! check_placement_bounds(&events, &config).unwrap();
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ascent_common::config::EngineConfig;
use ascent_common::event::{Event, EventKind, WorkerId};
use ascent_hal::EventSink;

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events of the given kinds.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| kind.intersects(event.kind()))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Verify that every worker climbs `0, 1, …` and descends in exact reverse,
/// and never places without holding the full chain up to the placed level.
pub fn check_stack_discipline(events: &[Event]) -> Result<(), String> {
    let mut held: HashMap<WorkerId, Vec<usize>> = HashMap::new();

    for event in events {
        match *event {
            Event::Climbed { worker, level, .. } => {
                let chain = held.entry(worker).or_default();
                if level != chain.len() {
                    return Err(format!(
                        "{} climbed to level {} while holding {:?}",
                        worker, level, chain
                    ));
                }
                chain.push(level);
            }
            Event::Placed { worker, level, .. } => {
                let chain = held.get(&worker).map(Vec::as_slice).unwrap_or(&[]);
                if chain.last() != Some(&level) {
                    return Err(format!(
                        "{} placed on level {} while holding {:?}",
                        worker, level, chain
                    ));
                }
            }
            Event::Descended { worker, level, .. } => {
                let chain = held.entry(worker).or_default();
                if chain.pop() != Some(level) {
                    return Err(format!(
                        "{} released level {} out of order",
                        worker, level
                    ));
                }
            }
            Event::ReturnedToGround { worker } | Event::WorkerStopped { worker } => {
                if let Some(chain) = held.get(&worker).filter(|c| !c.is_empty()) {
                    return Err(format!("{} still holds {:?}", worker, chain));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Verify no level was placed on more often than its capacity allows and
/// that the per-level running totals increase one at a time.
pub fn check_placement_bounds(events: &[Event], config: &EngineConfig) -> Result<(), String> {
    let mut placed = vec![0usize; config.level_count()];
    let mut totals: Vec<Vec<usize>> = vec![Vec::new(); config.level_count()];

    for event in events {
        if let Event::Placed {
            level,
            placed: total,
            capacity,
            ..
        } = *event
        {
            let spec = config
                .levels
                .get(level)
                .ok_or_else(|| format!("placement on unknown level {}", level))?;
            if capacity != spec.placement {
                return Err(format!("level {} reported capacity {}", level, capacity));
            }
            placed[level] += 1;
            if placed[level] > spec.placement {
                return Err(format!(
                    "level {} placed {} times, capacity {}",
                    level, placed[level], spec.placement
                ));
            }
            totals[level].push(total);
        }
    }

    for (level, mut seen) in totals.into_iter().enumerate() {
        seen.sort_unstable();
        if seen.iter().copied().ne(1..=seen.len()) {
            return Err(format!("level {} totals are not 1..=n: {:?}", level, seen));
        }
    }
    Ok(())
}
