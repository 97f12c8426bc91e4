//! [`EventSink`] implementations.
//!
//! Every sink here returns without waiting: the engine calls `emit` from
//! inside its worker and controller loops.

use std::sync::atomic::{AtomicUsize, Ordering};

use ascent_common::event::{Event, EventKind};
use ascent_hal::EventSink;
use crossbeam_queue::ArrayQueue;

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Forwards events to the `log` facade.
///
/// Restocks and completion are logged at `info`, worker movement at
/// `debug`, everything else at `trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: Event) {
        let kind = event.kind();
        if kind.intersects(EventKind::RESTOCK | EventKind::COMPLETE | EventKind::PLACE) {
            log::info!(target: "ascent::events", "{}", event);
        } else if kind.intersects(EventKind::CLIMB | EventKind::DESCEND) {
            log::debug!(target: "ascent::events", "{}", event);
        } else {
            log::trace!(target: "ascent::events", "{}", event);
        }
    }
}

/// Bounded lock-free event queue for a consumer on another thread.
///
/// When the queue is full new events are dropped and counted rather than
/// waited for.
#[derive(Debug)]
pub struct QueueSink {
    queue: ArrayQueue<Event>,
    mask: EventKind,
    dropped: AtomicUsize,
}

impl QueueSink {
    /// Create a queue holding up to `capacity` events of every kind.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_mask(capacity, EventKind::all())
    }

    /// Create a queue that only keeps events whose kind is in `mask`.
    pub fn with_mask(capacity: usize, mask: EventKind) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            mask,
            dropped: AtomicUsize::new(0),
        }
    }

    /// Take the oldest queued event.
    pub fn pop(&self) -> Option<Event> {
        self.queue.pop()
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }

    /// Events currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no event is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events lost because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for QueueSink {
    fn emit(&self, event: Event) {
        if !self.mask.intersects(event.kind()) {
            return;
        }
        if self.queue.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascent_common::event::WorkerId;

    #[test]
    fn test_queue_sink_keeps_order() {
        let sink = QueueSink::new(4);
        sink.emit(Event::WorkerStarted {
            worker: WorkerId(0),
        });
        sink.emit(Event::Completed);
        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.drain(),
            vec![
                Event::WorkerStarted {
                    worker: WorkerId(0)
                },
                Event::Completed
            ]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_queue_sink_drops_when_full() {
        let sink = QueueSink::new(1);
        sink.emit(Event::Completed);
        sink.emit(Event::Restocked { added: 1, total: 1 });
        assert_eq!(sink.dropped(), 1);
        assert_eq!(sink.pop(), Some(Event::Completed));
        assert_eq!(sink.pop(), None);
    }

    #[test]
    fn test_queue_sink_filters_by_mask() {
        let sink = QueueSink::with_mask(8, EventKind::RESTOCK | EventKind::COMPLETE);
        sink.emit(Event::UnitReturned {
            worker: WorkerId(1),
        });
        sink.emit(Event::Restocked { added: 2, total: 7 });
        sink.emit(Event::Completed);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.dropped(), 0);
    }
}
