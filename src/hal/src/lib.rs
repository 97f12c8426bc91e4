//! Ascent host abstraction layer.
//!
//! This crate defines the traits through which the engine reaches its host:
//! where status events go and how simulated work takes time. The engine
//! never prints or sleeps directly.

use core::time::Duration;

use ascent_common::event::Event;

/// Receiver of engine status events.
///
/// `emit` is called from controller and worker threads while they make
/// progress, so implementations must return promptly and must never wait
/// on the engine itself.
pub trait EventSink: Send + Sync {
    /// Deliver a single event.
    fn emit(&self, event: Event);
}

/// Paces simulated work, such as a placement.
pub trait Pacer: Send + Sync {
    /// Spend `duration` doing the work.
    fn pause(&self, duration: Duration);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: Event) {
        (**self).emit(event)
    }
}

impl<T: Pacer + ?Sized> Pacer for std::sync::Arc<T> {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}
