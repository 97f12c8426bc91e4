//! Blocking synchronization primitives for engine threads.
//!
//! # Primitives
//!
//! - [`BoundedResource`]: Counting semaphore that starts closed and caps
//!   releases at its capacity
//! - [`ShutdownSignal`]: One-shot stop flag read by every worker loop
//!
//! # Example
//!
//! ```
//! use ascent_engine::sync::{BoundedResource, ShutdownSignal};
//!
//! let placement = BoundedResource::new(4);
//! placement.initialize();
//! assert!(placement.try_acquire());
//!
//! let shutdown = ShutdownSignal::new();
//! assert!(shutdown.raise());
//! ```

mod semaphore;
mod shutdown;

pub use semaphore::BoundedResource;
pub use shutdown::ShutdownSignal;
