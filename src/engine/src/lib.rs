//! Ascent engine
//!
//! A multi-threaded coordination engine for bounded, hierarchical resource
//! acquisition: workers draw units from a shared buffer, claim a placement
//! slot on the highest level that has one, and climb a chain of per-level
//! scaffolding to reach it. A controller keeps the buffer stocked and shuts
//! everything down once every level is full.
//!
//! # Architecture
//!
//! The engine is structured into the following modules:
//! - `sync`: the counting semaphore and the shutdown signal
//! - `buffer`: the shared buffer feeding level 0
//! - `levels`: per-level capacities and the scaffolding chain
//! - `worker` / `controller`: the two thread loops
//! - `engine`: construction and `run`
//! - `sink`, `pacer`: host-side implementations of the `ascent-hal` traits
//! - `console`: the binary's `log` backend
//!
//! # Deadlock freedom
//!
//! Scaffolding is requested in ascending level order by every worker, and
//! the only nested locks are buffer → buffer resource. Shutdown closes the
//! buffer, which wakes every worker parked on it.

#![warn(missing_docs)]

pub mod buffer;
pub mod console;
pub mod controller;
pub mod engine;
pub mod levels;
pub mod pacer;
pub mod sink;
pub mod sync;
pub mod testutil;
pub mod worker;

pub use engine::{Engine, EngineError, RunReport};
pub use pacer::{NoPause, ThreadSleep};
pub use sink::{LogSink, NullSink, QueueSink};
