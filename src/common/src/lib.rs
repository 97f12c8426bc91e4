//! Types shared by every Ascent crate: configuration, errors and the
//! event model the engine reports through.

pub mod config;
pub mod error;
pub mod event;

pub use config::{EngineConfig, LevelSpec};
pub use error::ConfigError;
pub use event::{Event, EventKind, WorkerId};
