//! Error types shared across the Ascent workspace.

use core::fmt;

/// Configuration error, reported synchronously before any thread starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigError {
    /// No levels were configured
    NoLevels,
    /// Scaffolding and placement capacity lists differ in length
    LengthMismatch {
        /// Number of scaffolding capacities supplied.
        scaffolding: usize,
        /// Number of placement capacities supplied.
        placement: usize,
    },
    /// A level has zero scaffolding slots
    ZeroScaffolding {
        /// Index of the offending level.
        level: usize,
    },
    /// A level has zero placement slots
    ZeroPlacement {
        /// Index of the offending level.
        level: usize,
    },
    /// The shared buffer has zero capacity
    ZeroBufferCapacity,
    /// No workers were requested
    ZeroWorkers,
    /// An override value could not be parsed
    InvalidValue {
        /// The configuration key that was being read.
        key: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoLevels => write!(f, "at least one level is required"),
            ConfigError::LengthMismatch {
                scaffolding,
                placement,
            } => write!(
                f,
                "scaffolding capacities ({}) and placement capacities ({}) differ in length",
                scaffolding, placement
            ),
            ConfigError::ZeroScaffolding { level } => {
                write!(f, "level {} has no scaffolding capacity", level)
            }
            ConfigError::ZeroPlacement { level } => {
                write!(f, "level {} has no placement capacity", level)
            }
            ConfigError::ZeroBufferCapacity => write!(f, "buffer capacity must be positive"),
            ConfigError::ZeroWorkers => write!(f, "worker count must be positive"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
