//! Engine configuration.
//!
//! The configuration is fixed for the lifetime of a run: level capacities,
//! buffer size and worker count are validated once, up front, and never
//! resized afterwards.

use core::time::Duration;

use crate::error::ConfigError;

/// Default pause a worker spends placing once it reached its level.
pub const DEFAULT_PLACEMENT_DELAY: Duration = Duration::from_millis(20);

/// Environment key for the comma-separated scaffolding capacities.
pub const ENV_SCAFFOLDING: &str = "ASCENT_SCAFFOLDING";
/// Environment key for the comma-separated placement capacities.
pub const ENV_PLACEMENT: &str = "ASCENT_PLACEMENT";
/// Environment key for the shared buffer capacity.
pub const ENV_BUFFER: &str = "ASCENT_BUFFER";
/// Environment key for the worker count.
pub const ENV_WORKERS: &str = "ASCENT_WORKERS";
/// Environment key for the placement delay, in milliseconds.
pub const ENV_DELAY_MS: &str = "ASCENT_DELAY_MS";

/// Capacities of a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelSpec {
    /// Number of workers that may stand on this level's scaffolding at once.
    pub scaffolding: usize,
    /// Number of placements this level accepts in total.
    pub placement: usize,
}

impl LevelSpec {
    /// Create a level with the given capacities.
    pub const fn new(scaffolding: usize, placement: usize) -> Self {
        Self {
            scaffolding,
            placement,
        }
    }
}

/// Complete configuration of an engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Levels, indexed from 0 (ground) upwards.
    pub levels: Vec<LevelSpec>,
    /// Capacity of the shared buffer feeding level 0.
    pub buffer_capacity: usize,
    /// Number of worker threads.
    pub worker_count: usize,
    /// Simulated duration of one placement.
    pub placement_delay: Duration,
}

impl Default for EngineConfig {
    /// Two levels, `k = [3, 1]`, `p = [4, 3]`, a buffer of 7 and 4 workers.
    fn default() -> Self {
        Self {
            levels: vec![LevelSpec::new(3, 4), LevelSpec::new(1, 3)],
            buffer_capacity: 7,
            worker_count: 4,
            placement_delay: DEFAULT_PLACEMENT_DELAY,
        }
    }
}

impl EngineConfig {
    /// Build a validated configuration from parallel capacity lists.
    pub fn new(
        scaffolding: &[usize],
        placement: &[usize],
        buffer_capacity: usize,
        worker_count: usize,
    ) -> Result<Self, ConfigError> {
        if scaffolding.len() != placement.len() {
            return Err(ConfigError::LengthMismatch {
                scaffolding: scaffolding.len(),
                placement: placement.len(),
            });
        }
        let config = Self {
            levels: scaffolding
                .iter()
                .zip(placement)
                .map(|(&k, &p)| LevelSpec::new(k, p))
                .collect(),
            buffer_capacity,
            worker_count,
            placement_delay: DEFAULT_PLACEMENT_DELAY,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the placement delay.
    pub fn with_placement_delay(mut self, delay: Duration) -> Self {
        self.placement_delay = delay;
        self
    }

    /// Check every capacity is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for (level, spec) in self.levels.iter().enumerate() {
            if spec.scaffolding == 0 {
                return Err(ConfigError::ZeroScaffolding { level });
            }
            if spec.placement == 0 {
                return Err(ConfigError::ZeroPlacement { level });
            }
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Sum of every level's placement capacity.
    pub fn total_placement(&self) -> usize {
        self.levels.iter().map(|l| l.placement).sum()
    }

    /// Apply overrides read through `lookup` on top of `self`.
    ///
    /// Keys that `lookup` does not know keep their current value. Capacity
    /// lists are comma separated; both lists must be given together when
    /// the level count changes.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let scaffolding = match lookup(ENV_SCAFFOLDING) {
            Some(raw) => parse_list(ENV_SCAFFOLDING, &raw)?,
            None => self.levels.iter().map(|l| l.scaffolding).collect(),
        };
        let placement = match lookup(ENV_PLACEMENT) {
            Some(raw) => parse_list(ENV_PLACEMENT, &raw)?,
            None => self.levels.iter().map(|l| l.placement).collect(),
        };
        if let Some(raw) = lookup(ENV_BUFFER) {
            self.buffer_capacity = parse_value(ENV_BUFFER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            self.worker_count = parse_value(ENV_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DELAY_MS) {
            self.placement_delay = Duration::from_millis(parse_value(ENV_DELAY_MS, &raw)?);
        }

        let delay = self.placement_delay;
        Ok(Self::new(
            &scaffolding,
            &placement,
            self.buffer_capacity,
            self.worker_count,
        )?
        .with_placement_delay(delay))
    }
}

fn parse_value<T: core::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_list(key: &'static str, raw: &str) -> Result<Vec<usize>, ConfigError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_value(key, part))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_reference_scenario() {
        let config = EngineConfig::default();
        assert_eq!(config.level_count(), 2);
        assert_eq!(config.total_placement(), 7);
        assert_eq!(config.buffer_capacity, 7);
        assert_eq!(config.worker_count, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        assert_eq!(
            EngineConfig::new(&[3, 1], &[4], 7, 4),
            Err(ConfigError::LengthMismatch {
                scaffolding: 2,
                placement: 1
            })
        );
        assert_eq!(EngineConfig::new(&[], &[], 7, 4), Err(ConfigError::NoLevels));
        assert_eq!(
            EngineConfig::new(&[3, 0], &[4, 3], 7, 4),
            Err(ConfigError::ZeroScaffolding { level: 1 })
        );
        assert_eq!(
            EngineConfig::new(&[3, 1], &[0, 3], 7, 4),
            Err(ConfigError::ZeroPlacement { level: 0 })
        );
        assert_eq!(
            EngineConfig::new(&[3], &[4], 0, 4),
            Err(ConfigError::ZeroBufferCapacity)
        );
        assert_eq!(
            EngineConfig::new(&[3], &[4], 7, 0),
            Err(ConfigError::ZeroWorkers)
        );
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SCAFFOLDING, "2, 2, 1"),
            (ENV_PLACEMENT, "5,4,3"),
            (ENV_WORKERS, "6"),
            (ENV_DELAY_MS, "0"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides are valid");

        assert_eq!(config.level_count(), 3);
        assert_eq!(config.levels[2], LevelSpec::new(1, 3));
        assert_eq!(config.buffer_capacity, 7);
        assert_eq!(config.worker_count, 6);
        assert_eq!(config.placement_delay, Duration::ZERO);
    }

    #[test]
    fn test_lookup_reports_invalid_value() {
        let err = EngineConfig::default()
            .with_overrides(|key| (key == ENV_BUFFER).then(|| "seven".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_BUFFER,
                value: "seven".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_without_overrides_keeps_config() {
        let config = EngineConfig::default()
            .with_overrides(|_| None)
            .expect("defaults are valid");
        assert_eq!(config, EngineConfig::default());
    }
}
