//! Engine construction and the blocking `run` entry point.

use core::fmt;
use std::io;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use ascent_common::config::EngineConfig;
use ascent_common::error::ConfigError;
use ascent_common::event::WorkerId;
use ascent_hal::{EventSink, Pacer};

use crate::buffer::SharedBuffer;
use crate::controller::{Controller, ControllerStats};
use crate::levels::LevelPool;
use crate::pacer::ThreadSleep;
use crate::sync::ShutdownSignal;
use crate::worker::{Worker, WorkerStats};

/// Failure of a run after a valid configuration was accepted.
#[derive(Debug)]
pub enum EngineError {
    /// The OS refused to start a thread.
    Spawn(io::Error),
    /// A controller or worker thread panicked.
    Panicked {
        /// Name of the thread.
        thread: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Spawn(err) => write!(f, "failed to spawn thread: {}", err),
            EngineError::Panicked { thread } => write!(f, "thread {} panicked", thread),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Spawn(err) => Some(err),
            EngineError::Panicked { .. } => None,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Placements per level.
    pub placements: Vec<usize>,
    /// Per-worker results, indexed by worker id.
    pub workers: Vec<WorkerStats>,
    /// Controller results.
    pub controller: ControllerStats,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Placements over all levels.
    pub fn total_placements(&self) -> usize {
        self.placements.iter().sum()
    }
}

/// State shared by the controller and every worker for one run.
pub(crate) struct Shared {
    pub(crate) buffer: SharedBuffer,
    pub(crate) levels: LevelPool,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) sink: Box<dyn EventSink>,
    pub(crate) pacer: Box<dyn Pacer>,
    pub(crate) placement_delay: Duration,
}

impl Shared {
    /// Stop everything without waiting for completion.
    fn abort(&self) {
        self.shutdown.raise();
        self.buffer.close();
    }
}

/// A configured engine, ready to run once.
///
/// # Example
///
/// ```
/// use ascent_common::EngineConfig;
/// use ascent_engine::{Engine, NoPause, NullSink};
///
/// let config = EngineConfig::new(&[3, 1], &[4, 3], 7, 4).unwrap();
/// let report = Engine::new(config, NullSink)
///     .unwrap()
///     .with_pacer(NoPause)
///     .run()
///     .unwrap();
/// assert_eq!(report.placements, vec![4, 3]);
/// ```
pub struct Engine {
    config: EngineConfig,
    shared: Shared,
}

impl Engine {
    /// Validate `config` and build every resource, without starting threads.
    pub fn new(config: EngineConfig, sink: impl EventSink + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Shared {
            buffer: SharedBuffer::new(config.buffer_capacity),
            levels: LevelPool::new(&config.levels),
            shutdown: ShutdownSignal::new(),
            sink: Box::new(sink),
            pacer: Box::new(ThreadSleep),
            placement_delay: config.placement_delay,
        };
        Ok(Self { config, shared })
    }

    /// Replace how placement work is paced (defaults to sleeping).
    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.shared.pacer = Box::new(pacer);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open every resource, run the controller and workers, and block until
    /// all of them have stopped.
    pub fn run(self) -> Result<RunReport, EngineError> {
        let started = Instant::now();
        let shared = &self.shared;
        shared.levels.open();
        shared.buffer.open();
        log::info!(
            "starting {} workers over {} levels ({} placements, buffer {})",
            self.config.worker_count,
            self.config.level_count(),
            self.config.total_placement(),
            self.config.buffer_capacity
        );

        let (controller, workers) = thread::scope(|scope| -> Result<_, EngineError> {
            let controller = thread::Builder::new()
                .name("controller".into())
                .spawn_scoped(scope, move || Controller::new(shared).run())
                .map_err(EngineError::Spawn)?;

            let mut handles = Vec::with_capacity(self.config.worker_count);
            for index in 0..self.config.worker_count {
                let id = WorkerId(index);
                let spawned = thread::Builder::new()
                    .name(id.to_string())
                    .spawn_scoped(scope, move || Worker::new(id, shared).run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        log::error!("could not spawn {}: {}", id, err);
                        shared.abort();
                        return Err(EngineError::Spawn(err));
                    }
                }
            }

            let controller = join(controller);
            if controller.is_err() {
                // workers would wait for restocks forever
                shared.abort();
            }
            let workers = handles
                .into_iter()
                .map(join)
                .collect::<Result<Vec<_>, _>>();
            Ok((controller?, workers?))
        })?;

        let report = RunReport {
            placements: shared.levels.placements(),
            workers,
            controller,
            elapsed: started.elapsed(),
        };
        log::info!(
            "run finished: {} placements {:?} in {:?}",
            report.total_placements(),
            report.placements,
            report.elapsed
        );
        Ok(report)
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> Result<T, EngineError> {
    let thread = handle.thread().name().unwrap_or("<unnamed>").to_string();
    handle.join().map_err(|_| {
        log::error!("{} panicked", thread);
        EngineError::Panicked { thread }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacer::NoPause;
    use crate::sink::NullSink;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.worker_count = 0;
        assert!(matches!(
            Engine::new(config, NullSink),
            Err(ConfigError::ZeroWorkers)
        ));
    }

    #[test]
    fn test_run_fills_every_level() {
        let config = EngineConfig::new(&[2, 1, 1], &[3, 2, 2], 4, 3).unwrap();
        let report = Engine::new(config, NullSink)
            .unwrap()
            .with_pacer(NoPause)
            .run()
            .unwrap();
        assert_eq!(report.placements, vec![3, 2, 2]);
        assert_eq!(report.workers.len(), 3);
        assert!(report.controller.completed);
        let placed: usize = report.workers.iter().map(|w| w.placements).sum();
        assert_eq!(placed, 7);
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::Panicked {
            thread: "worker-1".into(),
        };
        assert_eq!(err.to_string(), "thread worker-1 panicked");
    }
}
