//! Ascent entry point.
//!
//! Runs the engine with the default configuration, adjusted through
//! `ASCENT_*` environment variables, and narrates progress on the console.

use std::process::ExitCode;

use ascent_common::EngineConfig;
use ascent_engine::console::{self, ConsoleLogger};
use ascent_engine::{Engine, LogSink};

fn main() -> ExitCode {
    let level = console::parse_level(std::env::var(console::ENV_LOG).ok().as_deref());
    if let Err(err) = ConsoleLogger::install(level) {
        eprintln!("logger already installed: {}", err);
    }

    let config = match EngineConfig::default().with_overrides(|key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    for (index, level) in config.levels.iter().enumerate() {
        log::info!(
            "level {}: {} scaffolding, {} placements",
            index + 1,
            level.scaffolding,
            level.placement
        );
    }

    let engine = match Engine::new(config, LogSink) {
        Ok(engine) => engine,
        Err(err) => {
            log::error!("invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match engine.run() {
        Ok(report) => {
            log::info!(
                "{} placements in {:?} ({} restocks)",
                report.total_placements(),
                report.elapsed,
                report.controller.restocks
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
