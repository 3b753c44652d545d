//! Engine binary for the colony assignment engine.
//!
//! Loads configuration and a scenario world, restores persisted agent
//! records, and runs the assignment engine cycle by cycle against a toy
//! execution layer until the configured cycle budget is spent.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `colony-config.yaml` (or `COLONY_CONFIG`)
//! 3. Load the scenario world
//! 4. Open the record store and restore records of living agents
//! 5. Run the cycle loop
//! 6. Log the result

mod error;
mod execution;
mod runner;
mod scenario;

use std::path::{Path, PathBuf};

use colony_core::{AssignmentEngine, ColonyConfig};
use colony_store::JsonFileStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::scenario::Scenario;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the scenario, or the record store
/// cannot be loaded, or if a checkpoint cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging. `COLONY_LOG_FORMAT=json` switches
    //    to one JSON object per line.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("COLONY_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("colony-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        cooldown_window = config.engine.cooldown_window,
        lease_window = config.engine.lease_window,
        load_weight = config.engine.load_weight,
        tasks = config.tasks.len(),
        max_cycles = config.runtime.max_cycles,
        "Configuration loaded"
    );

    // 3. Load the scenario.
    let scenario_path = Path::new(&config.runtime.scenario_path);
    let mut world = Scenario::from_file(scenario_path)?.into_world();
    info!(
        path = %scenario_path.display(),
        agents = world.agents.len(),
        nodes = world.nodes.len(),
        structures = world.structures.len(),
        "Scenario loaded"
    );

    // 4. Restore records.
    let store = JsonFileStore::new(&config.runtime.records_path);
    runner::restore_records(&mut world, &store).await?;

    // 5. Run.
    let engine = AssignmentEngine::new(config);
    let summary = runner::run(&engine, &mut world, &store).await?;

    // 6. Log results.
    if let Some(report) = &summary.last_report {
        info!(
            cycle = report.cycle,
            mode = report.mode.as_str(),
            occupancy = ?report.occupancy,
            "Final assignment"
        );
    }
    info!(
        cycles = summary.cycles,
        development_level = world.development_level,
        "colony-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration.
///
/// The path comes from `COLONY_CONFIG`, defaulting to `colony-config.yaml`
/// in the working directory. A missing file means defaults.
fn load_config() -> Result<ColonyConfig, EngineError> {
    let config_path = std::env::var("COLONY_CONFIG")
        .map_or_else(|_| PathBuf::from("colony-config.yaml"), PathBuf::from);
    if config_path.exists() {
        let config = ColonyConfig::from_file(&config_path)?;
        Ok(config)
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        Ok(ColonyConfig::parse("")?)
    }
}
