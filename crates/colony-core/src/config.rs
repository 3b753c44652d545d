//! Configuration loading and typed config structures for the colony engine.
//!
//! The canonical configuration lives in `colony-config.yaml` at the project
//! root. Every field has a default, so an empty file yields the tuned
//! defaults: 50-cycle cooldown, 10-cycle lease window, 10:1 load-to-distance
//! weight, and the six-task table below.
//!
//! | Task    | Priority | Max | Requires    |
//! |---------|---------:|----:|-------------|
//! | upgrade | 10       | 8   | work, carry |
//! | defense | 9        | 2   | attack      |
//! | harvest | 8        | 4   | work, carry |
//! | store   | 7        | 4   | carry       |
//! | build   | 6        | 2   | work, carry |
//! | repair  | 5        | 1   | work, carry |

use std::collections::BTreeSet;
use std::path::Path;

use colony_types::{Capability, Mode, TaskKind};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `colony-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColonyConfig {
    /// Windows and weights of the assignment engine.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Mode classification thresholds.
    #[serde(default)]
    pub modes: ModeConfig,

    /// Task predicate and target thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Base task table. Declaration order breaks priority ties.
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TaskSpec>,

    /// Per-mode adjustments applied on top of the base table.
    #[serde(default = "default_overrides")]
    pub overrides: ModeOverrides,

    /// Settings for the engine binary.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            modes: ModeConfig::default(),
            thresholds: ThresholdConfig::default(),
            tasks: default_tasks(),
            overrides: default_overrides(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ColonyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `COLONY_RECORDS_PATH` overrides `runtime.records_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to `null`, which serde_yml rejects
        // for a struct.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.runtime.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.cooldown_window == 0 {
            return Err(invalid("engine.cooldown_window must be at least 1"));
        }
        if self.engine.lease_window == 0 {
            return Err(invalid("engine.lease_window must be at least 1"));
        }
        if self.engine.load_weight == 0 {
            return Err(invalid("engine.load_weight must be at least 1"));
        }

        let mut seen = BTreeSet::new();
        for spec in &self.tasks {
            if !seen.insert(spec.kind) {
                return Err(invalid(&format!("task {} is declared twice", spec.kind)));
            }
        }

        for mode in [Mode::Emergency, Mode::Bootstrap, Mode::Economy, Mode::Normal] {
            for adjustment in self.overrides.for_mode(mode) {
                if !seen.contains(&adjustment.task) {
                    return Err(invalid(&format!(
                        "{} override references task {} which is not in the table",
                        mode.as_str(),
                        adjustment.task
                    )));
                }
            }
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Windows and weights of the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Cycles a new commitment is protected from re-planning.
    #[serde(default = "default_cooldown_window")]
    pub cooldown_window: u64,

    /// Cycles a buffer lease is honored.
    #[serde(default = "default_lease_window")]
    pub lease_window: u64,

    /// Score units one committed agent adds to a node (one distance tile = 1).
    #[serde(default = "default_load_weight")]
    pub load_weight: u32,

    /// A buffer must hold strictly more than this to be drawn from.
    #[serde(default)]
    pub min_extractable: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_window: default_cooldown_window(),
            lease_window: default_lease_window(),
            load_weight: default_load_weight(),
            min_extractable: 0,
        }
    }
}

/// Mode classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModeConfig {
    /// Development levels strictly below this are [`Mode::Bootstrap`].
    #[serde(default = "default_bootstrap_below_level")]
    pub bootstrap_below_level: u32,

    /// Stockpiles strictly above this are [`Mode::Economy`].
    #[serde(default = "default_economy_stockpile")]
    pub economy_stockpile: u64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            bootstrap_below_level: default_bootstrap_below_level(),
            economy_stockpile: default_economy_stockpile(),
        }
    }
}

/// Task predicate and target thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ThresholdConfig {
    /// Non-fortification structures below this percentage of max hits need
    /// repair.
    #[serde(default = "default_repair_percent")]
    pub repair_percent: u32,

    /// Walls and ramparts below this percentage of max hits need repair.
    #[serde(default = "default_fortification_repair_percent")]
    pub fortification_repair_percent: u32,

    /// Repair only opens when colony energy is at least this.
    #[serde(default = "default_repair_energy_floor")]
    pub repair_energy_floor: u32,

    /// Towers are refilled only with more than this much free room.
    #[serde(default = "default_tower_refill_margin")]
    pub tower_refill_margin: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            repair_percent: default_repair_percent(),
            fortification_repair_percent: default_fortification_repair_percent(),
            repair_energy_floor: default_repair_energy_floor(),
            tower_refill_margin: default_tower_refill_margin(),
        }
    }
}

/// One row of the base task table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskSpec {
    /// Which task.
    pub kind: TaskKind,
    /// Higher is more urgent.
    pub priority: i32,
    /// Maximum concurrently executing agents.
    pub max_agents: u32,
    /// Capabilities an agent needs to take the task.
    #[serde(default)]
    pub requires: BTreeSet<Capability>,
}

/// A replacement of priority and/or maximum for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TaskOverride {
    /// Which task.
    pub task: TaskKind,
    /// New priority, if changed.
    #[serde(default)]
    pub priority: Option<i32>,
    /// New maximum, if changed.
    #[serde(default)]
    pub max_agents: Option<u32>,
}

/// Per-mode task adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModeOverrides {
    /// Adjustments while hostiles are present.
    #[serde(default)]
    pub emergency: Vec<TaskOverride>,
    /// Adjustments below the bootstrap development level.
    #[serde(default)]
    pub bootstrap: Vec<TaskOverride>,
    /// Adjustments with a large stockpile.
    #[serde(default)]
    pub economy: Vec<TaskOverride>,
    /// Adjustments in normal operation.
    #[serde(default)]
    pub normal: Vec<TaskOverride>,
}

impl ModeOverrides {
    /// The adjustments for a mode.
    pub fn for_mode(&self, mode: Mode) -> &[TaskOverride] {
        match mode {
            Mode::Emergency => &self.emergency,
            Mode::Bootstrap => &self.bootstrap,
            Mode::Economy => &self.economy,
            Mode::Normal => &self.normal,
        }
    }
}

/// Settings for the engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    /// Real-time milliseconds between cycles (0 = as fast as possible).
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Number of cycles to run before stopping.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    /// Path of the JSON record checkpoint.
    #[serde(default = "default_records_path")]
    pub records_path: String,

    /// Path of the scenario world file.
    #[serde(default = "default_scenario_path")]
    pub scenario_path: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval_ms(),
            max_cycles: default_max_cycles(),
            records_path: default_records_path(),
            scenario_path: default_scenario_path(),
        }
    }
}

impl RuntimeConfig {
    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("COLONY_RECORDS_PATH") {
            self.records_path = path;
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_cooldown_window() -> u64 {
    50
}

const fn default_lease_window() -> u64 {
    10
}

const fn default_load_weight() -> u32 {
    10
}

const fn default_bootstrap_below_level() -> u32 {
    3
}

const fn default_economy_stockpile() -> u64 {
    10_000
}

const fn default_repair_percent() -> u32 {
    90
}

const fn default_fortification_repair_percent() -> u32 {
    80
}

const fn default_repair_energy_floor() -> u32 {
    500
}

const fn default_tower_refill_margin() -> u32 {
    100
}

const fn default_cycle_interval_ms() -> u64 {
    0
}

const fn default_max_cycles() -> u64 {
    100
}

fn default_records_path() -> String {
    "colony-records.json".to_owned()
}

fn default_scenario_path() -> String {
    "colony-scenario.yaml".to_owned()
}

fn task(kind: TaskKind, priority: i32, max_agents: u32, requires: &[Capability]) -> TaskSpec {
    TaskSpec {
        kind,
        priority,
        max_agents,
        requires: requires.iter().copied().collect(),
    }
}

fn default_tasks() -> Vec<TaskSpec> {
    use Capability::{Attack, Carry, Work};
    vec![
        task(TaskKind::Upgrade, 10, 8, &[Work, Carry]),
        task(TaskKind::Defense, 9, 2, &[Attack]),
        task(TaskKind::Harvest, 8, 4, &[Work, Carry]),
        task(TaskKind::Store, 7, 4, &[Carry]),
        task(TaskKind::Build, 6, 2, &[Work, Carry]),
        task(TaskKind::Repair, 5, 1, &[Work, Carry]),
    ]
}

const fn adjust(task: TaskKind, priority: Option<i32>, max_agents: Option<u32>) -> TaskOverride {
    TaskOverride {
        task,
        priority,
        max_agents,
    }
}

fn default_overrides() -> ModeOverrides {
    ModeOverrides {
        emergency: vec![
            adjust(TaskKind::Defense, Some(10), None),
            adjust(TaskKind::Repair, Some(9), None),
        ],
        bootstrap: vec![
            adjust(TaskKind::Upgrade, Some(10), Some(8)),
            adjust(TaskKind::Build, Some(7), None),
        ],
        economy: vec![adjust(TaskKind::Store, Some(8), Some(4))],
        normal: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ColonyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.cooldown_window, 50);
        assert_eq!(config.engine.lease_window, 10);
        assert_eq!(config.engine.load_weight, 10);
        assert_eq!(config.tasks.len(), 6);
        assert_eq!(config.tasks.first().map(|t| t.kind), Some(TaskKind::Upgrade));
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ColonyConfig::parse("");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();
        assert_eq!(config.overrides.for_mode(Mode::Emergency).len(), 2);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "engine:\n  cooldown_window: 20\n";
        let config = ColonyConfig::parse(yaml).ok().unwrap_or_default();

        // Window is overridden
        assert_eq!(config.engine.cooldown_window, 20);
        // Everything else uses defaults
        assert_eq!(config.engine.lease_window, 10);
        assert_eq!(config.modes.bootstrap_below_level, 3);
        assert_eq!(config.tasks.len(), 6);
    }

    #[test]
    fn parse_custom_task_table() {
        let yaml = r"
tasks:
  - kind: upgrade
    priority: 10
    max_agents: 2
    requires: [work, carry]
  - kind: harvest
    priority: 8
    max_agents: 4
    requires: [work, carry]
overrides:
  emergency: []
  bootstrap: []
  economy: []
thresholds:
  repair_percent: 75
";
        let config = ColonyConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();
        assert_eq!(config.tasks.len(), 2);
        assert_eq!(config.tasks.first().map(|t| t.max_agents), Some(2));
        assert_eq!(config.thresholds.repair_percent, 75);
        assert_eq!(config.thresholds.fortification_repair_percent, 80);
    }

    #[test]
    fn rejects_zero_windows() {
        let err = ColonyConfig::parse("engine:\n  lease_window: 0\n");
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
        let err = ColonyConfig::parse("engine:\n  load_weight: 0\n");
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_duplicate_tasks() {
        let yaml = r"
tasks:
  - { kind: harvest, priority: 8, max_agents: 4 }
  - { kind: harvest, priority: 7, max_agents: 1 }
overrides: {}
";
        let err = ColonyConfig::parse(yaml);
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_override_for_missing_task() {
        // The default overrides mention defense and repair, which this
        // table omits.
        let yaml = r"
tasks:
  - { kind: harvest, priority: 8, max_agents: 4 }
";
        let err = ColonyConfig::parse(yaml);
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = ColonyConfig::parse("engine: [unclosed");
        assert!(matches!(err, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("colony-config.yaml");
        if path.exists() {
            let config = ColonyConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
