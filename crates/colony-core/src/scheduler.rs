//! Task ranking and capacity accounting.
//!
//! The base table from config is adjusted for the cycle's mode, then sorted
//! by descending priority with a stable sort so equal priorities keep table
//! order. A task is open when its world predicate holds and fewer agents
//! execute it than its maximum allows.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use colony_types::{AgentView, Capability, Mode, TaskKind, WorldSnapshot};

use crate::config::ColonyConfig;
use crate::index::CycleIndex;
use crate::targets;

/// One row of the effective task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Which task.
    pub kind: TaskKind,
    /// Effective priority after mode overrides.
    pub priority: i32,
    /// Effective maximum after mode overrides.
    pub max_agents: u32,
    /// Capabilities required to take the task.
    pub requires: BTreeSet<Capability>,
}

/// The effective task table for one mode, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTable {
    entries: Vec<TaskEntry>,
}

impl TaskTable {
    /// Apply the mode's overrides to the base table and rank it.
    pub fn for_mode(config: &ColonyConfig, mode: Mode) -> Self {
        let mut entries: Vec<TaskEntry> = config
            .tasks
            .iter()
            .map(|spec| TaskEntry {
                kind: spec.kind,
                priority: spec.priority,
                max_agents: spec.max_agents,
                requires: spec.requires.clone(),
            })
            .collect();

        for adjustment in config.overrides.for_mode(mode) {
            if let Some(entry) = entries.iter_mut().find(|e| e.kind == adjustment.task) {
                if let Some(priority) = adjustment.priority {
                    entry.priority = priority;
                }
                if let Some(max_agents) = adjustment.max_agents {
                    entry.max_agents = max_agents;
                }
            }
        }

        // Stable: equal priorities keep declaration order.
        entries.sort_by_key(|e| Reverse(e.priority));
        Self { entries }
    }

    /// Rows in rank order.
    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    /// The row for `kind`, if the table has one.
    pub fn entry(&self, kind: TaskKind) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

/// A task with room for more agents this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTask {
    /// Which task.
    pub kind: TaskKind,
    /// Agents it can still take.
    pub remaining: u32,
}

/// Ranks tasks and tracks which are open.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    table: TaskTable,
    executable: BTreeMap<TaskKind, bool>,
}

impl TaskScheduler {
    /// Build the scheduler for one cycle, evaluating world predicates once.
    pub fn new(config: &ColonyConfig, mode: Mode, snapshot: &WorldSnapshot) -> Self {
        let table = TaskTable::for_mode(config, mode);
        let executable = table
            .entries()
            .iter()
            .map(|e| (e.kind, world_predicate(e.kind, snapshot, config)))
            .collect();
        Self { table, executable }
    }

    /// Position of `task` in the effective table, highest priority first.
    pub fn rank(&self, task: TaskKind) -> Option<usize> {
        self.table.entries().iter().position(|e| e.kind == task)
    }

    /// Whether `task` is below its maximum this cycle.
    pub fn has_room(&self, task: TaskKind, index: &CycleIndex) -> bool {
        self.table
            .entry(task)
            .is_some_and(|e| index.occupancy(task) < e.max_agents)
    }

    /// Whether the world currently supports `task` at all.
    pub fn is_executable(&self, task: TaskKind) -> bool {
        self.executable.get(&task).copied().unwrap_or(false)
    }

    /// Executable tasks below their maximum, highest priority first.
    pub fn ranked_open_tasks(&self, index: &CycleIndex) -> Vec<OpenTask> {
        self.table
            .entries()
            .iter()
            .filter(|e| self.is_executable(e.kind))
            .filter_map(|e| {
                let remaining = e.max_agents.saturating_sub(index.occupancy(e.kind));
                (remaining > 0).then_some(OpenTask {
                    kind: e.kind,
                    remaining,
                })
            })
            .collect()
    }

    /// Executable tasks already at their maximum.
    pub fn saturated_tasks(&self, index: &CycleIndex) -> Vec<TaskKind> {
        self.table
            .entries()
            .iter()
            .filter(|e| self.is_executable(e.kind) && index.occupancy(e.kind) >= e.max_agents)
            .map(|e| e.kind)
            .collect()
    }

    /// Whether `agent` may take `task`: it has the capabilities and passes
    /// the task's per-agent predicate.
    pub fn accepts(&self, task: TaskKind, agent: &AgentView) -> bool {
        let Some(entry) = self.table.entry(task) else {
            return false;
        };
        agent.qualifies(&entry.requires) && agent_predicate(task, agent)
    }
}

/// The part of a task's predicate that depends only on the world.
pub fn world_predicate(task: TaskKind, snapshot: &WorldSnapshot, config: &ColonyConfig) -> bool {
    let min = config.engine.min_extractable;
    let any_node = || snapshot.nodes.iter().any(|n| n.is_harvestable());
    match task {
        TaskKind::Harvest => any_node(),
        TaskKind::Upgrade => {
            snapshot.controller().is_some()
                && (any_node()
                    || snapshot.structures.iter().any(|s| {
                        targets::supply_tier(TaskKind::Upgrade, s).is_some()
                            && targets::is_supply_buffer(s, min)
                    }))
        }
        TaskKind::Store => snapshot
            .structures
            .iter()
            .any(|s| targets::fill_tier(s, &config.thresholds).is_some()),
        TaskKind::Build => !snapshot.sites.is_empty(),
        TaskKind::Repair => {
            snapshot.energy_available >= config.thresholds.repair_energy_floor
                && snapshot
                    .structures
                    .iter()
                    .any(|s| targets::needs_repair(s, &config.thresholds))
        }
        TaskKind::Defense => !snapshot.hostiles.is_empty(),
    }
}

/// The part of a task's predicate that depends on the requesting agent.
pub const fn agent_predicate(task: TaskKind, agent: &AgentView) -> bool {
    match task {
        TaskKind::Harvest => agent.store.free() > 0,
        _ => true,
    }
}
