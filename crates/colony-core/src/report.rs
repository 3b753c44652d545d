//! Per-cycle outcome of the assignment engine.
//!
//! Nothing in the assignment path fails: every recovery shows up here as a
//! [`Note`] and in the logs, never as an error.

use std::collections::BTreeMap;

use colony_types::{AgentId, AgentRecord, Mode, ObjectId, Phase, TaskKind};
use serde::{Deserialize, Serialize};

/// What the engine did with one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The existing commitment was still valid and kept.
    Reaffirmed {
        /// Kept task.
        task: TaskKind,
        /// Kept target.
        target: ObjectId,
    },
    /// A new commitment was written.
    Committed {
        /// New task.
        task: TaskKind,
        /// New target.
        target: ObjectId,
        /// What the agent does there.
        phase: Phase,
    },
    /// No commitment this cycle.
    Idle,
}

impl Decision {
    /// The (task, target) pair the agent holds after this cycle.
    pub const fn assignment(&self) -> Option<(TaskKind, ObjectId)> {
        match *self {
            Self::Reaffirmed { task, target } | Self::Committed { task, target, .. } => {
                Some((task, target))
            }
            Self::Idle => None,
        }
    }
}

/// A locally recovered condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Note {
    /// An open task had no qualifying target for the agent.
    NoCandidate {
        /// Affected agent.
        agent: AgentId,
        /// Task without a target.
        task: TaskKind,
    },
    /// The committed target vanished or stopped qualifying.
    TargetInvalidated {
        /// Affected agent.
        agent: AgentId,
        /// Task of the dropped commitment.
        task: TaskKind,
        /// The dropped target.
        target: ObjectId,
    },
    /// The commitment's phase was complete.
    TaskFinished {
        /// Affected agent.
        agent: AgentId,
        /// Task of the finished commitment.
        task: TaskKind,
        /// Target of the finished commitment.
        target: ObjectId,
    },
    /// The commitment outlived its cooldown.
    CooldownExpired {
        /// Affected agent.
        agent: AgentId,
        /// Task of the expired commitment.
        task: TaskKind,
        /// Target of the expired commitment.
        target: ObjectId,
    },
    /// The agent qualified for a task that was already full.
    CapacityExhausted {
        /// Affected agent.
        agent: AgentId,
        /// The full task.
        task: TaskKind,
    },
    /// A lease lapsed or its predicate failed and was dropped.
    StaleLease {
        /// Affected agent.
        agent: AgentId,
        /// The formerly leased target.
        target: ObjectId,
    },
}

impl Note {
    /// The agent the note is about.
    pub const fn agent(&self) -> AgentId {
        match *self {
            Self::NoCandidate { agent, .. }
            | Self::TargetInvalidated { agent, .. }
            | Self::TaskFinished { agent, .. }
            | Self::CooldownExpired { agent, .. }
            | Self::CapacityExhausted { agent, .. }
            | Self::StaleLease { agent, .. } => agent,
        }
    }
}

/// Everything one call to the engine produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Cycle the report belongs to.
    pub cycle: u64,
    /// Mode the cycle ran in.
    pub mode: Mode,
    /// Decision per agent.
    pub decisions: BTreeMap<AgentId, Decision>,
    /// Updated persisted record per agent.
    pub records: BTreeMap<AgentId, AgentRecord>,
    /// Executing agents per task after the cycle.
    pub occupancy: BTreeMap<TaskKind, u32>,
    /// Recovered conditions, in processing order.
    pub notes: Vec<Note>,
}

impl CycleReport {
    /// Empty report for `cycle`.
    pub const fn new(cycle: u64, mode: Mode) -> Self {
        Self {
            cycle,
            mode,
            decisions: BTreeMap::new(),
            records: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    /// The (task, target) pair `agent` holds after this cycle.
    pub fn assignment(&self, agent: AgentId) -> Option<(TaskKind, ObjectId)> {
        self.decisions.get(&agent).and_then(Decision::assignment)
    }

    /// Agents with no commitment after this cycle.
    pub fn idle_count(&self) -> usize {
        self.decisions
            .values()
            .filter(|d| matches!(d, Decision::Idle))
            .count()
    }

    /// Agents that got a new commitment this cycle.
    pub fn committed_count(&self) -> usize {
        self.decisions
            .values()
            .filter(|d| matches!(d, Decision::Committed { .. }))
            .count()
    }

    /// Agents assigned to `task` after this cycle.
    pub fn agents_on(&self, task: TaskKind) -> usize {
        self.decisions
            .values()
            .filter(|d| d.assignment().is_some_and(|(t, _)| t == task))
            .count()
    }

    /// Emit the one-line cycle summary.
    pub fn log_summary(&self) {
        let reaffirmed = self
            .decisions
            .len()
            .saturating_sub(self.idle_count())
            .saturating_sub(self.committed_count());
        tracing::info!(
            cycle = self.cycle,
            mode = self.mode.as_str(),
            agents = self.decisions.len(),
            committed = self.committed_count(),
            reaffirmed,
            idle = self.idle_count(),
            notes = self.notes.len(),
            "Cycle assigned"
        );
    }
}
