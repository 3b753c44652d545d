//! Enumeration types for the colony assignment engine.
//!
//! Task kinds, capabilities, and modes replace the string-keyed role names
//! and memory flags a scripted controller would use: dispatch becomes a
//! `match`, never string parsing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// A named category of work an agent can be committed to.
///
/// The declaration order here is the order of the default task table and
/// therefore the tie-break order between tasks of equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TaskKind {
    /// Feed energy into the colony controller.
    Upgrade,
    /// Engage hostiles present in the colony.
    Defense,
    /// Extract energy from a resource node.
    Harvest,
    /// Fill spawns, extensions, towers, and stockpiles.
    Store,
    /// Spend energy on construction sites.
    Build,
    /// Spend energy restoring damaged structures.
    Repair,
}

impl TaskKind {
    /// All task kinds in default declaration order.
    pub const ALL: [Self; 6] = [
        Self::Upgrade,
        Self::Defense,
        Self::Harvest,
        Self::Store,
        Self::Build,
        Self::Repair,
    ];

    /// Stable lowercase name used in logs and config files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Defense => "defense",
            Self::Harvest => "harvest",
            Self::Store => "store",
            Self::Build => "build",
            Self::Repair => "repair",
        }
    }

    /// Whether agents on this task draw directly from resource nodes and
    /// therefore count toward node load.
    pub const fn draws_from_nodes(self) -> bool {
        matches!(self, Self::Harvest | Self::Upgrade)
    }
}

impl core::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability an agent's body provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Capability {
    /// Can harvest, build, repair, and upgrade.
    Work,
    /// Can hold resources.
    Carry,
    /// Can engage hostiles.
    Attack,
}

/// Coarse situational classifier recomputed every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Mode {
    /// Hostiles are present.
    Emergency,
    /// The colony is below the bootstrap development level.
    Bootstrap,
    /// The stockpile is large enough to favour storing.
    Economy,
    /// Balanced development.
    Normal,
}

impl Mode {
    /// Stable lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Bootstrap => "bootstrap",
            Self::Economy => "economy",
            Self::Normal => "normal",
        }
    }
}

// ---------------------------------------------------------------------------
// Commitment state
// ---------------------------------------------------------------------------

/// What the agent is doing with its committed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Moving resource into the agent. Finished once the store is full.
    Acquire,
    /// Moving resource out of the agent. Finished once the store is empty.
    Deliver,
    /// Not capacity-driven (e.g. defense).
    Engage,
}

/// Execution status persisted with each agent record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TaskStatus {
    /// The agent holds a commitment and counts toward its task occupancy.
    Executing,
    /// No commitment this cycle.
    #[default]
    Idle,
}

/// The kind of a short-lived target lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LeaseKind {
    /// Withdraw from a buffer. Needs stock in the target and room in the agent.
    Acquire,
    /// Deposit into a buffer. Needs room in the target and stock in the agent.
    Deposit,
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// Classification of a fixed facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StructureKind {
    /// Produces new agents; accepts energy.
    Spawn,
    /// Extra spawn energy capacity.
    Extension,
    /// Small general-purpose buffer.
    Container,
    /// Large colony stockpile.
    Storage,
    /// Remote energy relay.
    Link,
    /// Defensive turret; accepts energy.
    Tower,
    /// The colony controller (upgrade target).
    Controller,
    /// Movement infrastructure.
    Road,
    /// Defensive wall.
    Wall,
    /// Defensive rampart.
    Rampart,
}

impl StructureKind {
    /// Walls and ramparts are repaired with a lower threshold than other
    /// structures.
    pub const fn is_fortification(self) -> bool {
        matches!(self, Self::Wall | Self::Rampart)
    }

    /// Structures whose construction sites are built before ordinary ones.
    pub const fn is_core(self) -> bool {
        matches!(
            self,
            Self::Spawn
                | Self::Extension
                | Self::Container
                | Self::Tower
                | Self::Storage
                | Self::Link
        )
    }
}

/// A peer facility a structure sits next to.
///
/// This is how relays are told apart: a link next to a spawn is a supply
/// buffer for haulers, a link next to the controller feeds upgraders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Anchor {
    /// Within reach of a resource node.
    Source,
    /// Within reach of the controller.
    Controller,
    /// Within reach of a spawn.
    Spawn,
}
