//! Core entity structs: agents and their persisted records, resource nodes,
//! structures, and the per-cycle [`WorldSnapshot`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Anchor, Capability, LeaseKind, Phase, StructureKind, TaskKind, TaskStatus};
use crate::ids::{AgentId, ObjectId};

// ---------------------------------------------------------------------------
// Geometry and stores
// ---------------------------------------------------------------------------

/// A tile on the colony grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev range: the number of grid moves between two tiles.
    pub const fn range_to(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

/// Used and total capacity of an agent's resource store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CarryStore {
    /// Units currently held.
    pub used: u32,
    /// Maximum units the agent can hold.
    pub capacity: u32,
}

impl CarryStore {
    /// Create a store holding `used` of `capacity`.
    pub const fn new(used: u32, capacity: u32) -> Self {
        Self { used, capacity }
    }

    /// Remaining room.
    pub const fn free(self) -> u32 {
        self.capacity.saturating_sub(self.used)
    }

    /// No room left.
    pub const fn is_full(self) -> bool {
        self.free() == 0
    }

    /// Nothing held.
    pub const fn is_empty(self) -> bool {
        self.used == 0
    }
}

// ---------------------------------------------------------------------------
// Persisted agent record
// ---------------------------------------------------------------------------

/// A short-lived claim on a transient target (a depleting buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Lease {
    /// The leased target.
    pub target: ObjectId,
    /// Whether the agent withdraws from or deposits into the target.
    pub kind: LeaseKind,
    /// First cycle at which the lease is no longer honored.
    pub expires_at: u64,
}

impl Lease {
    /// The lease window has elapsed.
    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// The durable scheduling state of one agent.
///
/// This record survives across cycles and process restarts. Only the
/// assignment engine writes it, and only for its own agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentRecord {
    /// Committed task, if any.
    #[serde(default)]
    pub task: Option<TaskKind>,
    /// Committed target, if any.
    #[serde(default)]
    pub target: Option<ObjectId>,
    /// What the agent does with the target.
    #[serde(default)]
    pub phase: Option<Phase>,
    /// Whether the agent counts toward its task's occupancy.
    #[serde(default)]
    pub status: TaskStatus,
    /// Last cycle on which the commitment is protected from re-planning.
    #[serde(default)]
    pub cooldown_expiry: u64,
    /// Optional short-lived target lease.
    #[serde(default)]
    pub lease: Option<Lease>,
}

impl AgentRecord {
    /// The agent holds a (task, target) commitment it is executing.
    pub const fn is_committed(&self) -> bool {
        self.task.is_some() && self.target.is_some() && matches!(self.status, TaskStatus::Executing)
    }

    /// Clear the commitment and lease, keeping the cooldown expiry untouched.
    pub const fn clear(&mut self) {
        self.task = None;
        self.target = None;
        self.phase = None;
        self.status = TaskStatus::Idle;
        self.lease = None;
    }
}

// ---------------------------------------------------------------------------
// Observed world
// ---------------------------------------------------------------------------

/// One agent as observed at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentView {
    /// Agent identity.
    pub id: AgentId,
    /// Current tile.
    pub position: Position,
    /// Resource store.
    pub store: CarryStore,
    /// What the agent's body can do.
    pub capabilities: BTreeSet<Capability>,
    /// Persisted scheduling record from the previous cycle.
    #[serde(default)]
    pub record: AgentRecord,
}

impl AgentView {
    /// Whether the agent has every capability in `required`.
    pub fn qualifies(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }
}

/// A location yielding a regenerating resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceNode {
    /// Node identity.
    pub id: ObjectId,
    /// Node tile.
    pub position: Position,
    /// Units currently extractable.
    pub remaining: u32,
    /// Maximum units the node holds.
    pub capacity: u32,
    /// Units regenerated per cycle.
    pub regen_per_cycle: u32,
    /// False once the node has been destroyed or disabled.
    #[serde(default = "default_true")]
    pub valid: bool,
}

impl ResourceNode {
    /// Valid and not exhausted.
    pub const fn is_harvestable(&self) -> bool {
        self.valid && self.remaining > 0
    }
}

/// A fixed facility that stores, accepts, or provides resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Structure {
    /// Structure identity.
    pub id: ObjectId,
    /// Structure classification.
    pub kind: StructureKind,
    /// Structure tile.
    pub position: Position,
    /// Energy currently stored.
    #[serde(default)]
    pub stored: u32,
    /// Energy capacity (zero for structures that hold nothing).
    #[serde(default)]
    pub capacity: u32,
    /// Current hit points.
    pub hits: u32,
    /// Maximum hit points.
    pub hits_max: u32,
    /// Whether the colony owns this structure.
    #[serde(default = "default_true")]
    pub owned: bool,
    /// Peer facilities this structure sits next to.
    #[serde(default)]
    pub anchors: BTreeSet<Anchor>,
}

impl Structure {
    /// Remaining energy room.
    pub const fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.stored)
    }

    /// Hits are strictly below `percent` of `hits_max`.
    pub fn is_below(&self, percent: u32) -> bool {
        let hits = u64::from(self.hits).saturating_mul(100);
        let limit = u64::from(self.hits_max).saturating_mul(u64::from(percent));
        hits < limit
    }

    /// Sits next to the given peer facility.
    pub fn is_near(&self, anchor: Anchor) -> bool {
        self.anchors.contains(&anchor)
    }
}

/// A pending construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConstructionSite {
    /// Site identity.
    pub id: ObjectId,
    /// Site tile.
    pub position: Position,
    /// What is being built.
    pub kind: StructureKind,
}

/// A hostile unit inside the colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Hostile {
    /// Hostile identity.
    pub id: ObjectId,
    /// Hostile tile.
    pub position: Position,
}

/// Read-only view of the colony handed to the engine at the start of a
/// cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// Current cycle number.
    pub cycle: u64,
    /// Coarse development level (controller level).
    #[serde(default)]
    pub development_level: u32,
    /// Energy available for spending across spawns and extensions.
    #[serde(default)]
    pub energy_available: u32,
    /// All living agents.
    #[serde(default)]
    pub agents: Vec<AgentView>,
    /// All resource nodes.
    #[serde(default)]
    pub nodes: Vec<ResourceNode>,
    /// All structures.
    #[serde(default)]
    pub structures: Vec<Structure>,
    /// All construction sites.
    #[serde(default)]
    pub sites: Vec<ConstructionSite>,
    /// All hostiles.
    #[serde(default)]
    pub hostiles: Vec<Hostile>,
}

impl WorldSnapshot {
    /// Look up a resource node.
    pub fn node(&self, id: ObjectId) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a structure.
    pub fn structure(&self, id: ObjectId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    /// Look up a construction site.
    pub fn site(&self, id: ObjectId) -> Option<&ConstructionSite> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Look up a hostile.
    pub fn hostile(&self, id: ObjectId) -> Option<&Hostile> {
        self.hostiles.iter().find(|h| h.id == id)
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Tile of any world object, if it is present.
    pub fn position_of(&self, id: ObjectId) -> Option<Position> {
        self.node(id)
            .map(|n| n.position)
            .or_else(|| self.structure(id).map(|s| s.position))
            .or_else(|| self.site(id).map(|s| s.position))
            .or_else(|| self.hostile(id).map(|h| h.position))
    }

    /// The owned controller, if any.
    pub fn controller(&self) -> Option<&Structure> {
        self.structures
            .iter()
            .find(|s| s.kind == StructureKind::Controller && s.owned)
    }

    /// Total energy held in owned storage structures.
    pub fn stockpile(&self) -> u64 {
        self.structures
            .iter()
            .filter(|s| s.kind == StructureKind::Storage && s.owned)
            .fold(0_u64, |acc, s| acc.saturating_add(u64::from(s.stored)))
    }
}

const fn default_true() -> bool {
    true
}
