//! Scenario files: the initial world the engine binary runs against.
//!
//! Scenario YAML uses small integer ids so files stay readable; they are
//! widened into the UUID-backed ids of the data model on load.
//!
//! ```yaml
//! development_level: 2
//! agents:
//!   - { id: 1, x: 10, y: 10, carry: 50, capabilities: [work, carry] }
//! nodes:
//!   - { id: 100, x: 4, y: 7, capacity: 3000, regen_per_cycle: 10 }
//! structures:
//!   - { id: 200, kind: controller, x: 20, y: 20 }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use colony_types::{
    AgentId, AgentRecord, AgentView, Anchor, Capability, CarryStore, ConstructionSite, Hostile,
    ObjectId, Position, ResourceNode, Structure, StructureKind, WorldSnapshot,
};
use serde::Deserialize;

use crate::error::EngineError;

/// The initial world.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Starting development level.
    #[serde(default)]
    pub development_level: u32,
    /// Agents present at cycle 0.
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    /// Resource nodes.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Structures.
    #[serde(default)]
    pub structures: Vec<StructureSpec>,
    /// Construction sites.
    #[serde(default)]
    pub sites: Vec<SiteSpec>,
    /// Hostiles present at cycle 0.
    #[serde(default)]
    pub hostiles: Vec<HostileSpec>,
}

/// One agent in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    /// Agent id.
    pub id: u64,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Carry capacity.
    #[serde(default = "default_carry")]
    pub carry: u32,
    /// Body capabilities.
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

/// One resource node in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    /// Node id.
    pub id: u64,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Maximum units held; the node starts full.
    pub capacity: u32,
    /// Units regenerated per cycle.
    #[serde(default)]
    pub regen_per_cycle: u32,
}

/// One structure in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureSpec {
    /// Structure id.
    pub id: u64,
    /// Structure kind.
    pub kind: StructureKind,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Energy stored at start.
    #[serde(default)]
    pub stored: u32,
    /// Energy capacity; defaults by kind.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Hit points at start; defaults to full.
    #[serde(default)]
    pub hits: Option<u32>,
    /// Maximum hit points; defaults by kind.
    #[serde(default)]
    pub hits_max: Option<u32>,
    /// Peer facilities the structure sits next to.
    #[serde(default)]
    pub anchors: BTreeSet<Anchor>,
}

/// One construction site in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSpec {
    /// Site id.
    pub id: u64,
    /// What is being built.
    pub kind: StructureKind,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

/// One hostile in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct HostileSpec {
    /// Hostile id.
    pub id: u64,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Scenario {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parse a scenario from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        serde_yml::from_str(yaml).map_err(|e| EngineError::Scenario {
            message: format!("failed to parse scenario YAML: {e}"),
        })
    }

    /// Build the cycle-0 world.
    pub fn into_world(self) -> WorldSnapshot {
        let mut world = WorldSnapshot {
            cycle: 0,
            development_level: self.development_level,
            energy_available: 0,
            agents: self.agents.into_iter().map(AgentSpec::into_view).collect(),
            nodes: self.nodes.into_iter().map(NodeSpec::into_node).collect(),
            structures: self
                .structures
                .into_iter()
                .map(StructureSpec::into_structure)
                .collect(),
            sites: self
                .sites
                .into_iter()
                .map(|s| ConstructionSite {
                    id: object_id(s.id),
                    position: Position::new(s.x, s.y),
                    kind: s.kind,
                })
                .collect(),
            hostiles: self
                .hostiles
                .into_iter()
                .map(|h| Hostile {
                    id: object_id(h.id),
                    position: Position::new(h.x, h.y),
                })
                .collect(),
        };
        world.energy_available = crate::execution::spawn_energy(&world);
        world
    }
}

impl AgentSpec {
    fn into_view(self) -> AgentView {
        AgentView {
            id: AgentId::from_u128(u128::from(self.id)),
            position: Position::new(self.x, self.y),
            store: CarryStore::new(0, self.carry),
            capabilities: self.capabilities,
            record: AgentRecord::default(),
        }
    }
}

impl NodeSpec {
    fn into_node(self) -> ResourceNode {
        ResourceNode {
            id: object_id(self.id),
            position: Position::new(self.x, self.y),
            remaining: self.capacity,
            capacity: self.capacity,
            regen_per_cycle: self.regen_per_cycle,
            valid: true,
        }
    }
}

impl StructureSpec {
    fn into_structure(self) -> Structure {
        let hits_max = self.hits_max.unwrap_or_else(|| default_hits_max(self.kind));
        Structure {
            id: object_id(self.id),
            kind: self.kind,
            position: Position::new(self.x, self.y),
            stored: self.stored,
            capacity: self.capacity.unwrap_or_else(|| default_capacity(self.kind)),
            hits: self.hits.unwrap_or(hits_max),
            hits_max,
            owned: true,
            anchors: self.anchors,
        }
    }
}

/// Widen a scenario id into an object id.
pub fn object_id(id: u64) -> ObjectId {
    ObjectId::from_u128(u128::from(id))
}

/// Energy capacity a freshly built structure of `kind` gets.
pub const fn default_capacity(kind: StructureKind) -> u32 {
    match kind {
        StructureKind::Spawn => 300,
        StructureKind::Extension => 50,
        StructureKind::Container => 2_000,
        StructureKind::Storage => 1_000_000,
        StructureKind::Link => 800,
        StructureKind::Tower => 1_000,
        StructureKind::Controller
        | StructureKind::Road
        | StructureKind::Wall
        | StructureKind::Rampart => 0,
    }
}

/// Maximum hit points of a structure of `kind`. Controllers are never
/// repaired, so they report zero.
pub const fn default_hits_max(kind: StructureKind) -> u32 {
    match kind {
        StructureKind::Spawn => 5_000,
        StructureKind::Extension => 1_000,
        StructureKind::Container => 250_000,
        StructureKind::Storage => 10_000,
        StructureKind::Link | StructureKind::Tower => 3_000,
        StructureKind::Road => 5_000,
        StructureKind::Wall | StructureKind::Rampart => 300_000,
        StructureKind::Controller => 0,
    }
}

const fn default_carry() -> u32 {
    50
}
