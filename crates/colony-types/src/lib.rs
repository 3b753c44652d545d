//! Shared type definitions for the colony assignment engine.
//!
//! This crate is the single source of truth for the data model exchanged
//! between the environment, the engine, and the record store. Types flow
//! to `TypeScript` via `ts-rs` for dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents and world objects
//! - [`enums`] -- Tasks, capabilities, modes, phases, lease and structure kinds
//! - [`structs`] -- Agents, persisted records, leases, and the [`WorldSnapshot`]

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Anchor, Capability, LeaseKind, Mode, Phase, StructureKind, TaskKind, TaskStatus};
pub use ids::{AgentId, ObjectId};
pub use structs::{
    AgentRecord, AgentView, CarryStore, ConstructionSite, Hostile, Lease, Position, ResourceNode,
    Structure, WorldSnapshot,
};
