//! Durable storage for per-agent scheduling records.
//!
//! The assignment engine's only persistent state is one [`AgentRecord`] per
//! agent. It has to survive process restarts, so after every cycle the
//! records are written out as a checkpoint and read back at startup.
//!
//! ```text
//! startup ---- load() ----> records ---- prune(alive) ---> drop dead agents
//!                              |
//! each cycle  <-- save(cycle, records) --+
//! ```
//!
//! # Modules
//!
//! - [`memory`] -- In-process store, used by tests and dry runs
//! - [`json_file`] -- JSON checkpoint file with atomic replace
//! - [`error`] -- Shared error types
//!
//! [`AgentRecord`]: colony_types::AgentRecord

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use colony_types::{AgentId, AgentRecord};

pub mod error;
pub mod json_file;
pub mod memory;

pub use error::StoreError;
pub use json_file::{JsonFileStore, RecordCheckpoint};
pub use memory::MemoryRecordStore;

/// Records keyed by agent, in id order.
pub type RecordMap = BTreeMap<AgentId, AgentRecord>;

/// A place the engine's per-agent records are kept between cycles.
pub trait RecordStore {
    /// Read every stored record. An empty store yields an empty map.
    fn load(&self) -> impl Future<Output = Result<RecordMap, StoreError>> + Send;

    /// Replace the stored records with `records` as of `cycle`.
    fn save(
        &self,
        cycle: u64,
        records: &RecordMap,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drop records of agents not in `alive`, returning how many were
    /// removed.
    fn prune(
        &self,
        alive: &BTreeSet<AgentId>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Keep only the records of living agents, returning how many were dropped.
pub(crate) fn retain_alive(records: &mut RecordMap, alive: &BTreeSet<AgentId>) -> usize {
    let before = records.len();
    records.retain(|id, _| alive.contains(id));
    before.saturating_sub(records.len())
}
