//! In-process record store.

use std::collections::BTreeSet;

use colony_types::AgentId;
use tokio::sync::RwLock;

use crate::{RecordMap, RecordStore, StoreError, retain_alive};

/// Records held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: RwLock<(u64, RecordMap)>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `records`.
    pub fn with_records(records: RecordMap) -> Self {
        Self {
            state: RwLock::new((0, records)),
        }
    }

    /// The cycle passed to the most recent save.
    pub async fn last_cycle(&self) -> u64 {
        self.state.read().await.0
    }
}

impl RecordStore for MemoryRecordStore {
    async fn load(&self) -> Result<RecordMap, StoreError> {
        Ok(self.state.read().await.1.clone())
    }

    async fn save(&self, cycle: u64, records: &RecordMap) -> Result<(), StoreError> {
        *self.state.write().await = (cycle, records.clone());
        Ok(())
    }

    async fn prune(&self, alive: &BTreeSet<AgentId>) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        Ok(retain_alive(&mut state.1, alive))
    }
}
