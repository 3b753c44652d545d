//! JSON checkpoint file.
//!
//! The whole record map is written to `<path>.tmp` and renamed over `path`,
//! so a crash mid-write leaves the previous checkpoint intact. A missing
//! file is an empty store, which is what a first run looks like.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colony_types::AgentId;
use serde::{Deserialize, Serialize};

use crate::{RecordMap, RecordStore, StoreError, retain_alive};

/// On-disk layout of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCheckpoint {
    /// Cycle the records were produced by.
    pub cycle: u64,
    /// Wall-clock time of the write.
    pub saved_at: DateTime<Utc>,
    /// Per-agent records.
    #[serde(default)]
    pub records: RecordMap,
}

/// Records persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open a store backed by `path`. The file is not touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The checkpoint path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full checkpoint, or `None` if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    /// Returns [`StoreError::Serialization`] if it is not a valid checkpoint.
    pub async fn load_checkpoint(&self) -> Result<Option<RecordCheckpoint>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint: RecordCheckpoint = serde_json::from_slice(&bytes)?;
        Ok(Some(checkpoint))
    }

    async fn write_checkpoint(&self, checkpoint: &RecordCheckpoint) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(checkpoint)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            cycle = checkpoint.cycle,
            records = checkpoint.records.len(),
            "Checkpoint written"
        );
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<RecordMap, StoreError> {
        Ok(self
            .load_checkpoint()
            .await?
            .map(|c| c.records)
            .unwrap_or_default())
    }

    async fn save(&self, cycle: u64, records: &RecordMap) -> Result<(), StoreError> {
        let checkpoint = RecordCheckpoint {
            cycle,
            saved_at: Utc::now(),
            records: records.clone(),
        };
        self.write_checkpoint(&checkpoint).await
    }

    async fn prune(&self, alive: &BTreeSet<AgentId>) -> Result<usize, StoreError> {
        let Some(mut checkpoint) = self.load_checkpoint().await? else {
            return Ok(0);
        };
        let dropped = retain_alive(&mut checkpoint.records, alive);
        if dropped > 0 {
            checkpoint.saved_at = Utc::now();
            self.write_checkpoint(&checkpoint).await?;
            tracing::info!(dropped, "Pruned records of absent agents");
        }
        Ok(dropped)
    }
}
