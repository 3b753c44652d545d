//! Error types for the record store.

/// Errors that can occur while loading or saving records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing, or renaming the checkpoint file failed.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
