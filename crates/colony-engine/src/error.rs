//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode of startup and the cycle loop. The assignment itself never fails;
//! only configuration, scenario loading, and record persistence can.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: colony_core::ConfigError,
    },

    /// The scenario file could not be read or parsed.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of the scenario failure.
        message: String,
    },

    /// Loading or saving agent records failed.
    #[error("record store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: colony_store::StoreError,
    },
}
