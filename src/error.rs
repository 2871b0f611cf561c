//! Typed errors for the two fatal error categories: configuration errors
//! and persistence errors. Per-task failures are
//! intentionally not represented here — they are logged and counted, never
//! propagated as a `BenchmarkError` (see `runner.rs`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load question file {path}: {source}")]
    DatasetLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load model registry {path}: {source}")]
    RegistryLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no eligible vendor: none of the configured vendors have both an API key and an allow-listed entry")]
    NoEligibleVendor,

    #[error("failed to persist results to {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}
