//! Shared error taxonomy for the pipeline's ambient concerns: configuration
//! loading, subprocess execution, and rate limiting. Component-specific
//! errors (store, docs monitor, source monitor, orchestrator) live in their
//! own crates and convert into this one only at the CLI boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdcError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("subprocess '{command}' timed out after {timeout_secs}s")]
    ProcessTimeout { command: String, timeout_secs: u64 },

    #[error("subprocess '{command}' failed to start: {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CdcError>;
