//! Error types for fhevm-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Rejection reported by a computation backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure while loading, initializing or instantiating the remote module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("module load failed: {0}")]
    Load(String),

    #[error("module initialization failed: {0}")]
    Init(String),

    #[error("instance creation failed: {0}")]
    Instance(String),
}

/// Failure reported by the wallet collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("user rejected the signature request")]
    Rejected,

    #[error("signing failed: {0}")]
    Failed(String),
}
