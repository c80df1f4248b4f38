//! Client error taxonomy

use fhevm_core::{ModuleError, SignerError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FhevmError {
    /// Local backend metadata could not be obtained
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Remote module failed to load, initialize or instantiate
    #[error("SDK load failure: {0}")]
    SdkLoadFailure(String),

    #[error("Instance not ready")]
    InstanceNotReady,

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("User rejected the decrypt authorization")]
    UserRejected,

    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Signer failed for a reason other than the user declining
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ModuleError> for FhevmError {
    fn from(err: ModuleError) -> Self {
        FhevmError::SdkLoadFailure(err.to_string())
    }
}

impl From<SignerError> for FhevmError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Rejected => FhevmError::UserRejected,
            SignerError::Failed(msg) => FhevmError::Wallet(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, FhevmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_error_mapping() {
        assert_eq!(FhevmError::from(SignerError::Rejected), FhevmError::UserRejected);
        assert_eq!(
            FhevmError::from(SignerError::Failed("locked".into())),
            FhevmError::Wallet("locked".into())
        );
    }

    #[test]
    fn test_module_error_is_load_failure() {
        let err = FhevmError::from(ModuleError::Init("wasm trap".into()));
        assert!(matches!(err, FhevmError::SdkLoadFailure(ref m) if m.contains("wasm trap")));
    }
}
