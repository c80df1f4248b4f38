//! Capability seams between the client layer and its collaborators

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{
    BackendError, BackendMetadata, DecryptAuthorization, DecryptionResult, EncryptedInputs,
    EphemeralKeypair, InputRequest, MockInstanceParams, ModuleError, RelayerConfig,
    UserDecryptRequest,
};

/// Which backend produced an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local deterministic backend for development chains
    Mock,
    /// Production backend served by the remote relayer module
    Relayer,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Mock => write!(f, "mock"),
            BackendKind::Relayer => write!(f, "relayer"),
        }
    }
}

/// Wallet network handle supplied by the host application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletProvider {
    /// JSON-RPC endpoint the wallet is connected through
    pub rpc_url: String,
}

impl WalletProvider {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }
}

/// A computation instance bound to one (provider, chain id) pair
#[async_trait]
pub trait FhevmInstance: Send + Sync + fmt::Debug {
    fn backend(&self) -> BackendKind;

    fn chain_id(&self) -> u64;

    /// Encrypt every value of `request`, returning one handle per value
    /// and a single proof covering all of them.
    async fn encrypt(&self, request: &InputRequest) -> Result<EncryptedInputs, BackendError>;

    /// Fresh keypair for one decrypt request
    fn generate_keypair(&self) -> EphemeralKeypair;

    /// Build the payload the requester signs to authorize a decrypt
    fn create_eip712(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> DecryptAuthorization;

    /// Serve a signed user-decrypt request. All-or-nothing: an error means
    /// no handle was decrypted.
    async fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
    ) -> Result<DecryptionResult, BackendError>;
}

pub type SharedInstance = Arc<dyn FhevmInstance>;

/// Remote production module
///
/// `initialize` must be idempotent and must complete before
/// `create_instance` is called.
#[async_trait]
pub trait RelayerModule: Send + Sync {
    async fn initialize(&self) -> Result<(), ModuleError>;

    /// Pure configuration construction, no I/O
    ///
    /// `base` is the configured production network; the default binds it to
    /// the wallet network unchanged.
    fn build_config(&self, base: &RelayerConfig, network: &WalletProvider) -> RelayerConfig {
        base.clone().with_network(network.clone())
    }

    async fn create_instance(&self, config: RelayerConfig) -> Result<SharedInstance, ModuleError>;
}

/// Constructor for the local deterministic backend
#[async_trait]
pub trait MockInstanceFactory: Send + Sync {
    async fn create_mock_instance(
        &self,
        params: MockInstanceParams,
    ) -> Result<SharedInstance, BackendError>;
}

/// Side-channel query for local backend metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `None` when the endpoint is unreachable or has no metadata
    async fn fetch_metadata(&self, rpc_url: &str) -> Option<BackendMetadata>;
}
