//! fhevm-core: shared types for the confidential-computation client layer
//!
//! A computation instance encrypts plaintext values client-side before they
//! are written to the ledger, and decrypts ciphertext handles read back from
//! it. This crate holds the vocabulary every other crate speaks:
//!
//! - Handles and the FHE type table ([`FheType`], [`handle`])
//! - Encrypted inputs bound to a (contract, submitter) pair ([`InputRequest`])
//! - The signature-gated user-decrypt request ([`UserDecryptRequest`])
//! - Capability seams for backends, wallets and clocks ([`FhevmInstance`],
//!   [`RelayerModule`], [`MockInstanceFactory`], [`TypedDataSigner`])
//!
//! # Trust Model
//!
//! | Value | Leaves the client? |
//! |-------|--------------------|
//! | Plaintext input | NO - only the ciphertext handle and proof |
//! | Handle | YES - handles are public references |
//! | Ephemeral private key | NO - dropped (and zeroed) after the request |
//! | Decrypt authorization signature | YES - sent to the backend |
//!
//! The homomorphic cryptography itself is not implemented here; production
//! deployments supply it through [`RelayerModule`].

mod backend;
mod clock;
mod config;
mod decrypt;
mod error;
pub mod handle;
mod input;
mod metadata;
mod signer;
mod units;

pub use backend::{
    BackendKind, FhevmInstance, MetadataSource, MockInstanceFactory, RelayerModule,
    SharedInstance, WalletProvider,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FhevmConfig, RelayerConfig, DEFAULT_METADATA_METHOD, DEFAULT_MOCK_RPC_URL};
pub use decrypt::{
    decryption_domain, DecryptAuthorization, DecryptionResult, EphemeralKeypair,
    HandleContractPair, UserDecryptRequest, UserDecryptRequestVerification,
    DEFAULT_DURATION_DAYS, SECONDS_PER_DAY,
};
pub use error::{BackendError, Error, ModuleError, SignerError};
pub use handle::FheType;
pub use input::{EncryptedInput, EncryptedInputs, InputRequest, InputValue};
pub use metadata::{BackendMetadata, MockInstanceParams};
pub use signer::TypedDataSigner;
pub use units::{format_ether, format_units};

pub type Result<T> = std::result::Result<T, Error>;

/// 32-byte ciphertext handle
pub type Handle = alloy_primitives::B256;

/// Limits enforced by every backend on a single input context
pub mod constants {
    /// Maximum number of values in one encrypted input
    pub const MAX_INPUT_VALUES: usize = 256;

    /// Maximum total encrypted bits in one encrypted input
    pub const MAX_INPUT_BITS: u32 = 2048;

    /// Well-known local development chain (hardhat / anvil)
    pub const LOCAL_CHAIN_ID: u64 = 31337;

    /// Sepolia testnet chain id
    pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
}
