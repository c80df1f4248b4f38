//! fhevm-client: lifecycle and operations for a confidential-computation instance
//!
//! The host supplies a wallet provider and chain id; everything else hangs
//! off [`FhevmManager`]:
//!
//! - [`BackendLoader`] picks the local deterministic backend or the remote
//!   production module for the chain and bootstraps it
//! - [`FhevmManager`] runs the idle / loading / ready / error state machine
//!   and discards results of superseded loads
//! - [`InputEncryptor`] turns plaintexts into handle + proof pairs for a
//!   (contract, submitter) binding
//! - [`DecryptionAuthorizer`] runs the signature-gated user-decrypt protocol
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use fhevm_client::{BackendLoader, FhevmManager, InputEncryptor};
//! use fhevm_core::{FhevmConfig, WalletProvider};
//! use alloy_primitives::{Address, U256};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loader = BackendLoader::new(&FhevmConfig::default());
//!     let manager = FhevmManager::new(Arc::new(loader));
//!     manager.set_chain_id(Some(31337));
//!     manager.set_provider(Some(WalletProvider::new("http://localhost:8545")));
//!     manager.wait_ready().await?;
//!
//!     let encryptor = InputEncryptor::new(manager.clone());
//!     let input = encryptor
//!         .encrypt_value(Address::repeat_byte(0xaa), Address::repeat_byte(0xbb), U256::from(42u64), 64)
//!         .await?;
//!     println!("{} {}", input.handle, input.proof);
//!     Ok(())
//! }
//! ```

pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod loader;
pub mod manager;
pub mod metadata;
pub mod metrics;
pub mod relayer;
pub mod wallet;

pub use decrypt::{DecryptOptions, DecryptionAuthorizer};
pub use encrypt::{EncryptedInputBuilder, InputEncryptor};
pub use error::{FhevmError, Result};
pub use loader::{BackendLoader, BackendPlan, InstanceLoader, LoadTarget};
pub use manager::{FhevmManager, FhevmStatus, LifecycleState, Snapshot};
pub use metadata::RpcMetadataSource;
pub use relayer::RelayerRuntime;
pub use wallet::LocalWallet;
