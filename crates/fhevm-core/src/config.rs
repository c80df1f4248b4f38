//! Client configuration

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{LOCAL_CHAIN_ID, SEPOLIA_CHAIN_ID};
use crate::{Error, WalletProvider, DEFAULT_DURATION_DAYS};

/// RPC endpoint of a local development node
pub const DEFAULT_MOCK_RPC_URL: &str = "http://localhost:8545";

/// JSON-RPC method a local node answers with backend metadata
pub const DEFAULT_METADATA_METHOD: &str = "fhevm_relayer_metadata";

/// Production network constants consumed by the remote module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerConfig {
    pub acl_contract_address: Address,
    pub kms_contract_address: Address,
    pub input_verifier_contract_address: Address,
    /// EIP-712 verifying contract for decrypt authorizations
    pub verifying_contract_address_decryption: Address,
    /// EIP-712 verifying contract for input proofs
    pub verifying_contract_address_input_verification: Address,
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub relayer_url: String,
    /// Wallet network the instance talks through; set by `with_network`
    #[serde(default)]
    pub network: Option<WalletProvider>,
}

impl RelayerConfig {
    /// Sepolia deployment
    pub fn sepolia() -> Self {
        Self {
            acl_contract_address: address!("687820221192C5B662b25367F70076A37bc79b6c"),
            kms_contract_address: address!("1364cBBf2cDF5032C47d8226a6f6FBD2AFCDacAC"),
            input_verifier_contract_address: address!("bc91f3daD1A5F19F8390c400196e58073B6a0BC4"),
            verifying_contract_address_decryption: address!(
                "b6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1"
            ),
            verifying_contract_address_input_verification: address!(
                "7048C39f048125eDa9d678AEbaDfB22F7900a29F"
            ),
            chain_id: SEPOLIA_CHAIN_ID,
            gateway_chain_id: 55815,
            relayer_url: "https://relayer.testnet.zama.cloud".into(),
            network: None,
        }
    }

    /// Bind the configuration to the active wallet network
    pub fn with_network(mut self, network: WalletProvider) -> Self {
        self.network = Some(network);
        self
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

/// Top-level configuration for the client layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhevmConfig {
    /// Chains served by the local deterministic backend, with their RPC URL
    #[serde(default = "default_mock_chains")]
    pub mock_chains: BTreeMap<u64, String>,
    /// Production network constants; the base every relayer instance is
    /// configured from
    #[serde(default)]
    pub relayer: RelayerConfig,
    /// Default validity of decrypt authorizations
    #[serde(default = "default_duration_days")]
    pub decrypt_duration_days: u64,
    /// Side-channel method name for local metadata
    #[serde(default = "default_metadata_method")]
    pub metadata_method: String,
}

fn default_mock_chains() -> BTreeMap<u64, String> {
    BTreeMap::from([(LOCAL_CHAIN_ID, DEFAULT_MOCK_RPC_URL.to_string())])
}

fn default_duration_days() -> u64 {
    DEFAULT_DURATION_DAYS
}

fn default_metadata_method() -> String {
    DEFAULT_METADATA_METHOD.to_string()
}

impl FhevmConfig {
    /// Replace the local chain table
    pub fn with_mock_chains(mut self, chains: impl IntoIterator<Item = (u64, String)>) -> Self {
        self.mock_chains = chains.into_iter().collect();
        self
    }

    pub fn with_relayer(mut self, relayer: RelayerConfig) -> Self {
        self.relayer = relayer;
        self
    }

    /// RPC URL of the local backend for `chain_id`, if it is a local chain
    pub fn mock_rpc_url(&self, chain_id: u64) -> Option<&str> {
        self.mock_chains.get(&chain_id).map(String::as_str)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.decrypt_duration_days == 0 {
            return Err(Error::InvalidConfig(
                "decrypt_duration_days must be at least 1".into(),
            ));
        }
        if self.metadata_method.is_empty() {
            return Err(Error::InvalidConfig("metadata_method is empty".into()));
        }
        if self.mock_chains.contains_key(&self.relayer.chain_id) {
            return Err(Error::InvalidConfig(format!(
                "chain {} is both a local chain and the relayer chain",
                self.relayer.chain_id
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for FhevmConfig {
    fn default() -> Self {
        Self {
            mock_chains: default_mock_chains(),
            relayer: RelayerConfig::default(),
            decrypt_duration_days: DEFAULT_DURATION_DAYS,
            metadata_method: default_metadata_method(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_local_chain() {
        let config = FhevmConfig::default();
        assert_eq!(config.mock_rpc_url(31337), Some(DEFAULT_MOCK_RPC_URL));
        assert_eq!(config.mock_rpc_url(11155111), None);
        assert_eq!(config.decrypt_duration_days, 365);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_network_keeps_constants() {
        let base = RelayerConfig::sepolia();
        let bound = base.clone().with_network(WalletProvider::new("http://wallet"));
        assert_eq!(bound.acl_contract_address, base.acl_contract_address);
        assert_eq!(bound.network.unwrap().rpc_url, "http://wallet");
    }

    #[test]
    fn test_validate_rejects_overlap_and_zero_duration() {
        let overlap = FhevmConfig::default()
            .with_mock_chains([(SEPOLIA_CHAIN_ID, "http://x".to_string())]);
        assert!(overlap.validate().is_err());

        let mut zero = FhevmConfig::default();
        zero.decrypt_duration_days = 0;
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FhevmConfig = serde_json::from_str(r#"{"decryptDurationDays": 30}"#).unwrap();
        assert_eq!(config.decrypt_duration_days, 30);
        assert_eq!(config.metadata_method, DEFAULT_METADATA_METHOD);
        assert_eq!(config.relayer, RelayerConfig::sepolia());
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fhevm.json");
        let config = FhevmConfig::default().with_mock_chains([
            (31337, "http://localhost:8545".to_string()),
            (1337, "http://localhost:7545".to_string()),
        ]);

        config.save(&path).unwrap();
        let loaded = FhevmConfig::load(&path).unwrap();
        assert_eq!(loaded.mock_rpc_url(1337), Some("http://localhost:7545"));
    }
}
