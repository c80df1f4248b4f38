//! Local backend bootstrap metadata

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Contract addresses a local node reports through the metadata side channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendMetadata {
    #[serde(rename = "ACLAddress")]
    pub acl_address: Address,
    #[serde(rename = "InputVerifierAddress")]
    pub input_verifier_address: Address,
    #[serde(rename = "KMSVerifierAddress")]
    pub kms_verifier_address: Address,
}

/// Arguments for constructing the local deterministic backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInstanceParams {
    pub rpc_url: String,
    pub chain_id: u64,
    pub metadata: BackendMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_names() {
        let json = r#"{
            "ACLAddress": "0x000000000000000000000000000000000000000a",
            "InputVerifierAddress": "0x000000000000000000000000000000000000000b",
            "KMSVerifierAddress": "0x000000000000000000000000000000000000000c"
        }"#;
        let meta: BackendMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(meta.acl_address, Address::with_last_byte(0x0a));
        assert_eq!(meta.input_verifier_address, Address::with_last_byte(0x0b));
        assert_eq!(meta.kms_verifier_address, Address::with_last_byte(0x0c));

        let back = serde_json::to_value(meta).unwrap();
        assert!(back.get("ACLAddress").is_some());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{"ACLAddress": "0x000000000000000000000000000000000000000a"}"#;
        assert!(serde_json::from_str::<BackendMetadata>(json).is_err());
    }
}
