//! Encrypted input requests and results

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{FheType, Handle};

/// One plaintext value queued for encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputValue {
    pub value: U256,
    pub fhe_type: FheType,
}

/// Plaintext values bound to the contract and account that will submit them
///
/// The ciphertexts produced from a request can only be consumed by
/// `contract_address` in a transaction sent by `user_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub contract_address: Address,
    pub user_address: Address,
    pub values: Vec<InputValue>,
}

impl InputRequest {
    pub fn new(contract_address: Address, user_address: Address) -> Self {
        Self {
            contract_address,
            user_address,
            values: Vec::new(),
        }
    }

    /// Append a value at the declared type
    pub fn push(&mut self, value: U256, fhe_type: FheType) {
        self.values.push(InputValue { value, fhe_type });
    }

    /// Total bits charged against the per-input budget
    pub fn total_bits(&self) -> u32 {
        self.values.iter().map(|v| v.fhe_type.encrypted_bits()).sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All handles of an encrypted input plus the proof covering them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedInputs {
    pub handles: Vec<Handle>,
    pub input_proof: Bytes,
}

impl EncryptedInputs {
    /// Handle at `index` paired with the shared proof
    pub fn get(&self, index: usize) -> Option<EncryptedInput> {
        self.handles.get(index).map(|handle| EncryptedInput {
            handle: *handle,
            proof: self.input_proof.clone(),
        })
    }

    pub fn first(&self) -> Option<EncryptedInput> {
        self.get(0)
    }
}

/// A single handle and its correctness proof, ready for a ledger write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: Handle,
    pub proof: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_total_bits() {
        let mut req = InputRequest::new(Address::repeat_byte(0xaa), Address::repeat_byte(0xbb));
        assert!(req.is_empty());

        req.push(U256::from(1u64), FheType::Bool);
        req.push(U256::from(7u64), FheType::Uint64);
        req.push(U256::ZERO, FheType::Address);

        assert_eq!(req.len(), 3);
        assert_eq!(req.total_bits(), 2 + 64 + 160);
    }

    #[test]
    fn test_get_pairs_handle_with_shared_proof() {
        let inputs = EncryptedInputs {
            handles: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            input_proof: Bytes::from(vec![9u8; 4]),
        };

        let second = inputs.get(1).unwrap();
        assert_eq!(second.handle, B256::repeat_byte(2));
        assert_eq!(second.proof, inputs.input_proof);
        assert_eq!(inputs.first().unwrap().handle, B256::repeat_byte(1));
        assert!(inputs.get(2).is_none());
    }
}
