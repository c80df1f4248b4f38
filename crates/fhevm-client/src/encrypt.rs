//! Encrypted input construction

use alloy_primitives::{Address, U256};
use fhevm_core::{EncryptedInput, EncryptedInputs, FheType, InputRequest, SharedInstance};
use tracing::{debug, warn};

use crate::error::{FhevmError, Result};
use crate::manager::FhevmManager;
use crate::metrics::{self, OUTCOME_ERROR, OUTCOME_OK};

/// Entry point for building encrypted inputs against the managed instance
#[derive(Debug, Clone)]
pub struct InputEncryptor {
    manager: FhevmManager,
}

impl InputEncryptor {
    pub fn new(manager: FhevmManager) -> Self {
        Self { manager }
    }

    /// Open an input context bound to (contract, submitter)
    ///
    /// Fails with [`FhevmError::InstanceNotReady`] unless the manager is
    /// ready; no backend call is made in that case.
    pub fn create_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> Result<EncryptedInputBuilder> {
        let (generation, instance) = self.manager.ready_instance()?;
        Ok(EncryptedInputBuilder {
            manager: self.manager.clone(),
            generation,
            instance,
            request: InputRequest::new(contract_address, user_address),
        })
    }

    /// Encrypt a single value at `bits` width and return its handle and proof
    pub async fn encrypt_value(
        &self,
        contract_address: Address,
        user_address: Address,
        value: U256,
        bits: u16,
    ) -> Result<EncryptedInput> {
        let fhe_type = FheType::from_bits(bits)
            .ok_or_else(|| FhevmError::Encryption(format!("unsupported bit width {}", bits)))?;

        let mut builder = self.create_input(contract_address, user_address)?;
        builder.add(value, fhe_type);
        let inputs = builder.encrypt().await?;

        inputs
            .first()
            .ok_or_else(|| FhevmError::Encryption("backend returned no handle".into()))
    }
}

/// Input context collecting typed plaintext values
///
/// Holds the instance of the generation it was opened against; if the
/// manager moves on before [`encrypt`](Self::encrypt), the call fails
/// instead of using the invalidated instance.
#[derive(Debug)]
pub struct EncryptedInputBuilder {
    manager: FhevmManager,
    generation: u64,
    instance: SharedInstance,
    request: InputRequest,
}

impl EncryptedInputBuilder {
    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.add(U256::from(value as u8), FheType::Bool)
    }

    pub fn add8(&mut self, value: u8) -> &mut Self {
        self.add(U256::from(value), FheType::Uint8)
    }

    pub fn add16(&mut self, value: u16) -> &mut Self {
        self.add(U256::from(value), FheType::Uint16)
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.add(U256::from(value), FheType::Uint32)
    }

    pub fn add64(&mut self, value: u64) -> &mut Self {
        self.add(U256::from(value), FheType::Uint64)
    }

    pub fn add128(&mut self, value: u128) -> &mut Self {
        self.add(U256::from(value), FheType::Uint128)
    }

    pub fn add256(&mut self, value: U256) -> &mut Self {
        self.add(value, FheType::Uint256)
    }

    pub fn add_address(&mut self, value: Address) -> &mut Self {
        self.add(U256::from_be_slice(value.as_slice()), FheType::Address)
    }

    /// Append a value at an explicit type; range is checked by the backend
    pub fn add(&mut self, value: U256, fhe_type: FheType) -> &mut Self {
        self.request.push(value, fhe_type);
        self
    }

    pub fn len(&self) -> usize {
        self.request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }

    /// Total encrypted bits queued so far
    pub fn total_bits(&self) -> u32 {
        self.request.total_bits()
    }

    /// Encrypt every queued value. Consumes the context.
    pub async fn encrypt(self) -> Result<EncryptedInputs> {
        if !self.manager.is_current(self.generation) {
            return Err(FhevmError::InstanceNotReady);
        }

        let result = self
            .instance
            .encrypt(&self.request)
            .await
            .map_err(|e| FhevmError::Encryption(e.to_string()))
            .and_then(|inputs| {
                if inputs.handles.len() != self.request.len() {
                    return Err(FhevmError::Encryption(format!(
                        "backend returned {} handles for {} values",
                        inputs.handles.len(),
                        self.request.len()
                    )));
                }
                Ok(inputs)
            });

        match &result {
            Ok(inputs) => {
                metrics::record_encrypt(OUTCOME_OK);
                debug!(
                    contract = %self.request.contract_address,
                    user = %self.request.user_address,
                    handles = inputs.handles.len(),
                    proof_len = inputs.input_proof.len(),
                    "Input encrypted"
                );
            }
            Err(e) => {
                metrics::record_encrypt(OUTCOME_ERROR);
                warn!(contract = %self.request.contract_address, error = %e, "Encryption failed");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{InstanceLoader, LoadTarget};
    use async_trait::async_trait;
    use fhevm_core::{handle, BackendMetadata, MockInstanceParams, WalletProvider};
    use fhevm_mock::MockFhevm;
    use std::sync::Arc;

    struct MockLoader(MockFhevm);

    #[async_trait]
    impl InstanceLoader for MockLoader {
        async fn load(&self, target: &LoadTarget) -> Result<SharedInstance> {
            let instance = self
                .0
                .instance(MockInstanceParams {
                    rpc_url: target.provider.rpc_url.clone(),
                    chain_id: target.chain_id.unwrap_or(31337),
                    metadata: BackendMetadata {
                        acl_address: Address::with_last_byte(0x0a),
                        input_verifier_address: Address::with_last_byte(0x0b),
                        kms_verifier_address: Address::with_last_byte(0x0c),
                    },
                })
                .map_err(|e| FhevmError::BackendUnavailable(e.to_string()))?;
            Ok(Arc::new(instance))
        }
    }

    async fn ready_manager() -> FhevmManager {
        let manager = FhevmManager::new(Arc::new(MockLoader(MockFhevm::new())));
        manager.set_chain_id(Some(31337));
        manager.set_provider(Some(WalletProvider::new("http://localhost:8545")));
        manager.wait_ready().await.unwrap();
        manager
    }

    fn contract() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn user() -> Address {
        Address::repeat_byte(0xbb)
    }

    #[tokio::test]
    async fn test_not_ready_fails_fast() {
        let manager = FhevmManager::new(Arc::new(MockLoader(MockFhevm::new())));
        let encryptor = InputEncryptor::new(manager);

        let err = encryptor
            .encrypt_value(contract(), user(), U256::from(1u64), 64)
            .await
            .unwrap_err();
        assert_eq!(err, FhevmError::InstanceNotReady);
    }

    #[tokio::test]
    async fn test_encrypt_value_returns_typed_handle() {
        let encryptor = InputEncryptor::new(ready_manager().await);

        let input = encryptor
            .encrypt_value(contract(), user(), U256::from(12345u64), 32)
            .await
            .unwrap();
        assert_eq!(handle::fhe_type(&input.handle), Some(FheType::Uint32));
        assert_eq!(handle::index(&input.handle), 0);
        assert!(!input.proof.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_width_is_encryption_error() {
        let encryptor = InputEncryptor::new(ready_manager().await);

        let err = encryptor
            .encrypt_value(contract(), user(), U256::from(1u64), 12)
            .await
            .unwrap_err();
        assert!(matches!(err, FhevmError::Encryption(ref m) if m.contains("12")));
    }

    #[tokio::test]
    async fn test_backend_rejection_surfaces_reason() {
        let encryptor = InputEncryptor::new(ready_manager().await);

        let err = encryptor
            .encrypt_value(contract(), user(), U256::from(300u64), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, FhevmError::Encryption(_)));
    }

    #[tokio::test]
    async fn test_multi_value_context() {
        let encryptor = InputEncryptor::new(ready_manager().await);

        let mut builder = encryptor.create_input(contract(), user()).unwrap();
        builder
            .add_bool(true)
            .add8(7)
            .add64(1_000_000)
            .add_address(Address::repeat_byte(0x11));
        assert_eq!(builder.len(), 4);
        assert_eq!(builder.total_bits(), 2 + 8 + 64 + 160);

        let inputs = builder.encrypt().await.unwrap();
        assert_eq!(inputs.handles.len(), 4);
        let types: Vec<_> = inputs.handles.iter().map(handle::fhe_type).collect();
        assert_eq!(
            types,
            vec![
                Some(FheType::Bool),
                Some(FheType::Uint8),
                Some(FheType::Uint64),
                Some(FheType::Address)
            ]
        );
    }

    #[tokio::test]
    async fn test_builder_from_superseded_generation_is_rejected() {
        let manager = ready_manager().await;
        let encryptor = InputEncryptor::new(manager.clone());

        let mut builder = encryptor.create_input(contract(), user()).unwrap();
        builder.add64(5);
        manager.refresh();

        assert_eq!(builder.encrypt().await.unwrap_err(), FhevmError::InstanceNotReady);
    }
}
