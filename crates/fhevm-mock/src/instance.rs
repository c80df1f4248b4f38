//! Mock factory and instance

use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use fhevm_core::constants::{MAX_INPUT_BITS, MAX_INPUT_VALUES};
use fhevm_core::handle::{self, COMPUTED_INDEX};
use fhevm_core::{
    decryption_domain, BackendError, BackendKind, Clock, DecryptAuthorization, DecryptionResult,
    EncryptedInputs, EphemeralKeypair, FheType, FhevmInstance, Handle, InputRequest,
    MockInstanceFactory, MockInstanceParams, SharedInstance, SystemClock, UserDecryptRequest,
};
use rand::RngCore;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use crate::proof::{coprocessor_signer, encode_input_proof, input_proof_digest, parse_input_proof};
use crate::store::{CiphertextStore, StoredCiphertext};

/// Factory for local deterministic instances
///
/// Every instance it creates shares one ciphertext store and one clock.
#[derive(Debug, Clone)]
pub struct MockFhevm {
    store: Arc<CiphertextStore>,
    clock: Arc<dyn Clock>,
}

impl MockFhevm {
    pub fn new() -> Self {
        Self {
            store: Arc::new(CiphertextStore::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for validity-window checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<CiphertextStore> {
        &self.store
    }

    /// Build an instance directly, without going through the loader
    pub fn instance(&self, params: MockInstanceParams) -> Result<MockInstance, BackendError> {
        if params.rpc_url.is_empty() {
            return Err(BackendError::InvalidInput("rpc url is empty".into()));
        }
        Ok(MockInstance {
            params,
            store: self.store.clone(),
            clock: self.clock.clone(),
            coprocessor: coprocessor_signer()?,
        })
    }

    /// Record a value as if a contract had computed it on-chain
    ///
    /// Models ciphertexts the ledger produces itself (balances, tallies)
    /// rather than ones a user submitted.
    pub fn store_computed(
        &self,
        chain_id: u64,
        value: U256,
        fhe_type: FheType,
        allowed: &[Address],
    ) -> Result<Handle, BackendError> {
        if !fhe_type.fits(value) {
            return Err(BackendError::InvalidInput(format!(
                "value does not fit in {}",
                fhe_type
            )));
        }
        let nonce = self.store.next_nonce();
        let mut seed = Vec::with_capacity(17);
        seed.extend_from_slice(b"computed");
        seed.extend_from_slice(&nonce.to_be_bytes());
        let handle = handle::compose(keccak256(&seed), COMPUTED_INDEX, chain_id, fhe_type);

        self.store.insert(
            handle,
            StoredCiphertext {
                value,
                fhe_type,
                allowed: allowed.iter().copied().collect(),
            },
        );
        Ok(handle)
    }
}

impl Default for MockFhevm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MockInstanceFactory for MockFhevm {
    async fn create_mock_instance(
        &self,
        params: MockInstanceParams,
    ) -> Result<SharedInstance, BackendError> {
        let instance = self.instance(params)?;
        debug!(
            chain_id = instance.params.chain_id,
            rpc = %instance.params.rpc_url,
            acl = %instance.params.metadata.acl_address,
            "Created mock instance"
        );
        Ok(Arc::new(instance))
    }
}

/// Local deterministic instance bound to one chain
pub struct MockInstance {
    params: MockInstanceParams,
    store: Arc<CiphertextStore>,
    clock: Arc<dyn Clock>,
    coprocessor: PrivateKeySigner,
}

impl MockInstance {
    pub fn params(&self) -> &MockInstanceParams {
        &self.params
    }

    /// Check an input proof the way the input verifier contract would,
    /// returning the attested handles.
    pub fn verify_input_proof(
        &self,
        proof: &[u8],
        contract: Address,
        user: Address,
    ) -> Result<Vec<Handle>, BackendError> {
        let parsed = parse_input_proof(proof)?;
        let digest = input_proof_digest(
            &parsed.handles,
            contract,
            user,
            self.params.chain_id,
            self.params.metadata.input_verifier_address,
        );
        let expected = self.coprocessor.address();
        let attested = parsed.signatures.iter().any(|sig| {
            sig.recover_address_from_prehash(&digest)
                .map(|addr| addr == expected)
                .unwrap_or(false)
        });
        if !attested {
            return Err(BackendError::Rejected(
                "input proof not signed by coprocessor".into(),
            ));
        }
        Ok(parsed.handles)
    }

    fn validate_input(&self, request: &InputRequest) -> Result<(), BackendError> {
        if request.is_empty() {
            return Err(BackendError::InvalidInput("input has no values".into()));
        }
        if request.contract_address == Address::ZERO {
            return Err(BackendError::InvalidInput("contract address is zero".into()));
        }
        if request.user_address == Address::ZERO {
            return Err(BackendError::InvalidInput("user address is zero".into()));
        }
        if request.len() > MAX_INPUT_VALUES {
            return Err(BackendError::InvalidInput(format!(
                "too many values: {} > {}",
                request.len(),
                MAX_INPUT_VALUES
            )));
        }
        if request.total_bits() > MAX_INPUT_BITS {
            return Err(BackendError::InvalidInput(format!(
                "input exceeds {} bits: {}",
                MAX_INPUT_BITS,
                request.total_bits()
            )));
        }
        for (i, v) in request.values.iter().enumerate() {
            if !v.fhe_type.fits(v.value) {
                return Err(BackendError::InvalidInput(format!(
                    "value at index {} does not fit in {}",
                    i, v.fhe_type
                )));
            }
        }
        Ok(())
    }

    /// Resolve a requested handle, enforcing chain and ACL rules
    fn authorize_handle(
        &self,
        raw: &str,
        contract: &Address,
        user: &Address,
    ) -> Result<StoredCiphertext, BackendError> {
        let handle = handle::parse(raw)
            .ok_or_else(|| BackendError::Rejected(format!("malformed handle {}", raw)))?;
        if handle::chain_id(&handle) != self.params.chain_id {
            return Err(BackendError::Rejected(format!(
                "handle {} belongs to chain {}",
                raw,
                handle::chain_id(&handle)
            )));
        }
        let entry = self
            .store
            .get(&handle)
            .ok_or_else(|| BackendError::Rejected(format!("unknown handle {}", raw)))?;
        if !entry.allowed.contains(contract) {
            return Err(BackendError::Rejected(format!(
                "handle {} is not authorized for contract {}",
                raw, contract
            )));
        }
        if !entry.allowed.contains(user) {
            return Err(BackendError::Rejected(format!(
                "handle {} is not authorized for user {}",
                raw, user
            )));
        }
        Ok(entry)
    }
}

impl fmt::Debug for MockInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockInstance")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FhevmInstance for MockInstance {
    fn backend(&self) -> BackendKind {
        BackendKind::Mock
    }

    fn chain_id(&self) -> u64 {
        self.params.chain_id
    }

    async fn encrypt(&self, request: &InputRequest) -> Result<EncryptedInputs, BackendError> {
        self.validate_input(request)?;

        let nonce = self.store.next_nonce();
        // the seed carries plaintext
        let mut seed = Zeroizing::new(Vec::with_capacity(8 + 20 * 3 + 8 + request.len() * 33));
        seed.extend_from_slice(&self.params.chain_id.to_be_bytes());
        seed.extend_from_slice(self.params.metadata.acl_address.as_slice());
        seed.extend_from_slice(request.contract_address.as_slice());
        seed.extend_from_slice(request.user_address.as_slice());
        seed.extend_from_slice(&nonce.to_be_bytes());
        for v in &request.values {
            seed.push(v.fhe_type.type_id());
            seed.extend_from_slice(&v.value.to_be_bytes::<32>());
        }
        let blob_hash = keccak256(seed.as_slice());
        drop(seed);

        let mut handles = Vec::with_capacity(request.len());
        for (i, v) in request.values.iter().enumerate() {
            let index = i as u8;
            let mut buf = [0u8; 33];
            buf[..32].copy_from_slice(blob_hash.as_slice());
            buf[32] = index;
            let h = handle::compose(keccak256(buf), index, self.params.chain_id, v.fhe_type);

            self.store.insert(
                h,
                StoredCiphertext {
                    value: v.value,
                    fhe_type: v.fhe_type,
                    allowed: HashSet::from([request.user_address, request.contract_address]),
                },
            );
            handles.push(h);
        }

        let digest = input_proof_digest(
            &handles,
            request.contract_address,
            request.user_address,
            self.params.chain_id,
            self.params.metadata.input_verifier_address,
        );
        let input_proof = encode_input_proof(&self.coprocessor, &handles, &digest)?;

        debug!(
            contract = %request.contract_address,
            user = %request.user_address,
            values = request.len(),
            "Mock input encrypted"
        );

        Ok(EncryptedInputs {
            handles,
            input_proof,
        })
    }

    fn generate_keypair(&self) -> EphemeralKeypair {
        let mut private_key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut private_key);
        let public_key = Bytes::copy_from_slice(keccak256(&private_key).as_slice());
        EphemeralKeypair::new(public_key, private_key)
    }

    fn create_eip712(
        &self,
        public_key: &Bytes,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> DecryptAuthorization {
        DecryptAuthorization::new(
            decryption_domain(
                self.params.chain_id,
                self.params.metadata.kms_verifier_address,
            ),
            public_key.clone(),
            contract_addresses.to_vec(),
            start_timestamp,
            duration_days,
        )
    }

    async fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
    ) -> Result<DecryptionResult, BackendError> {
        if request.pairs.is_empty() {
            return Err(BackendError::Rejected("no handles requested".into()));
        }
        if request.duration_days == 0 {
            return Err(BackendError::Rejected("duration must be at least one day".into()));
        }

        let now = self.clock.now();
        if !request.is_valid_at(now) {
            return Err(BackendError::Rejected(format!(
                "request not valid at {}: window is [{}, {}]",
                now,
                request.start_timestamp,
                request.expires_at()
            )));
        }

        let derived = keccak256(request.keypair.private_key());
        if derived.as_slice() != request.keypair.public_key().as_ref() {
            return Err(BackendError::Rejected("ephemeral keypair mismatch".into()));
        }

        let authorization = self.create_eip712(
            request.keypair.public_key(),
            &request.contract_addresses,
            request.start_timestamp,
            request.duration_days,
        );
        let signer = request
            .signature
            .recover_address_from_prehash(&authorization.signing_hash())
            .map_err(|e| BackendError::Rejected(format!("malformed signature: {}", e)))?;
        if signer != request.user_address {
            return Err(BackendError::Rejected(format!(
                "signature recovers to {}, expected {}",
                signer, request.user_address
            )));
        }
        if request.contract_addresses.contains(&request.user_address) {
            return Err(BackendError::Rejected(
                "requester cannot be an authorized contract".into(),
            ));
        }

        let mut cleartexts = Vec::with_capacity(request.pairs.len());
        for pair in &request.pairs {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(BackendError::Rejected(format!(
                    "contract {} is not in the authorized set",
                    pair.contract_address
                )));
            }
            let entry =
                self.authorize_handle(&pair.handle, &pair.contract_address, &request.user_address)?;
            cleartexts.push((pair.handle.clone(), entry.value));
        }

        debug!(
            user = %request.user_address,
            handles = cleartexts.len(),
            "Mock user decrypt served"
        );
        Ok(cleartexts.into_iter().collect())
    }
}
