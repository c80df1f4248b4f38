//! Signature-gated user decryption
//!
//! One call runs the whole protocol in order:
//!
//! 1. Generate an ephemeral keypair scoped to the request
//! 2. Build the EIP-712 authorization naming the contracts, the public key
//!    and the validity window
//! 3. Ask the wallet to sign it (the only user-facing step)
//! 4. Submit pairs, keypair, signature and window to the backend
//! 5. Return cleartexts keyed by the exact handle strings requested
//!
//! Nothing is retried. A declined signature is [`FhevmError::UserRejected`];
//! a backend rejection is [`FhevmError::Decryption`] and yields no cleartext.

use alloy_primitives::Address;
use fhevm_core::{
    Clock, DecryptionResult, HandleContractPair, SystemClock, TypedDataSigner,
    UserDecryptRequest, DEFAULT_DURATION_DAYS,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{FhevmError, Result};
use crate::manager::FhevmManager;
use crate::metrics::{self, OUTCOME_ERROR, OUTCOME_OK, OUTCOME_REJECTED};

/// Per-call overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptOptions {
    /// Authorized contract set; defaults to the distinct contracts of the pairs
    pub contract_addresses: Option<Vec<Address>>,
    /// Start of the validity window; defaults to now
    pub start_timestamp: Option<u64>,
    pub duration_days: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DecryptionAuthorizer {
    manager: FhevmManager,
    clock: Arc<dyn Clock>,
    default_duration_days: u64,
}

impl DecryptionAuthorizer {
    pub fn new(manager: FhevmManager) -> Self {
        Self {
            manager,
            clock: Arc::new(SystemClock),
            default_duration_days: DEFAULT_DURATION_DAYS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_default_duration(mut self, days: u64) -> Self {
        self.default_duration_days = days;
        self
    }

    /// Decrypt `pairs` on behalf of `signer`
    pub async fn user_decrypt(
        &self,
        signer: &dyn TypedDataSigner,
        pairs: &[HandleContractPair],
        options: DecryptOptions,
    ) -> Result<DecryptionResult> {
        let result = self.run(signer, pairs, options).await;
        match &result {
            Ok(values) => {
                metrics::record_decrypt(OUTCOME_OK);
                info!(handles = values.len(), "User decrypt succeeded");
            }
            Err(FhevmError::UserRejected) => {
                metrics::record_decrypt(OUTCOME_REJECTED);
                info!("User declined the decrypt authorization");
            }
            Err(e) => {
                metrics::record_decrypt(OUTCOME_ERROR);
                warn!(error = %e, "User decrypt failed");
            }
        }
        result
    }

    async fn run(
        &self,
        signer: &dyn TypedDataSigner,
        pairs: &[HandleContractPair],
        options: DecryptOptions,
    ) -> Result<DecryptionResult> {
        let (generation, instance) = self.manager.ready_instance()?;

        if pairs.is_empty() {
            return Err(FhevmError::InvalidRequest("no handles to decrypt".into()));
        }
        let duration_days = options.duration_days.unwrap_or(self.default_duration_days);
        if duration_days == 0 {
            return Err(FhevmError::InvalidRequest(
                "validity must be at least one day".into(),
            ));
        }
        let contract_addresses = match options.contract_addresses {
            Some(set) if set.is_empty() => {
                return Err(FhevmError::InvalidRequest(
                    "authorized contract set is empty".into(),
                ));
            }
            Some(set) => set,
            None => distinct_contracts(pairs),
        };
        let start_timestamp = options.start_timestamp.unwrap_or_else(|| self.clock.now());
        let user_address = signer.address();

        let keypair = instance.generate_keypair();
        let authorization = instance.create_eip712(
            keypair.public_key(),
            &contract_addresses,
            start_timestamp,
            duration_days,
        );
        debug!(
            user = %user_address,
            contracts = contract_addresses.len(),
            start_timestamp,
            duration_days,
            "Requesting decrypt authorization signature"
        );

        let signature = signer
            .sign_typed_data(&authorization.domain, &authorization.message)
            .await?;

        if !self.manager.is_current(generation) {
            return Err(FhevmError::InstanceNotReady);
        }

        let request = UserDecryptRequest {
            pairs: pairs.to_vec(),
            keypair,
            signature,
            contract_addresses,
            user_address,
            start_timestamp,
            duration_days,
        };
        let values = instance
            .user_decrypt(&request)
            .await
            .map_err(|e| FhevmError::Decryption(e.to_string()))?;

        if let Some(missing) = pairs.iter().find(|p| !values.contains_key(&p.handle)) {
            return Err(FhevmError::Decryption(format!(
                "backend returned no value for {}",
                missing.handle
            )));
        }
        Ok(values)
    }
}

/// Contracts of `pairs` in first-seen order
fn distinct_contracts(pairs: &[HandleContractPair]) -> Vec<Address> {
    let mut out: Vec<Address> = Vec::new();
    for pair in pairs {
        if !out.contains(&pair.contract_address) {
            out.push(pair.contract_address);
        }
    }
    out
}
