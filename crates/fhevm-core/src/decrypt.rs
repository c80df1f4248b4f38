//! User-decrypt request types and the EIP-712 authorization payload

use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// Default validity of a decrypt authorization
pub const DEFAULT_DURATION_DAYS: u64 = 365;

pub const SECONDS_PER_DAY: u64 = 86_400;

const DOMAIN_NAME: &str = "Decryption";
const DOMAIN_VERSION: &str = "1";

sol! {
    /// Message an account signs to let a backend re-encrypt handles for it
    #[derive(Debug, PartialEq, Eq)]
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
    }
}

/// Domain separator for decrypt authorizations on `chain_id`
pub fn decryption_domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(DOMAIN_NAME.into()),
        Some(DOMAIN_VERSION.into()),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// Structured, domain-separated payload handed to the wallet for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptAuthorization {
    pub domain: Eip712Domain,
    pub message: UserDecryptRequestVerification,
}

impl DecryptAuthorization {
    pub fn new(
        domain: Eip712Domain,
        public_key: Bytes,
        contract_addresses: Vec<Address>,
        start_timestamp: u64,
        duration_days: u64,
    ) -> Self {
        Self {
            domain,
            message: UserDecryptRequestVerification {
                publicKey: public_key,
                contractAddresses: contract_addresses,
                startTimestamp: U256::from(start_timestamp),
                durationDays: U256::from(duration_days),
            },
        }
    }

    /// EIP-712 digest the wallet signs
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// Name of the signed struct, as wallets expect in `primaryType`
    pub fn primary_type(&self) -> String {
        UserDecryptRequestVerification::eip712_root_type().into_owned()
    }

    pub fn start_timestamp(&self) -> u64 {
        self.message.startTimestamp.saturating_to()
    }

    pub fn duration_days(&self) -> u64 {
        self.message.durationDays.saturating_to()
    }
}

/// Single-request keypair binding a decrypt authorization
///
/// The private half is zeroed when the keypair is dropped.
pub struct EphemeralKeypair {
    public_key: Bytes,
    private_key: Zeroizing<Vec<u8>>,
}

impl EphemeralKeypair {
    pub fn new(public_key: Bytes, private_key: Vec<u8>) -> Self {
        Self {
            public_key,
            private_key: Zeroizing::new(private_key),
        }
    }

    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A handle and the contract it is read through
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleContractPair {
    /// Handle exactly as the caller holds it; results are keyed by this string
    pub handle: String,
    pub contract_address: Address,
}

impl HandleContractPair {
    pub fn new(handle: impl Into<String>, contract_address: Address) -> Self {
        Self {
            handle: handle.into(),
            contract_address,
        }
    }
}

/// Everything a backend needs to serve one user-decrypt call
#[derive(Debug)]
pub struct UserDecryptRequest {
    pub pairs: Vec<HandleContractPair>,
    pub keypair: EphemeralKeypair,
    pub signature: Signature,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl UserDecryptRequest {
    /// Last second (inclusive) at which the request is valid
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    /// Returns true if `now` lies in the closed validity window
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.start_timestamp <= now && now <= self.expires_at()
    }
}

/// Cleartexts keyed by the exact handle strings of the request
pub type DecryptionResult = HashMap<String, U256>;
