//! Ciphertext handle layout and the FHE type table
//!
//! A handle is 32 bytes:
//!
//! ```text
//! [0..21)  hash prefix (binds the ciphertext to its origin)
//! [21]     index of the value inside its input (0xff for computed values)
//! [22..30) chain id, big-endian
//! [30]     FHE type id
//! [31]     handle version
//! ```

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Handle;

/// Current handle layout version
pub const HANDLE_VERSION: u8 = 0;

/// Index byte used for values produced by on-chain computation
pub const COMPUTED_INDEX: u8 = 0xff;

const PREFIX_LEN: usize = 21;

/// Encrypted value type, identified by its bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FheType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Address,
    Uint256,
}

impl FheType {
    /// Plaintext bit width
    pub fn bits(&self) -> u16 {
        match self {
            FheType::Bool => 1,
            FheType::Uint8 => 8,
            FheType::Uint16 => 16,
            FheType::Uint32 => 32,
            FheType::Uint64 => 64,
            FheType::Uint128 => 128,
            FheType::Address => 160,
            FheType::Uint256 => 256,
        }
    }

    /// Bits charged against the per-input budget (booleans occupy two)
    pub fn encrypted_bits(&self) -> u32 {
        match self {
            FheType::Bool => 2,
            other => other.bits() as u32,
        }
    }

    /// Type id embedded in byte 30 of a handle
    pub fn type_id(&self) -> u8 {
        match self {
            FheType::Bool => 0,
            FheType::Uint8 => 2,
            FheType::Uint16 => 3,
            FheType::Uint32 => 4,
            FheType::Uint64 => 5,
            FheType::Uint128 => 6,
            FheType::Address => 7,
            FheType::Uint256 => 8,
        }
    }

    pub fn from_type_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(FheType::Bool),
            2 => Some(FheType::Uint8),
            3 => Some(FheType::Uint16),
            4 => Some(FheType::Uint32),
            5 => Some(FheType::Uint64),
            6 => Some(FheType::Uint128),
            7 => Some(FheType::Address),
            8 => Some(FheType::Uint256),
            _ => None,
        }
    }

    /// Look up the type for a declared bit width
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            1 => Some(FheType::Bool),
            8 => Some(FheType::Uint8),
            16 => Some(FheType::Uint16),
            32 => Some(FheType::Uint32),
            64 => Some(FheType::Uint64),
            128 => Some(FheType::Uint128),
            160 => Some(FheType::Address),
            256 => Some(FheType::Uint256),
            _ => None,
        }
    }

    /// Returns true if `value` is representable at this bit width
    pub fn fits(&self, value: U256) -> bool {
        value.bit_len() <= self.bits() as usize
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FheType::Bool => write!(f, "ebool"),
            FheType::Address => write!(f, "eaddress"),
            other => write!(f, "euint{}", other.bits()),
        }
    }
}

/// Assemble a handle from its hash and the metadata bytes
pub fn compose(hash: B256, index: u8, chain_id: u64, fhe_type: FheType) -> Handle {
    let mut bytes = [0u8; 32];
    bytes[..PREFIX_LEN].copy_from_slice(&hash[..PREFIX_LEN]);
    bytes[21] = index;
    bytes[22..30].copy_from_slice(&chain_id.to_be_bytes());
    bytes[30] = fhe_type.type_id();
    bytes[31] = HANDLE_VERSION;
    B256::from(bytes)
}

/// Value index recorded in the handle
pub fn index(handle: &Handle) -> u8 {
    handle[21]
}

/// Chain id recorded in the handle
pub fn chain_id(handle: &Handle) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&handle[22..30]);
    u64::from_be_bytes(buf)
}

/// FHE type recorded in the handle, if the id is known
pub fn fhe_type(handle: &Handle) -> Option<FheType> {
    FheType::from_type_id(handle[30])
}

/// Parse a `0x`-prefixed (or bare) hex handle string
pub fn parse(s: &str) -> Option<Handle> {
    let hex = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(hex).ok()?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    Some(B256::from(bytes))
}
