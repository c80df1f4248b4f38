//! Input proof encoding
//!
//! ```text
//! [numHandles u8][numSigners u8][handles 32 * numHandles][signatures 65 * numSigners]
//! ```
//!
//! Each signature covers [`input_proof_digest`].

use alloy_primitives::{keccak256, Address, Bytes, Signature, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use fhevm_core::{BackendError, Handle};

const SIGNATURE_LEN: usize = 65;
const COPROCESSOR_SEED: &[u8] = b"fhevm-mock coprocessor signer v0";

/// Deterministic key the mock coprocessor signs input proofs with
pub(crate) fn coprocessor_signer() -> Result<PrivateKeySigner, BackendError> {
    PrivateKeySigner::from_bytes(&keccak256(COPROCESSOR_SEED))
        .map_err(|e| BackendError::Transport(format!("coprocessor key: {}", e)))
}

/// Address input proofs must recover to
pub fn coprocessor_address() -> Option<Address> {
    coprocessor_signer().ok().map(|s| s.address())
}

/// Message the coprocessor attests for a set of handles
pub fn input_proof_digest(
    handles: &[Handle],
    contract: Address,
    user: Address,
    chain_id: u64,
    input_verifier: Address,
) -> B256 {
    let mut buf = Vec::with_capacity(handles.len() * 32 + 20 * 3 + 8);
    for handle in handles {
        buf.extend_from_slice(handle.as_slice());
    }
    buf.extend_from_slice(contract.as_slice());
    buf.extend_from_slice(user.as_slice());
    buf.extend_from_slice(&chain_id.to_be_bytes());
    buf.extend_from_slice(input_verifier.as_slice());
    keccak256(&buf)
}

pub(crate) fn encode_input_proof(
    signer: &PrivateKeySigner,
    handles: &[Handle],
    digest: &B256,
) -> Result<Bytes, BackendError> {
    let sig = signer
        .sign_hash_sync(digest)
        .map_err(|e| BackendError::Transport(format!("proof signing failed: {}", e)))?;

    let mut out = Vec::with_capacity(2 + handles.len() * 32 + SIGNATURE_LEN);
    out.push(handles.len() as u8);
    out.push(1);
    for handle in handles {
        out.extend_from_slice(handle.as_slice());
    }
    out.extend_from_slice(&sig.as_bytes());
    Ok(Bytes::from(out))
}

/// Decoded input proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInputProof {
    pub handles: Vec<Handle>,
    pub signatures: Vec<Signature>,
}

/// Split a proof into handles and signatures
pub fn parse_input_proof(proof: &[u8]) -> Result<ParsedInputProof, BackendError> {
    let malformed = |what: &str| BackendError::InvalidInput(format!("malformed input proof: {}", what));

    if proof.len() < 2 {
        return Err(malformed("missing header"));
    }
    let num_handles = proof[0] as usize;
    let num_signers = proof[1] as usize;
    let expected = 2 + num_handles * 32 + num_signers * SIGNATURE_LEN;
    if proof.len() != expected {
        return Err(malformed("length does not match header"));
    }

    let handles_end = 2 + num_handles * 32;
    let handles = proof[2..handles_end]
        .chunks_exact(32)
        .map(B256::from_slice)
        .collect();
    let signatures = proof[handles_end..]
        .chunks_exact(SIGNATURE_LEN)
        .map(|raw| Signature::from_raw(raw).map_err(|_| malformed("bad signature")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedInputProof {
        handles,
        signatures,
    })
}
