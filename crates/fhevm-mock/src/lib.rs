//! fhevm-mock: local deterministic computation backend
//!
//! Stands in for the production backend on development chains. Values are
//! kept in an in-process [`CiphertextStore`] and never leave it in the
//! clear; handles follow the production layout, input proofs are signed by
//! a fixed coprocessor key, and user-decrypt requests are checked the way
//! the production gateway checks them:
//!
//! 1. The validity window `[start, start + days]` contains the current time
//! 2. The EIP-712 signature recovers to the requester
//! 3. Every requested contract is in the authorized set
//! 4. Every handle is known and its ACL admits both contract and requester
//!
//! Any failed check rejects the whole request.
//!
//! The ciphertext store is shared by every instance a [`MockFhevm`] creates,
//! so a handle encrypted through one instance can be decrypted after the
//! instance has been replaced by a reload.

mod instance;
mod proof;
mod store;

pub use instance::{MockFhevm, MockInstance};
pub use proof::{coprocessor_address, input_proof_digest, parse_input_proof, ParsedInputProof};
pub use store::{CiphertextStore, StoredCiphertext};
