//! Wallet collaborator seam

use alloy_primitives::{Address, Signature};
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;

use crate::{SignerError, UserDecryptRequestVerification};

/// Account able to sign structured (EIP-712) payloads
///
/// `sign_typed_data` is where user approval happens. Implementations
/// report a declined prompt as [`SignerError::Rejected`].
#[async_trait]
pub trait TypedDataSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        message: &UserDecryptRequestVerification,
    ) -> Result<Signature, SignerError>;
}
