//! Local private-key wallet

use alloy_primitives::{Address, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use async_trait::async_trait;
use fhevm_core::{SignerError, TypedDataSigner, UserDecryptRequestVerification};
use std::fmt;

use crate::error::{FhevmError, Result};

/// Signs decrypt authorizations with an in-memory key
///
/// Stands in for a browser or hardware wallet in tools and tests; it never
/// prompts, so it never reports [`SignerError::Rejected`].
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_private_key_hex(key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|e| FhevmError::Wallet(format!("invalid private key: {}", e)))?;
        Ok(Self::new(signer))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address())
            .finish()
    }
}

#[async_trait]
impl TypedDataSigner for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        message: &UserDecryptRequestVerification,
    ) -> std::result::Result<Signature, SignerError> {
        let hash = message.eip712_signing_hash(domain);
        self.signer
            .sign_hash_sync(&hash)
            .map_err(|e| SignerError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, U256};
    use fhevm_core::{decryption_domain, DecryptAuthorization};

    // anvil account #0
    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_from_private_key_hex() {
        let wallet = LocalWallet::from_private_key_hex(ANVIL_KEY).unwrap();
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        let bare = LocalWallet::from_private_key_hex(ANVIL_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(bare.address(), wallet.address());
        assert!(!format!("{:?}", wallet).contains("ac0974"));
    }

    #[test]
    fn test_bad_key_is_wallet_error() {
        let err = LocalWallet::from_private_key_hex("0x1234").unwrap_err();
        assert!(matches!(err, FhevmError::Wallet(_)));
    }

    #[tokio::test]
    async fn test_signature_recovers_to_wallet() {
        let wallet = LocalWallet::random();
        let auth = DecryptAuthorization::new(
            decryption_domain(31337, Address::with_last_byte(0x0c)),
            Bytes::from(vec![3u8; 32]),
            vec![Address::repeat_byte(0xaa)],
            1_700_000_000,
            365,
        );

        let sig = wallet
            .sign_typed_data(&auth.domain, &auth.message)
            .await
            .unwrap();
        let recovered = sig.recover_address_from_prehash(&auth.signing_hash()).unwrap();
        assert_eq!(recovered, wallet.address());
        assert_eq!(auth.message.durationDays, U256::from(365u64));
    }
}
