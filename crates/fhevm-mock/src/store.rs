//! In-process ciphertext store with per-handle access control

use alloy_primitives::{Address, U256};
use fhevm_core::{FheType, Handle};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A stored value and the accounts allowed to use it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCiphertext {
    pub value: U256,
    pub fhe_type: FheType,
    pub allowed: HashSet<Address>,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<Handle, StoredCiphertext>,
    nonce: u64,
}

/// Shared ciphertext table for all mock instances of one factory
#[derive(Debug, Default)]
pub struct CiphertextStore {
    inner: Mutex<StoreInner>,
}

impl CiphertextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Next input nonce; makes repeated encryptions of one value distinct
    pub(crate) fn next_nonce(&self) -> u64 {
        let mut inner = self.lock();
        let nonce = inner.nonce;
        inner.nonce += 1;
        nonce
    }

    pub(crate) fn insert(&self, handle: Handle, entry: StoredCiphertext) {
        self.lock().entries.insert(handle, entry);
    }

    /// Grant `account` access to `handle`. Returns false for unknown handles.
    pub fn allow(&self, handle: &Handle, account: Address) -> bool {
        match self.lock().entries.get_mut(handle) {
            Some(entry) => {
                entry.allowed.insert(account);
                true
            }
            None => false,
        }
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.lock()
            .entries
            .get(handle)
            .map(|e| e.allowed.contains(account))
            .unwrap_or(false)
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.lock().entries.contains_key(handle)
    }

    pub fn get(&self, handle: &Handle) -> Option<StoredCiphertext> {
        self.lock().entries.get(handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_allow_and_nonce() {
        let store = CiphertextStore::new();
        let handle = B256::repeat_byte(1);
        let alice = Address::repeat_byte(0xa1);

        assert!(!store.allow(&handle, alice));

        store.insert(
            handle,
            StoredCiphertext {
                value: U256::from(5u64),
                fhe_type: FheType::Uint8,
                allowed: HashSet::new(),
            },
        );
        assert!(!store.is_allowed(&handle, &alice));
        assert!(store.allow(&handle, alice));
        assert!(store.is_allowed(&handle, &alice));
        assert_eq!(store.len(), 1);

        assert_eq!(store.next_nonce(), 0);
        assert_eq!(store.next_nonce(), 1);
    }
}
