//! Signing device: one identity's key and signature chain.
//!
//! A device owns its key material and a chain position made of a counter
//! and the last signature it produced. Each call to [`SigningDevice::sign`]
//! signs `<counter>_<payload>_<last signature>` and advances the chain by
//! exactly one step.
//!
//! # Concurrency
//!
//! The chain position lives behind a mutex owned by the device, so one
//! device never races itself while unrelated devices sign in parallel.
//! Immutable fields (id, algorithm, label, key) are read without locking.
//!
//! A device also remembers the chain position it was built at. Stores use
//! it to tell a copy that continues the stored chain from one that forked.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use chainsign_crypto::{
    encode_signature, extend_payload, Algorithm, DigestAlgorithm, KeyPair, Signer,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeviceError, Result};

/// Counter and last signature, always read and written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainState {
    pub(crate) counter: u64,
    pub(crate) last_signature: String,
}

/// Output of one signing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Base64 signature, now the device's last signature
    pub signature: String,
    /// The extended payload that was signed
    pub signed_data: String,
}

/// Serializable view of a device at one chain position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: Uuid,
    pub algorithm: Algorithm,
    pub digest: DigestAlgorithm,
    pub label: Option<String>,
    pub counter: u64,
    pub last_signature: String,
    /// SPKI PEM public key
    pub public_key: String,
}

pub struct SigningDevice {
    id: Uuid,
    algorithm: Algorithm,
    label: Option<String>,
    digest: DigestAlgorithm,
    key_pair: Arc<KeyPair>,
    signer: Box<dyn Signer>,
    /// Position at construction: genesis for new devices, the persisted
    /// fields for restored ones
    base: ChainState,
    chain: Mutex<ChainState>,
    /// Mirror of the chain counter, written under the guard
    counter: AtomicU64,
}

impl SigningDevice {
    /// Assembles a device. Only the factory and tests build devices.
    pub(crate) fn from_parts(
        id: Uuid,
        algorithm: Algorithm,
        label: Option<String>,
        digest: DigestAlgorithm,
        key_pair: Arc<KeyPair>,
        signer: Box<dyn Signer>,
        chain: ChainState,
    ) -> Self {
        Self {
            id,
            algorithm,
            label,
            digest,
            key_pair,
            signer,
            counter: AtomicU64::new(chain.counter),
            base: chain.clone(),
            chain: Mutex::new(chain),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Digest applied to every extended payload before signing.
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Public half of the key material as SPKI PEM.
    pub fn public_key_pem(&self) -> Result<String> {
        Ok(self.key_pair.public_key_pem()?)
    }

    /// Current chain position as one consistent read.
    pub fn counter_and_last_signature(&self) -> (u64, String) {
        let chain = self.lock_chain();
        (chain.counter, chain.last_signature.clone())
    }

    /// Like [`Self::counter_and_last_signature`] but never waits: returns
    /// `None` while a signature is being produced.
    pub fn try_counter_and_last_signature(&self) -> Option<(u64, String)> {
        let chain = match self.chain.try_lock() {
            Ok(chain) => chain,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some((chain.counter, chain.last_signature.clone()))
    }

    /// Last published counter, read without taking the chain guard.
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Chain position the device was built at.
    pub fn base_position(&self) -> (u64, &str) {
        (self.base.counter, &self.base.last_signature)
    }

    /// Signs `payload` at the current chain position and advances the chain.
    ///
    /// The signed text is `<counter>_<payload>_<last signature>`. On
    /// failure the counter and last signature are left untouched, so the
    /// caller may retry.
    pub fn sign(&self, payload: &str) -> Result<SignatureRecord> {
        let mut chain = self.lock_chain();

        let signed_data = extend_payload(chain.counter, payload, &chain.last_signature);
        let signature = self
            .signer
            .sign(signed_data.as_bytes())
            .map_err(|source| DeviceError::Signing {
                device_id: self.id,
                source,
            })?;
        let signature = encode_signature(&signature);

        chain.counter += 1;
        chain.last_signature = signature.clone();
        self.counter.store(chain.counter, Ordering::Release);

        Ok(SignatureRecord {
            signature,
            signed_data,
        })
    }

    /// Serializable view of the device.
    pub fn snapshot(&self) -> Result<DeviceSnapshot> {
        let public_key = self.public_key_pem()?;
        let (counter, last_signature) = self.counter_and_last_signature();
        Ok(DeviceSnapshot {
            id: self.id,
            algorithm: self.algorithm,
            digest: self.digest,
            label: self.label.clone(),
            counter,
            last_signature,
            public_key,
        })
    }

    // Chain state is only written after a signature succeeded, so a guard
    // poisoned by a panicking signer still holds a consistent pair.
    fn lock_chain(&self) -> MutexGuard<'_, ChainState> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SigningDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (counter, _) = self.counter_and_last_signature();
        f.debug_struct("SigningDevice")
            .field("id", &self.id)
            .field("algorithm", &self.algorithm)
            .field("label", &self.label)
            .field("counter", &counter)
            .finish_non_exhaustive()
    }
}
