//! Device factory: builds fresh devices and restores persisted ones.
//!
//! Both paths validate the algorithm against the key registry before any
//! key material is touched, and both give the device its own fresh chain
//! guard.

use std::sync::Arc;

use chainsign_crypto::{genesis_signature, DigestAlgorithm, DigestSigner, KeyPair, KeyRegistry};
use uuid::Uuid;

use crate::device::{ChainState, SigningDevice};
use crate::error::{DeviceError, Result};

/// Persisted device fields needed to rebuild a device.
#[derive(Debug, Clone)]
pub struct RestoreParams {
    pub id: Uuid,
    pub algorithm: String,
    pub label: Option<String>,
    pub counter: u64,
    pub last_signature: String,
    /// Digest the device was created with; the factory default when absent
    pub digest: Option<DigestAlgorithm>,
}

#[derive(Debug, Clone)]
pub struct DeviceFactory {
    registry: Arc<KeyRegistry>,
    digest: DigestAlgorithm,
}

impl DeviceFactory {
    /// Creates a factory issuing devices that sign with `digest`.
    pub fn new(registry: Arc<KeyRegistry>, digest: DigestAlgorithm) -> Self {
        Self { registry, digest }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Issues a new device with fresh key material at the genesis position.
    pub fn create(&self, algorithm: &str, label: Option<String>) -> Result<SigningDevice> {
        let algorithm = self
            .registry
            .resolve(algorithm)
            .map_err(|_| DeviceError::InvalidAlgorithm {
                algorithm: algorithm.to_string(),
            })?;

        let key_pair = Arc::new(self.registry.generate(algorithm)?);
        let id = Uuid::new_v4();
        let signer = DigestSigner::new(key_pair.clone(), self.digest)?;

        Ok(SigningDevice::from_parts(
            id,
            algorithm,
            label,
            self.digest,
            key_pair,
            Box::new(signer),
            ChainState {
                counter: 0,
                last_signature: genesis_signature(&id),
            },
        ))
    }

    /// Rebuilds a device from persisted fields and its key pair.
    ///
    /// The counter and last signature are trusted as given.
    pub fn restore(&self, params: RestoreParams, key_pair: KeyPair) -> Result<SigningDevice> {
        let algorithm = self
            .registry
            .resolve(&params.algorithm)
            .map_err(|_| DeviceError::InvalidAlgorithm {
                algorithm: params.algorithm.clone(),
            })?;

        if key_pair.algorithm() != algorithm {
            return Err(DeviceError::KeyMismatch {
                declared: algorithm,
                actual: key_pair.algorithm(),
            });
        }

        let digest = params.digest.unwrap_or(self.digest);
        let key_pair = Arc::new(key_pair);
        let signer = DigestSigner::new(key_pair.clone(), digest)?;

        Ok(SigningDevice::from_parts(
            params.id,
            algorithm,
            params.label,
            digest,
            key_pair,
            Box::new(signer),
            ChainState {
                counter: params.counter,
                last_signature: params.last_signature,
            },
        ))
    }

    /// Rebuilds a device from persisted fields and a PKCS#8 PEM private key.
    pub fn restore_from_pem(
        &self,
        params: RestoreParams,
        private_key_pem: &str,
    ) -> Result<SigningDevice> {
        let algorithm = self
            .registry
            .resolve(&params.algorithm)
            .map_err(|_| DeviceError::InvalidAlgorithm {
                algorithm: params.algorithm.clone(),
            })?;
        let key_pair = self.registry.load(algorithm, private_key_pem)?;
        self.restore(params, key_pair)
    }
}
