//! Signing capability consumed by signing devices.
//!
//! A [`Signer`] turns bytes into a signature. [`DigestSigner`] is the
//! implementation used for device keys: it hashes the input with a digest
//! chosen at construction and signs the hash with the wrapped key pair.
//!
//! # Security Model
//!
//! - The digest is fixed for the lifetime of the signer
//! - Private keys never leave the key pair; only signatures are returned

use std::sync::Arc;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{DigestAlgorithm, KeyPair};

/// Contract for anything able to sign a byte string.
pub trait Signer: Send + Sync {
    /// Signs `data` and returns the raw signature bytes.
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// Hash-then-sign wrapper around a key pair.
#[derive(Debug, Clone)]
pub struct DigestSigner {
    key_pair: Arc<KeyPair>,
    digest: DigestAlgorithm,
}

impl DigestSigner {
    /// Creates a signer for `key_pair` using `digest`.
    ///
    /// Fails if the key cannot encode signatures over the digest (RSA keys
    /// whose modulus is too small for the DigestInfo block).
    pub fn new(key_pair: Arc<KeyPair>, digest: DigestAlgorithm) -> CryptoResult<Self> {
        if !key_pair.supports_digest(digest) {
            return Err(CryptoError::UnsupportedDigest {
                digest: digest.to_string(),
                algorithm: key_pair.algorithm().to_string(),
            });
        }
        Ok(Self { key_pair, digest })
    }

    /// Digest used for every signature.
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Key pair backing this signer.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Verifies `signature` over `data` with the same digest and key.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let hashed = self.digest.digest(data);
        self.key_pair
            .verify_prehashed(self.digest, &hashed, signature)
    }
}

impl Signer for DigestSigner {
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let hashed = self.digest.digest(data);
        self.key_pair.sign_prehashed(self.digest, &hashed)
    }
}
