//! Key registry: the set of algorithms a deployment accepts.
//!
//! The registry is built once at startup from configuration and passed
//! explicitly to whoever needs to generate or load keys.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{Algorithm, KeyPair};

/// Key generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    /// RSA modulus size in bits
    pub rsa_bits: usize,
    /// Algorithms available for new and restored devices
    pub algorithms: Vec<Algorithm>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            rsa_bits: 2048,
            algorithms: Algorithm::all().to_vec(),
        }
    }
}

/// Registry of enabled key algorithms.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    rsa_bits: usize,
    enabled: Vec<Algorithm>,
}

impl KeyRegistry {
    /// Creates a registry from key settings.
    pub fn new(config: KeyConfig) -> Self {
        let mut enabled: Vec<Algorithm> = Vec::with_capacity(config.algorithms.len());
        for algorithm in config.algorithms {
            if !enabled.contains(&algorithm) {
                enabled.push(algorithm);
            }
        }
        Self {
            rsa_bits: config.rsa_bits,
            enabled,
        }
    }

    /// Algorithms this registry accepts.
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.enabled
    }

    /// Checks if a given algorithm name is registered.
    pub fn is_valid_algorithm(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Resolves an algorithm name to an enabled algorithm.
    pub fn resolve(&self, name: &str) -> CryptoResult<Algorithm> {
        let algorithm: Algorithm = name.parse()?;
        self.ensure_enabled(algorithm)?;
        Ok(algorithm)
    }

    /// Generates a new key pair.
    pub fn generate(&self, algorithm: Algorithm) -> CryptoResult<KeyPair> {
        self.ensure_enabled(algorithm)?;
        KeyPair::generate(algorithm, self.rsa_bits)
    }

    /// Loads a key pair from a PKCS#8 PEM private key.
    pub fn load(&self, algorithm: Algorithm, pem: &str) -> CryptoResult<KeyPair> {
        self.ensure_enabled(algorithm)?;
        KeyPair::from_pkcs8_pem(algorithm, pem)
    }

    fn ensure_enabled(&self, algorithm: Algorithm) -> CryptoResult<()> {
        if self.enabled.contains(&algorithm) {
            Ok(())
        } else {
            Err(CryptoError::DisabledAlgorithm {
                name: algorithm.to_string(),
            })
        }
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new(KeyConfig::default())
    }
}
