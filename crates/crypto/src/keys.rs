//! Signature algorithms, digests and key material.
//!
//! Supported algorithms form a closed set. Each [`KeyPair`] variant wraps the
//! private key of one algorithm; public material is derived on demand.
//!
//! # Encodings
//!
//! - Private keys export as PKCS#8 PEM, public keys as SPKI PEM
//! - RSA signatures are PKCS#1 v1.5
//! - ECC (P-384) signatures are ASN.1 DER encoded ECDSA
//! - Ed25519 signatures are the raw 64-byte form

use ed25519_dalek::{Signer as _, Verifier as _};
use p384::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

/// Signature algorithm of a device key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    /// RSA with PKCS#1 v1.5 padding
    Rsa,
    /// ECDSA over NIST P-384
    Ecc,
    /// Ed25519 over the message digest
    Ed25519,
}

impl Algorithm {
    /// Every supported algorithm.
    pub fn all() -> &'static [Algorithm] {
        &[Algorithm::Rsa, Algorithm::Ecc, Algorithm::Ed25519]
    }

    /// Canonical algorithm name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Rsa => "RSA",
            Algorithm::Ecc => "ECC",
            Algorithm::Ed25519 => "ED25519",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    /// Parses an algorithm name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::all()
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CryptoError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

/// Hash applied to data before it is signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha384,
}

impl DigestAlgorithm {
    /// Canonical digest name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
        }
    }

    /// Hashes `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        }
    }

    fn pkcs1v15(&self) -> Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "sha384" | "sha-384" => Ok(DigestAlgorithm::Sha384),
            _ => Err(CryptoError::UnknownDigest {
                name: s.to_string(),
            }),
        }
    }
}

/// Private key material for one of the supported algorithms.
#[derive(Clone)]
pub enum KeyPair {
    Rsa(RsaPrivateKey),
    Ecc(p384::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl KeyPair {
    /// Generates fresh key material.
    ///
    /// `rsa_bits` is only used for [`Algorithm::Rsa`].
    pub fn generate(algorithm: Algorithm, rsa_bits: usize) -> CryptoResult<Self> {
        match algorithm {
            Algorithm::Rsa => {
                let key = RsaPrivateKey::new(&mut OsRng, rsa_bits).map_err(|e| {
                    CryptoError::KeyGeneration {
                        reason: e.to_string(),
                    }
                })?;
                Ok(KeyPair::Rsa(key))
            }
            Algorithm::Ecc => Ok(KeyPair::Ecc(p384::ecdsa::SigningKey::random(&mut OsRng))),
            Algorithm::Ed25519 => {
                let mut secret_key_bytes = [0u8; 32];
                OsRng.fill_bytes(&mut secret_key_bytes);
                let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret_key_bytes);
                secret_key_bytes.zeroize();
                Ok(KeyPair::Ed25519(signing_key))
            }
        }
    }

    /// Loads key material from a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(algorithm: Algorithm, pem: &str) -> CryptoResult<Self> {
        let encoding_error = |e: rsa::pkcs8::Error| CryptoError::KeyEncoding {
            reason: format!("invalid {} private key: {}", algorithm, e),
        };
        match algorithm {
            Algorithm::Rsa => RsaPrivateKey::from_pkcs8_pem(pem)
                .map(KeyPair::Rsa)
                .map_err(encoding_error),
            Algorithm::Ecc => p384::ecdsa::SigningKey::from_pkcs8_pem(pem)
                .map(KeyPair::Ecc)
                .map_err(encoding_error),
            Algorithm::Ed25519 => ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                .map(KeyPair::Ed25519)
                .map_err(encoding_error),
        }
    }

    /// Algorithm of this key.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            KeyPair::Rsa(_) => Algorithm::Rsa,
            KeyPair::Ecc(_) => Algorithm::Ecc,
            KeyPair::Ed25519(_) => Algorithm::Ed25519,
        }
    }

    /// Checks that `digest` output can be signed by this key.
    ///
    /// PKCS#1 v1.5 needs room for the DigestInfo prefix plus 11 bytes of
    /// padding inside the modulus.
    pub fn supports_digest(&self, digest: DigestAlgorithm) -> bool {
        match self {
            KeyPair::Rsa(key) => {
                let digest_info_prefix = 19;
                key.size() >= digest_info_prefix + digest.output_len() + 11
            }
            KeyPair::Ecc(_) | KeyPair::Ed25519(_) => true,
        }
    }

    /// Signs an already hashed message.
    pub fn sign_prehashed(&self, digest: DigestAlgorithm, hashed: &[u8]) -> CryptoResult<Vec<u8>> {
        let signing_error = |reason: String| CryptoError::Signing { reason };
        match self {
            KeyPair::Rsa(key) => key
                .sign(digest.pkcs1v15(), hashed)
                .map_err(|e| signing_error(e.to_string())),
            KeyPair::Ecc(key) => {
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash(hashed)
                    .map_err(|e| signing_error(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519(key) => Ok(key.sign(hashed).to_bytes().to_vec()),
        }
    }

    /// Verifies a signature over an already hashed message.
    pub fn verify_prehashed(
        &self,
        digest: DigestAlgorithm,
        hashed: &[u8],
        signature: &[u8],
    ) -> CryptoResult<()> {
        let verification_error = |reason: String| CryptoError::Verification { reason };
        match self {
            KeyPair::Rsa(key) => key
                .to_public_key()
                .verify(digest.pkcs1v15(), hashed, signature)
                .map_err(|e| verification_error(e.to_string())),
            KeyPair::Ecc(key) => {
                let signature = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|e| verification_error(e.to_string()))?;
                key.verifying_key()
                    .verify_prehash(hashed, &signature)
                    .map_err(|e| verification_error(e.to_string()))
            }
            KeyPair::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| verification_error(e.to_string()))?;
                key.verifying_key()
                    .verify(hashed, &signature)
                    .map_err(|e| verification_error(e.to_string()))
            }
        }
    }

    /// Public key as SPKI PEM.
    pub fn public_key_pem(&self) -> CryptoResult<String> {
        let result = match self {
            KeyPair::Rsa(key) => key.to_public_key().to_public_key_pem(LineEnding::LF),
            KeyPair::Ecc(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
            KeyPair::Ed25519(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
        };
        result.map_err(|e| CryptoError::KeyEncoding {
            reason: e.to_string(),
        })
    }

    /// Private key as PKCS#8 PEM. The returned buffer is zeroized on drop.
    pub fn private_key_pem(&self) -> CryptoResult<Zeroizing<String>> {
        let result = match self {
            KeyPair::Rsa(key) => key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::Ecc(key) => key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::Ed25519(key) => key.to_pkcs8_pem(LineEnding::LF),
        };
        result.map_err(|e| CryptoError::KeyEncoding {
            reason: e.to_string(),
        })
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPair::Rsa(a), KeyPair::Rsa(b)) => a == b,
            (KeyPair::Ecc(a), KeyPair::Ecc(b)) => a == b,
            (KeyPair::Ed25519(a), KeyPair::Ed25519(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
