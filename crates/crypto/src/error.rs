//! Error types for key material and signing operations.

use thiserror::Error;

/// Errors that can occur in the key capability layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Unknown signature algorithm: {name}")]
    UnknownAlgorithm { name: String },

    #[error("Signature algorithm not enabled: {name}")]
    DisabledAlgorithm { name: String },

    #[error("Unknown digest algorithm: {name}")]
    UnknownDigest { name: String },

    #[error("Key generation failed: {reason}")]
    KeyGeneration { reason: String },

    #[error("Key encoding error: {reason}")]
    KeyEncoding { reason: String },

    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    #[error("Signature verification failed: {reason}")]
    Verification { reason: String },

    #[error("Digest {digest} cannot be used with {algorithm} keys")]
    UnsupportedDigest { digest: String, algorithm: String },
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
