//! Domain errors
//!
//! Every failure is returned to the caller; nothing here is fatal to the
//! process and nothing is retried internally.

use chainsign_crypto::{Algorithm, CryptoError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DeviceError {
    /// The algorithm name is unknown or not enabled.
    #[error("invalid algorithm {algorithm}")]
    InvalidAlgorithm { algorithm: String },

    /// The key capability failed to produce a signature. Chain state is unchanged.
    #[error("signing failed for device {device_id}: {source}")]
    Signing {
        device_id: Uuid,
        #[source]
        source: CryptoError,
    },

    /// Restored key material does not belong to the declared algorithm.
    #[error("key material is {actual}, device declares {declared}")]
    KeyMismatch {
        declared: Algorithm,
        actual: Algorithm,
    },

    /// Key generation, loading or export failed.
    #[error("key material error: {0}")]
    KeyMaterial(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
