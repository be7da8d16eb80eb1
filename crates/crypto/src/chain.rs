//! Signature Chain Module - chained signing text and replay verification
//!
//! Every signature a device produces covers an *extended payload* that embeds
//! the device counter and the previous signature:
//!
//! ```text
//! <counter>_<payload>_<previous signature, base64>
//! ```
//!
//! Before the first signature, the previous signature is the genesis value
//! `base64(device id)`. This enables:
//!
//! - Tamper detection: changing any payload invalidates its signature
//! - Missing link detection: counters must be contiguous from zero
//! - Substitution detection: each link must embed its predecessor's signature
//!
//! The counter is decimal and base64 text never contains `_`, so the
//! counter is everything up to the first separator and the previous
//! signature everything after the last one; the payload itself may contain
//! separators.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::keys::{DigestAlgorithm, KeyPair};

/// Separator between the fields of an extended payload.
pub const SEPARATOR: char = '_';

/// Errors raised while parsing signed chain text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Malformed signed data: {reason}")]
    MalformedSignedData { reason: String },

    #[error("Invalid signature encoding: {reason}")]
    InvalidSignatureEncoding { reason: String },
}

/// Computes the genesis value of a chain: base64 of the device id text.
pub fn genesis_signature(device_id: &impl fmt::Display) -> String {
    STANDARD.encode(device_id.to_string())
}

/// Builds the text actually signed for a payload at a chain position.
pub fn extend_payload(counter: u64, payload: &str, last_signature: &str) -> String {
    format!(
        "{}{}{}{}{}",
        counter, SEPARATOR, payload, SEPARATOR, last_signature
    )
}

/// Encodes raw signature bytes for the chain.
pub fn encode_signature(signature: &[u8]) -> String {
    STANDARD.encode(signature)
}

/// Decodes a chain signature to raw bytes.
pub fn decode_signature(signature: &str) -> Result<Vec<u8>, ChainError> {
    STANDARD
        .decode(signature)
        .map_err(|e| ChainError::InvalidSignatureEncoding {
            reason: e.to_string(),
        })
}

/// The fields of an extended payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedData {
    /// Chain position before the signature was produced
    pub counter: u64,
    /// Payload as submitted by the caller
    pub payload: String,
    /// Signature the new one binds to
    pub last_signature: String,
}

impl SignedData {
    /// Splits extended payload text back into its fields.
    pub fn parse(text: &str) -> Result<Self, ChainError> {
        let malformed = |reason: &str| ChainError::MalformedSignedData {
            reason: reason.to_string(),
        };

        let (counter, rest) = text
            .split_once(SEPARATOR)
            .ok_or_else(|| malformed("missing counter separator"))?;
        let (payload, last_signature) = rest
            .rsplit_once(SEPARATOR)
            .ok_or_else(|| malformed("missing signature separator"))?;
        let counter = counter
            .parse::<u64>()
            .map_err(|_| malformed("counter is not a decimal integer"))?;

        Ok(Self {
            counter,
            payload: payload.to_string(),
            last_signature: last_signature.to_string(),
        })
    }

    /// Rebuilds the extended payload text.
    pub fn to_text(&self) -> String {
        extend_payload(self.counter, &self.payload, &self.last_signature)
    }
}

/// One recorded signing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    /// The extended payload that was signed
    pub signed_data: String,
    /// Base64 signature over `signed_data`
    pub signature: String,
}

/// Result of chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Chain is valid
    Ok,
    /// Chain break detected at specific index
    Error { error_type: String, index: usize },
}

impl VerifyResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerifyResult::Ok)
    }
}

impl fmt::Display for VerifyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyResult::Ok => write!(f, "ok"),
            VerifyResult::Error { error_type, index } => {
                write!(f, "error: {} at index {}", error_type, index)
            }
        }
    }
}

/// Verifies a device's signature history from genesis.
///
/// This function checks, for every link in order:
/// 1. The signed text parses and its counter equals the link index
/// 2. The embedded previous signature equals the prior link's signature
///    (or `genesis` for the first link)
/// 3. The signature verifies under `key_pair` with `digest`
///
/// An empty history is valid: the device has not signed anything yet.
pub fn verify_chain(
    key_pair: &KeyPair,
    digest: DigestAlgorithm,
    genesis: &str,
    links: &[ChainLink],
) -> VerifyResult {
    let mut previous = genesis;

    for (i, link) in links.iter().enumerate() {
        let signed = match SignedData::parse(&link.signed_data) {
            Ok(signed) => signed,
            Err(e) => {
                return VerifyResult::Error {
                    error_type: format!("malformed: {}", e),
                    index: i,
                }
            }
        };

        if signed.counter != i as u64 {
            return VerifyResult::Error {
                error_type: format!(
                    "counter_gap: expected {}, got {}",
                    i, signed.counter
                ),
                index: i,
            };
        }

        if signed.last_signature != previous {
            return VerifyResult::Error {
                error_type: "broken_link".to_string(),
                index: i,
            };
        }

        let signature = match decode_signature(&link.signature) {
            Ok(bytes) => bytes,
            Err(e) => {
                return VerifyResult::Error {
                    error_type: format!("malformed: {}", e),
                    index: i,
                }
            }
        };

        let hashed = digest.digest(link.signed_data.as_bytes());
        if let Err(e) = key_pair.verify_prehashed(digest, &hashed, &signature) {
            return VerifyResult::Error {
                error_type: format!("bad_signature: {}", e),
                index: i,
            };
        }

        previous = &link.signature;
    }

    VerifyResult::Ok
}
