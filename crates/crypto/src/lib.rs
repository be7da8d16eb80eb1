//! Key material and signing capability for chainsign devices.
//!
//! This crate provides the cryptographic capability that signing devices
//! consume. Devices never see algorithm internals: they hold a [`KeyPair`]
//! and sign through the [`Signer`] contract.
//!
//! # Core Capabilities
//!
//! - **Key Registry**: explicit set of enabled algorithms, key generation and loading
//! - **Digital Signatures**: hash-then-sign with a digest fixed per signer
//! - **Key Export**: SPKI / PKCS#8 PEM encoding of public and private keys
//! - **Signature Chains**: extended payload format and replay verification
//!
//! # Supported Algorithms
//!
//! - **RSA**: PKCS#1 v1.5
//! - **ECC**: ECDSA over NIST P-384
//! - **ED25519**
//! - **Digests**: SHA-256 (default), SHA-384

pub mod chain;
pub mod error;
pub mod keys;
pub mod registry;
pub mod signing;

pub use chain::{
    decode_signature, encode_signature, extend_payload, genesis_signature, verify_chain,
    ChainError, ChainLink, SignedData, VerifyResult,
};
pub use error::{CryptoError, CryptoResult};
pub use keys::{Algorithm, DigestAlgorithm, KeyPair};
pub use registry::{KeyConfig, KeyRegistry};
pub use signing::{DigestSigner, Signer};
