//! Domain module for chainsign signing devices
//!
//! This crate contains the device entity and its factory:
//! - Chained signing with a per-device guard
//! - Device creation at the genesis position
//! - Device restoration from persisted fields

pub mod device;
pub mod error;
pub mod factory;

pub use device::{DeviceSnapshot, SignatureRecord, SigningDevice};
pub use error::{DeviceError, Result};
pub use factory::{DeviceFactory, RestoreParams};
