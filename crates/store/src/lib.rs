//! Device storage for chainsign.
//!
//! The [`DeviceStore`] contract behaves like a map from device id to device
//! whose operations are applied in a single total order. [`MemoryStore`]
//! implements it with one worker task that owns the map and serves requests
//! from an ordered queue.

use std::sync::Arc;

use async_trait::async_trait;
use chainsign_domain::SigningDevice;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;

pub use memory::MemoryStore;

/// Errors that can occur in store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No device is stored under the id.
    #[error("device {id} not found")]
    NotFound { id: Uuid },

    /// The store worker is no longer running.
    #[error("device store is closed")]
    Closed,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional update.
#[derive(Debug, Clone)]
pub enum PutOutcome {
    /// The stored device was replaced.
    Updated(Arc<SigningDevice>),
    /// No device with this id exists; nothing was inserted.
    Ignored,
    /// The incoming device does not continue the stored chain: it was built
    /// at an older position, or it forked and signed on its own.
    Stale { stored_counter: u64 },
}

impl PutOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, PutOutcome::Updated(_))
    }
}

/// Linearizable device storage.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Inserts or overwrites a device by id and returns the stored value.
    async fn add(&self, device: Arc<SigningDevice>) -> StoreResult<Arc<SigningDevice>>;

    /// Replaces a device only if its id is already stored and the incoming
    /// device is the stored one or continues its chain.
    async fn put(&self, device: Arc<SigningDevice>) -> StoreResult<PutOutcome>;

    /// Looks a device up by id.
    async fn get(&self, id: Uuid) -> StoreResult<Arc<SigningDevice>>;

    /// Every stored device, in no particular order.
    async fn list(&self) -> StoreResult<Vec<Arc<SigningDevice>>>;
}
