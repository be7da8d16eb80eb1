//! In-memory device store served by a single worker task
//!
//! All operations are submit-and-wait:
//! - The caller enqueues a request on an unbounded, ordered channel
//! - The worker applies requests one at a time against the map it owns
//! - The result comes back on a channel dedicated to that request
//!
//! Because exactly one task touches the map, every operation is applied in
//! a single total order and the worker needs no locking. `list` streams its
//! items back and closes the stream when done, so it observes the map as it
//! was at one point in that order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chainsign_domain::SigningDevice;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

use crate::{DeviceStore, PutOutcome, StoreError, StoreResult};

/// Request sent to the store worker
enum StoreRequest {
    Add {
        device: Arc<SigningDevice>,
        reply: oneshot::Sender<Arc<SigningDevice>>,
    },
    Put {
        device: Arc<SigningDevice>,
        reply: oneshot::Sender<PutOutcome>,
    },
    Get {
        id: Uuid,
        reply: oneshot::Sender<Option<Arc<SigningDevice>>>,
    },
    List {
        items: mpsc::UnboundedSender<Arc<SigningDevice>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the in-memory store.
///
/// Cloning the handle shares the same worker. The worker stops once every
/// handle has been dropped.
#[derive(Clone)]
pub struct MemoryStore {
    request_tx: mpsc::UnboundedSender<StoreRequest>,
}

impl MemoryStore {
    /// Creates an empty store and spawns its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        tokio::spawn(worker_task(request_rx));
        Self { request_tx }
    }

    /// Number of stored devices.
    pub async fn len(&self) -> StoreResult<usize> {
        let (reply, response) = oneshot::channel();
        self.submit(StoreRequest::Len { reply })?;
        response.await.map_err(|_| StoreError::Closed)
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    fn submit(&self, request: StoreRequest) -> StoreResult<()> {
        self.request_tx
            .send(request)
            .map_err(|_| StoreError::Closed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn add(&self, device: Arc<SigningDevice>) -> StoreResult<Arc<SigningDevice>> {
        let (reply, response) = oneshot::channel();
        self.submit(StoreRequest::Add { device, reply })?;
        response.await.map_err(|_| StoreError::Closed)
    }

    async fn put(&self, device: Arc<SigningDevice>) -> StoreResult<PutOutcome> {
        let (reply, response) = oneshot::channel();
        self.submit(StoreRequest::Put { device, reply })?;
        response.await.map_err(|_| StoreError::Closed)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Arc<SigningDevice>> {
        let (reply, response) = oneshot::channel();
        self.submit(StoreRequest::Get { id, reply })?;
        response
            .await
            .map_err(|_| StoreError::Closed)?
            .ok_or(StoreError::NotFound { id })
    }

    async fn list(&self) -> StoreResult<Vec<Arc<SigningDevice>>> {
        let (items, mut stream) = mpsc::unbounded_channel();
        self.submit(StoreRequest::List { items })?;

        let mut devices = Vec::new();
        while let Some(device) = stream.recv().await {
            devices.push(device);
        }
        Ok(devices)
    }
}

/// Worker task that owns the device map
async fn worker_task(mut request_rx: mpsc::UnboundedReceiver<StoreRequest>) {
    let mut devices: HashMap<Uuid, Arc<SigningDevice>> = HashMap::new();
    debug!("Device store worker started");

    while let Some(request) = request_rx.recv().await {
        // A caller that went away before its reply is not an error for the store.
        match request {
            StoreRequest::Add { device, reply } => {
                let id = device.id();
                devices.insert(id, device.clone());
                debug!(device_id = %id, "Device added");
                let _ = reply.send(device);
            }
            StoreRequest::Put { device, reply } => {
                let _ = reply.send(apply_put(&mut devices, device));
            }
            StoreRequest::Get { id, reply } => {
                let _ = reply.send(devices.get(&id).cloned());
            }
            StoreRequest::List { items } => {
                for device in devices.values() {
                    if items.send(device.clone()).is_err() {
                        break;
                    }
                }
            }
            StoreRequest::Len { reply } => {
                let _ = reply.send(devices.len());
            }
        }
    }

    debug!(devices = devices.len(), "Device store worker stopped");
}

/// Replaces the stored device only with itself or with a copy that
/// continues its chain.
///
/// A copy continues the chain when it was built at the stored device's
/// current position. Anything else has forked from the stored chain, and
/// accepting it would drop signatures already handed out. The stored
/// device is never waited on: if it is busy signing, it is moving past any
/// position a copy could have been built at.
fn apply_put(
    devices: &mut HashMap<Uuid, Arc<SigningDevice>>,
    device: Arc<SigningDevice>,
) -> PutOutcome {
    let id = device.id();
    let Some(stored) = devices.get(&id) else {
        debug!(device_id = %id, "Put ignored, device not stored");
        return PutOutcome::Ignored;
    };

    if !Arc::ptr_eq(stored, &device) && !continues_chain(stored, &device) {
        let stored_counter = stored.counter();
        debug!(
            device_id = %id,
            stored_counter,
            incoming_counter = device.counter(),
            "Put refused, incoming device forked from the stored chain"
        );
        return PutOutcome::Stale { stored_counter };
    }

    devices.insert(id, device.clone());
    PutOutcome::Updated(device)
}

fn continues_chain(stored: &SigningDevice, incoming: &SigningDevice) -> bool {
    let Some((counter, last_signature)) = stored.try_counter_and_last_signature() else {
        return false;
    };
    let (base_counter, base_signature) = incoming.base_position();
    base_counter == counter && base_signature == last_signature
}
