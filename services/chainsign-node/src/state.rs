use std::sync::Arc;

use chainsign_core::{Config, ConfigError};
use chainsign_crypto::KeyRegistry;
use chainsign_domain::DeviceFactory;
use chainsign_store::{DeviceStore, MemoryStore};

pub struct AppState {
    pub store: Arc<dyn DeviceStore>,
    pub factory: DeviceFactory,
}

impl AppState {
    pub fn new(store: Arc<dyn DeviceStore>, factory: DeviceFactory) -> Self {
        Self { store, factory }
    }

    /// Builds the key registry and factory from configuration, backed by a
    /// fresh in-memory store. Must run inside a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let registry = KeyRegistry::new(config.key_config()?);
        let factory = DeviceFactory::new(Arc::new(registry), config.digest()?);
        Ok(Self::new(Arc::new(MemoryStore::new()), factory))
    }
}
