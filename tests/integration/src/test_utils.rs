//! Test utilities shared by the integration suites

use std::sync::Arc;

use chainsign_crypto::{ChainLink, DigestAlgorithm, KeyConfig, KeyRegistry};
use chainsign_domain::{DeviceFactory, SignatureRecord};
use chainsign_node::AppState;
use chainsign_store::MemoryStore;

/// RSA modulus size used by tests; small enough to keep key generation fast
pub const TEST_RSA_BITS: usize = 1024;

/// Factory with every algorithm enabled and test-sized RSA keys
pub fn test_factory() -> DeviceFactory {
    let registry = KeyRegistry::new(KeyConfig {
        rsa_bits: TEST_RSA_BITS,
        ..KeyConfig::default()
    });
    DeviceFactory::new(Arc::new(registry), DigestAlgorithm::Sha256)
}

/// Application state over a fresh in-memory store.
///
/// Must be called from within a tokio runtime.
pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(MemoryStore::new()), test_factory()))
}

/// Converts signing results into links for chain verification
pub fn to_links(records: &[SignatureRecord]) -> Vec<ChainLink> {
    records
        .iter()
        .map(|r| ChainLink {
            signed_data: r.signed_data.clone(),
            signature: r.signature.clone(),
        })
        .collect()
}

/// Initialize tracing only if not already initialized
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
