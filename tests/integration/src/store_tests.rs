//! Store behavior seen by many concurrent callers

use std::collections::HashSet;
use std::sync::Arc;

use chainsign_domain::RestoreParams;
use chainsign_store::{DeviceStore, MemoryStore, PutOutcome, StoreError};
use uuid::Uuid;

use crate::test_utils::test_factory;

#[tokio::test]
async fn test_store_through_trait_object() {
    let store: Arc<dyn DeviceStore> = Arc::new(MemoryStore::new());
    let device = Arc::new(test_factory().create("ECC", Some("a".to_string())).unwrap());

    store.add(device.clone()).await.unwrap();
    let fetched = store.get(device.id()).await.unwrap();
    assert_eq!(fetched.label(), Some("a"));
}

#[tokio::test]
async fn test_put_never_inserts() {
    let store = MemoryStore::new();
    let device = Arc::new(test_factory().create("ED25519", None).unwrap());

    assert!(matches!(
        store.put(device.clone()).await.unwrap(),
        PutOutcome::Ignored
    ));
    assert_eq!(
        store.get(device.id()).await.unwrap_err(),
        StoreError::NotFound { id: device.id() }
    );
}

#[tokio::test]
async fn test_lagging_copy_cannot_roll_back() {
    let factory = test_factory();
    let store = MemoryStore::new();
    let device = Arc::new(factory.create("ED25519", None).unwrap());
    store.add(device.clone()).await.unwrap();

    // A caller holding an old rebuild of the device signs once...
    let (counter, last_signature) = device.counter_and_last_signature();
    let lagging = Arc::new(
        factory
            .restore(
                RestoreParams {
                    id: device.id(),
                    algorithm: device.algorithm().to_string(),
                    label: None,
                    counter,
                    last_signature,
                    digest: Some(device.digest()),
                },
                device.key_pair().clone(),
            )
            .unwrap(),
    );
    lagging.sign("late").unwrap();

    // ...while the stored device has moved further ahead.
    for i in 0..3 {
        device.sign(&format!("tx{}", i)).unwrap();
    }

    let outcome = store.put(lagging).await.unwrap();
    assert!(matches!(outcome, PutOutcome::Stale { stored_counter: 3 }));
    assert_eq!(
        store
            .get(device.id())
            .await
            .unwrap()
            .counter_and_last_signature()
            .0,
        3
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_sees_every_completed_add() {
    let factory = test_factory();
    let store = MemoryStore::new();
    let devices: Vec<_> = (0..24)
        .map(|_| Arc::new(factory.create("ED25519", None).unwrap()))
        .collect();

    let handles: Vec<_> = devices
        .iter()
        .cloned()
        .map(|device| {
            let store = store.clone();
            tokio::spawn(async move {
                store.add(device).await.unwrap();
                // Every add that completed before this list is visible to it.
                store.list().await.unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap() >= 1);
    }

    let listed: HashSet<Uuid> = store.list().await.unwrap().iter().map(|d| d.id()).collect();
    let expected: HashSet<Uuid> = devices.iter().map(|d| d.id()).collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_handles_share_one_store() {
    let store = MemoryStore::new();
    let other = store.clone();
    let device = Arc::new(test_factory().create("ECC", None).unwrap());

    store.add(device.clone()).await.unwrap();
    assert!(Arc::ptr_eq(&other.get(device.id()).await.unwrap(), &device));
    assert_eq!(other.len().await.unwrap(), 1);
}
