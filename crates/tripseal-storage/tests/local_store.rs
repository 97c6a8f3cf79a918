//! Integration tests for LocalFileCapabilityStore

use tripseal_storage::{CapabilityStore, LocalFileCapabilityStore, StoreError};
use tempfile::TempDir;

const KEY: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8:0x1f2e";

#[tokio::test]
async fn test_local_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();

    store.set_item(KEY, r#"{"durationDays":365}"#).await.unwrap();
    let value = store.get_item(KEY).await.unwrap();
    assert_eq!(value.as_deref(), Some(r#"{"durationDays":365}"#));
}

#[tokio::test]
async fn test_local_persistence() {
    let temp = TempDir::new().unwrap();

    // Write with one instance
    {
        let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();
        store.set_item(KEY, "persisted").await.unwrap();
    }

    // Read with new instance
    {
        let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();
        assert_eq!(store.get_item(KEY).await.unwrap().as_deref(), Some("persisted"));
        assert_eq!(store.keys().await.unwrap(), vec![KEY.to_string()]);
    }
}

#[tokio::test]
async fn test_local_overwrite_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();

    for i in 0..5 {
        store.set_item(KEY, &format!("v{i}")).await.unwrap();
    }
    assert_eq!(store.get_item(KEY).await.unwrap().as_deref(), Some("v4"));

    let files: Vec<_> = std::fs::read_dir(temp.path().join("capabilities"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".json"));
}

#[tokio::test]
async fn test_local_concurrent_writes_are_whole() {
    let temp = TempDir::new().unwrap();
    let store = std::sync::Arc::new(LocalFileCapabilityStore::new(temp.path()).await.unwrap());

    let a = "a".repeat(4096);
    let b = "b".repeat(4096);
    let (ra, rb) = tokio::join!(
        {
            let store = store.clone();
            let a = a.clone();
            async move { store.set_item(KEY, &a).await }
        },
        {
            let store = store.clone();
            let b = b.clone();
            async move { store.set_item(KEY, &b).await }
        }
    );
    ra.unwrap();
    rb.unwrap();

    let value = store.get_item(KEY).await.unwrap().unwrap();
    assert!(value == a || value == b);
}

#[tokio::test]
async fn test_local_remove() {
    let temp = TempDir::new().unwrap();
    let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();

    store.set_item(KEY, "v").await.unwrap();
    store.remove_item(KEY).await.unwrap();
    store.remove_item(KEY).await.unwrap();

    assert!(store.get_item(KEY).await.unwrap().is_none());
    assert!(store.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_corrupt_record() {
    let temp = TempDir::new().unwrap();
    let store = LocalFileCapabilityStore::new(temp.path()).await.unwrap();

    store.set_item(KEY, "v").await.unwrap();
    let path = std::fs::read_dir(temp.path().join("capabilities"))
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    std::fs::write(&path, b"{not json").unwrap();

    let result = store.get_item(KEY).await;
    assert!(matches!(result, Err(StoreError::Corrupt { .. })));

    // Listing skips the corrupt file instead of failing
    assert!(store.keys().await.unwrap().is_empty());
}
