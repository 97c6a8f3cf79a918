//! Capability cache behaviour across time, tampering and storage failures

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::{Address, B256, Bytes, PrimitiveSignature};
use async_trait::async_trait;
use tripseal_core::capability::{
    SECONDS_PER_DAY, capability_key, decryption_domain, forget, list_cached, load_or_sign_at,
};
use tripseal_core::*;
use tripseal_storage::{CapabilityStore, InMemoryCapabilityStore, StoreError, StoreResult};

const CONTRACT: Address = Address::repeat_byte(0xc0);
const NOW: u64 = 1_750_000_000;

struct CountingSigner {
    inner: LocalSigner,
    calls: AtomicUsize,
}

#[async_trait]
impl CapabilitySigner for CountingSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_typed_hash(&self, hash: &B256) -> Result<PrimitiveSignature, SignError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_typed_hash(hash).await
    }
}

fn counting() -> CountingSigner {
    CountingSigner {
        inner: LocalSigner::random(),
        calls: AtomicUsize::new(0),
    }
}

/// Reads work, writes always fail
struct ReadOnlyStore;

#[async_trait]
impl CapabilityStore for ReadOnlyStore {
    async fn get_item(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }

    async fn remove_item(&self, _key: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_expired_capability_is_reissued() {
    let engine = MockEngine::new();
    let store = InMemoryCapabilityStore::new();
    let signer = counting();
    let policy = CapabilityPolicy { duration_days: 1 };

    let first = load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, NOW)
        .await
        .unwrap()
        .unwrap();
    let still_valid = NOW + SECONDS_PER_DAY - 1;
    let reused = load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, still_valid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reused, first);
    assert_eq!(signer.calls.load(Ordering::SeqCst), 1);

    let expired = NOW + SECONDS_PER_DAY;
    let renewed = load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, expired)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renewed.start_timestamp, expired);
    assert_ne!(renewed.public_key, first.public_key);
    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_tampered_record_is_ignored() {
    let engine = MockEngine::new();
    let store = InMemoryCapabilityStore::new();
    let signer = counting();
    let policy = CapabilityPolicy::default();

    let original = load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, NOW)
        .await
        .unwrap()
        .unwrap();

    let domain = decryption_domain(engine.chain_id(), engine.decryption_verifier());
    let key = capability_key(signer.address(), &[CONTRACT], &domain);
    let mut forged = original.clone();
    forged.duration_days = 100_000;
    forged.public_key = Bytes::from(vec![0xee; 32]);
    store
        .set_item(&key, &serde_json::to_string(&forged).unwrap())
        .await
        .unwrap();

    let fresh = load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, NOW + 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    assert!(fresh.verify_signature(&domain));
    assert_eq!(fresh.duration_days, 365);
}

#[tokio::test]
async fn test_garbage_record_is_ignored() {
    let engine = MockEngine::new();
    let store = InMemoryCapabilityStore::new();
    let signer = counting();

    let domain = decryption_domain(engine.chain_id(), engine.decryption_verifier());
    let key = capability_key(signer.address(), &[CONTRACT], &domain);
    store.set_item(&key, "{not json").await.unwrap();

    let cap = load_or_sign_at(
        &engine,
        &[CONTRACT],
        &signer,
        &store,
        &CapabilityPolicy::default(),
        NOW,
    )
    .await
    .unwrap();
    assert!(cap.is_some());
    assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_persist_failure_still_returns_capability() {
    let engine = MockEngine::new();
    let signer = counting();

    let cap = load_or_sign_at(
        &engine,
        &[CONTRACT],
        &signer,
        &ReadOnlyStore,
        &CapabilityPolicy::default(),
        NOW,
    )
    .await
    .unwrap()
    .unwrap();

    assert!(cap.covers(CONTRACT));
    assert_eq!(cap.user_address, signer.address());
}

#[tokio::test]
async fn test_contract_order_shares_one_entry() {
    let engine = MockEngine::new();
    let store = InMemoryCapabilityStore::new();
    let signer = counting();
    let other = Address::repeat_byte(0xd0);
    let policy = CapabilityPolicy::default();

    load_or_sign_at(&engine, &[CONTRACT, other], &signer, &store, &policy, NOW)
        .await
        .unwrap();
    load_or_sign_at(&engine, &[other, CONTRACT], &signer, &store, &policy, NOW + 1)
        .await
        .unwrap();

    assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_forget_and_list() {
    let engine = MockEngine::new();
    let store = InMemoryCapabilityStore::new();
    let signer = counting();
    let policy = CapabilityPolicy::default();

    load_or_sign_at(&engine, &[CONTRACT], &signer, &store, &policy, NOW)
        .await
        .unwrap();
    store.set_item("stray", "garbage").await.unwrap();

    let listed = list_cached(&store).await.unwrap();
    assert_eq!(listed.len(), 2);
    let parsed: Vec<_> = listed.iter().filter(|(_, c)| c.is_some()).collect();
    assert_eq!(parsed.len(), 1);

    forget(&engine, signer.address(), &[CONTRACT], &store)
        .await
        .unwrap();
    let remaining = store.keys().await.unwrap();
    assert_eq!(remaining, vec!["stray".to_string()]);
}
