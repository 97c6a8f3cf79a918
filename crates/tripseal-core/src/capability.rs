//! Decryption capabilities
//!
//! Reading an encrypted value requires a capability: an ephemeral keypair
//! plus the user's EIP-712 signature authorising that public key to decrypt
//! handles of a set of contracts for a bounded period. Capabilities are
//! cached per `(user, contract set)` and reused until they expire, so the
//! user signs once per period instead of once per read.
//!
//! ## Signing payload
//!
//! ```text
//! domain:  { name: "Decryption", version: "1", chainId, verifyingContract }
//! message: UserDecryptRequestVerification(
//!              bytes publicKey,
//!              address[] contractAddresses,
//!              uint256 startTimestamp,
//!              uint256 durationDays)
//! ```
//!
//! ## Cache key
//!
//! `"{userAddress}:{requestHash}"`, where `requestHash` is the signing hash of
//! the request with an empty public key and zero timestamps over the sorted
//! contract set. The key depends only on chain, verifier, user and contracts.

use std::borrow::Cow;

use alloy::primitives::{Address, B256, Bytes, PrimitiveSignature, U256};
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use tripseal_storage::{CapabilityStore, StoreError};

use crate::engine::FheEngine;
use crate::error::CapabilityResult;

pub const SECONDS_PER_DAY: u64 = 86_400;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
    }
}

/// EIP-712 domain for decryption requests
pub fn decryption_domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed("Decryption")),
        Some(Cow::Borrowed("1")),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// Sorted, de-duplicated contract set
pub fn normalize_contracts(contracts: &[Address]) -> Vec<Address> {
    let mut sorted = contracts.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Store key for a `(user, contract set)` pair
pub fn capability_key(user: Address, contracts: &[Address], domain: &Eip712Domain) -> String {
    let request = UserDecryptRequestVerification {
        publicKey: Bytes::new(),
        contractAddresses: normalize_contracts(contracts),
        startTimestamp: U256::ZERO,
        durationDays: U256::ZERO,
    };
    format!("{user}:{}", request.eip712_signing_hash(domain))
}

pub(crate) fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// How long newly issued capabilities last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityPolicy {
    pub duration_days: u64,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self { duration_days: 365 }
    }
}

/// Signed, time-bounded decryption authorization
///
/// Serialized with camelCase keys; this is the stored record format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionCapability {
    pub user_address: Address,
    pub contract_addresses: Vec<Address>,
    pub public_key: Bytes,
    pub private_key: Bytes,
    pub signature: Bytes,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl std::fmt::Debug for DecryptionCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionCapability")
            .field("user_address", &self.user_address)
            .field("contract_addresses", &self.contract_addresses)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("start_timestamp", &self.start_timestamp)
            .field("duration_days", &self.duration_days)
            .finish()
    }
}

impl DecryptionCapability {
    /// The EIP-712 message this capability's signature covers
    pub fn request(&self) -> UserDecryptRequestVerification {
        UserDecryptRequestVerification {
            publicKey: self.public_key.clone(),
            contractAddresses: self.contract_addresses.clone(),
            startTimestamp: U256::from(self.start_timestamp),
            durationDays: U256::from(self.duration_days),
        }
    }

    pub fn covers(&self, contract: Address) -> bool {
        self.contract_addresses.contains(&contract)
    }

    /// First second at which the capability is no longer valid
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.start_timestamp <= now && now < self.expires_at()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_secs())
    }

    /// Whether the signature recovers to `user_address` under `domain`
    pub fn verify_signature(&self, domain: &Eip712Domain) -> bool {
        let Ok(signature) = PrimitiveSignature::try_from(self.signature.as_ref()) else {
            return false;
        };
        let hash = self.request().eip712_signing_hash(domain);
        signature
            .recover_address_from_prehash(&hash)
            .is_ok_and(|addr| addr == self.user_address)
    }
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Signature request declined")]
    Declined,

    #[error("Signing failed: {0}")]
    Failed(String),
}

/// Wallet that can sign typed-data hashes
#[async_trait]
pub trait CapabilitySigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_typed_hash(&self, hash: &B256) -> Result<PrimitiveSignature, SignError>;
}

/// Signer backed by a local secp256k1 key
pub struct LocalSigner {
    inner: PrivateKeySigner,
}

impl LocalSigner {
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    /// Parse a hex private key (with or without `0x`)
    pub fn from_hex(key: &str) -> Result<Self, SignError> {
        key.trim()
            .parse::<PrivateKeySigner>()
            .map(Self::new)
            .map_err(|e| SignError::Failed(format!("invalid private key: {e}")))
    }

    pub fn inner(&self) -> &PrivateKeySigner {
        &self.inner
    }
}

#[async_trait]
impl CapabilitySigner for LocalSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_typed_hash(&self, hash: &B256) -> Result<PrimitiveSignature, SignError> {
        self.inner
            .sign_hash(hash)
            .await
            .map_err(|e| SignError::Failed(e.to_string()))
    }
}

/// Return a cached capability or obtain a fresh one
///
/// `Ok(None)` means the user declined (or failed) to sign.
pub async fn load_or_sign(
    engine: &dyn FheEngine,
    contracts: &[Address],
    signer: &dyn CapabilitySigner,
    store: &dyn CapabilityStore,
    policy: &CapabilityPolicy,
) -> CapabilityResult<Option<DecryptionCapability>> {
    load_or_sign_at(engine, contracts, signer, store, policy, now_secs()).await
}

/// [`load_or_sign`] at an explicit time (seconds since the epoch)
pub async fn load_or_sign_at(
    engine: &dyn FheEngine,
    contracts: &[Address],
    signer: &dyn CapabilitySigner,
    store: &dyn CapabilityStore,
    policy: &CapabilityPolicy,
    now: u64,
) -> CapabilityResult<Option<DecryptionCapability>> {
    let user = signer.address();
    let contracts = normalize_contracts(contracts);
    let domain = decryption_domain(engine.chain_id(), engine.decryption_verifier());
    let key = capability_key(user, &contracts, &domain);

    if let Some(cached) = load_cached(store, &key, user, &contracts, &domain, now).await {
        debug!(%user, key, "reusing cached decryption capability");
        return Ok(Some(cached));
    }

    let keypair = engine.generate_keypair()?;
    let request = UserDecryptRequestVerification {
        publicKey: Bytes::from(keypair.public_key.clone()),
        contractAddresses: contracts.clone(),
        startTimestamp: U256::from(now),
        durationDays: U256::from(policy.duration_days),
    };
    let hash = request.eip712_signing_hash(&domain);

    let signature = match signer.sign_typed_hash(&hash).await {
        Ok(sig) => sig,
        Err(e) => {
            info!(%user, error = %e, "decryption authorization not granted");
            return Ok(None);
        }
    };

    let capability = DecryptionCapability {
        user_address: user,
        contract_addresses: contracts,
        public_key: Bytes::from(keypair.public_key),
        private_key: Bytes::copy_from_slice(&keypair.private_key),
        signature: Bytes::copy_from_slice(&signature.as_bytes()),
        start_timestamp: now,
        duration_days: policy.duration_days,
    };

    let json = serde_json::to_string(&capability).map_err(StoreError::from)?;
    if let Err(e) = store.set_item(&key, &json).await {
        warn!(%user, error = %e, "failed to persist decryption capability");
    }

    info!(
        %user,
        contracts = capability.contract_addresses.len(),
        expires_at = capability.expires_at(),
        "decryption capability issued"
    );
    Ok(Some(capability))
}

async fn load_cached(
    store: &dyn CapabilityStore,
    key: &str,
    user: Address,
    contracts: &[Address],
    domain: &Eip712Domain,
    now: u64,
) -> Option<DecryptionCapability> {
    let raw = match store.get_item(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "capability store read failed");
            return None;
        }
    };

    let capability: DecryptionCapability = match serde_json::from_str(&raw) {
        Ok(c) => c,
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable cached capability");
            return None;
        }
    };

    if capability.user_address != user || capability.contract_addresses != contracts {
        warn!(key, "cached capability does not match its key");
        return None;
    }
    if !capability.is_valid_at(now) {
        debug!(key, expired_at = capability.expires_at(), "cached capability expired");
        return None;
    }
    if !capability.verify_signature(domain) {
        warn!(key, "cached capability signature does not recover to user");
        return None;
    }

    Some(capability)
}

/// Remove the cached capability for `(signer, contracts)`
pub async fn forget(
    engine: &dyn FheEngine,
    user: Address,
    contracts: &[Address],
    store: &dyn CapabilityStore,
) -> CapabilityResult<()> {
    let domain = decryption_domain(engine.chain_id(), engine.decryption_verifier());
    store
        .remove_item(&capability_key(user, contracts, &domain))
        .await?;
    Ok(())
}

/// Every stored record, parsed when possible
pub async fn list_cached(
    store: &dyn CapabilityStore,
) -> CapabilityResult<Vec<(String, Option<DecryptionCapability>)>> {
    let mut keys = store.keys().await?;
    keys.sort();

    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        let parsed = store
            .get_item(&key)
            .await?
            .and_then(|raw| serde_json::from_str(&raw).ok());
        out.push((key, parsed));
    }
    Ok(out)
}
