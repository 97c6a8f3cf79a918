//! Mock FHE engine for testing
//!
//! NOT SECURE: "ciphertexts" are plaintexts kept in a map behind random
//! handles. The proof framing and coprocessor signature are real, so proof
//! validation, capability checks and ledger verification run unchanged.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, keccak256};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use rand::{RngCore, rngs::OsRng};
use tripseal_proto::{Handle, ProofFrame};
use zeroize::Zeroizing;

use crate::capability::{DecryptionCapability, decryption_domain, now_secs};
use crate::engine::{
    EncryptedInputBuilder, EngineKeypair, FheEngine, HandleRef, SealedInput, input_proof_digest,
};
use crate::error::{EngineError, EngineResult};

/// Local hardhat/anvil chain id
pub const MOCK_CHAIN_ID: u64 = 31337;

struct StoredCiphertext {
    value: u64,
    contract: Address,
    user: Address,
}

pub struct MockEngine {
    chain_id: u64,
    verifier: Address,
    coprocessor: PrivateKeySigner,
    legacy_trailing_byte: bool,
    failures: Mutex<VecDeque<String>>,
    ciphertexts: Mutex<HashMap<Handle, StoredCiphertext>>,
    counter: AtomicU64,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            chain_id: MOCK_CHAIN_ID,
            verifier: Address::repeat_byte(0xd3),
            coprocessor: PrivateKeySigner::random(),
            legacy_trailing_byte: false,
            failures: Mutex::new(VecDeque::new()),
            ciphertexts: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Emit proofs with one extra trailing byte, as some relayer builds do
    pub fn with_legacy_trailing_byte(mut self, enabled: bool) -> Self {
        self.legacy_trailing_byte = enabled;
        self
    }

    /// Address whose signature appears in every input proof
    pub fn coprocessor_address(&self) -> Address {
        self.coprocessor.address()
    }

    /// Make the next `seal_numeric` call fail with `message`
    ///
    /// Calls queue up; each failure is consumed by one call.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().push_back(message.into());
    }

    pub fn pending_failures(&self) -> usize {
        self.failures.lock().unwrap().len()
    }

    /// Number of ciphertexts sealed so far
    pub fn sealed_count(&self) -> usize {
        self.ciphertexts.lock().unwrap().len()
    }

    fn derive_handle(&self, input: &EncryptedInputBuilder, index: usize, type_tag: u8) -> Handle {
        let nonce = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);

        let mut preimage = Vec::with_capacity(96);
        preimage.extend_from_slice(input.contract().as_slice());
        preimage.extend_from_slice(input.user().as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&salt);

        let mut handle: Handle = keccak256(preimage).0;
        // Trailing metadata: [index][chainId:8][type][version]
        handle[21] = index as u8;
        handle[22..30].copy_from_slice(&self.chain_id.to_be_bytes());
        handle[30] = type_tag;
        handle[31] = 0;
        handle
    }
}

#[async_trait]
impl FheEngine for MockEngine {
    fn name(&self) -> &str {
        "Mock (TESTING ONLY)"
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn decryption_verifier(&self) -> Address {
        self.verifier
    }

    fn generate_keypair(&self) -> EngineResult<EngineKeypair> {
        let mut secret = Zeroizing::new(vec![0u8; 32]);
        OsRng.fill_bytes(&mut secret);
        let public_key = blake3::hash(&secret).as_bytes().to_vec();

        Ok(EngineKeypair {
            public_key,
            private_key: secret,
        })
    }

    async fn seal_numeric(&self, input: &EncryptedInputBuilder) -> EngineResult<SealedInput> {
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(EngineError::Oracle(message));
        }
        if input.is_empty() {
            return Err(EngineError::InvalidInput("no values added".into()));
        }
        if input.len() > u8::MAX as usize {
            return Err(EngineError::InvalidInput(format!(
                "too many values: {}",
                input.len()
            )));
        }

        let handles: Vec<Handle> = input
            .values()
            .iter()
            .enumerate()
            .map(|(i, v)| self.derive_handle(input, i, v.type_tag()))
            .collect();

        let digest = input_proof_digest(&handles, input.contract(), input.user());
        let signature = self
            .coprocessor
            .sign_hash_sync(&digest)
            .map_err(|e| EngineError::Oracle(format!("coprocessor signing failed: {e}")))?;

        let frame = ProofFrame::new(handles.clone(), vec![signature.as_bytes()])
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        let mut input_proof = frame.encode();
        if self.legacy_trailing_byte {
            input_proof.push(0x00);
        }

        {
            let mut store = self.ciphertexts.lock().unwrap();
            for (handle, value) in handles.iter().zip(input.values()) {
                store.insert(
                    *handle,
                    StoredCiphertext {
                        value: value.as_u64(),
                        contract: input.contract(),
                        user: input.user(),
                    },
                );
            }
        }

        tracing::debug!(
            handles = handles.len(),
            proof_len = input_proof.len(),
            "mock engine sealed input"
        );

        Ok(SealedInput {
            handles,
            input_proof,
        })
    }

    async fn user_decrypt(
        &self,
        handles: &[HandleRef],
        capability: &DecryptionCapability,
    ) -> EngineResult<Vec<u64>> {
        let domain = decryption_domain(self.chain_id, self.verifier);
        if !capability.verify_signature(&domain) {
            return Err(EngineError::Decryption("invalid capability signature".into()));
        }
        if !capability.is_valid_at(now_secs()) {
            return Err(EngineError::Decryption("capability expired".into()));
        }

        let store = self.ciphertexts.lock().unwrap();
        handles
            .iter()
            .map(|r| {
                if !capability.covers(r.contract) {
                    return Err(EngineError::Decryption(format!(
                        "contract {} not authorized",
                        r.contract
                    )));
                }
                let ct = store
                    .get(&r.handle)
                    .ok_or_else(|| EngineError::Decryption("unknown handle".into()))?;
                if ct.contract != r.contract || ct.user != capability.user_address {
                    return Err(EngineError::Decryption("handle not readable by user".into()));
                }
                Ok(ct.value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripseal_proto::{decode_and_validate, decode_strict};

    fn scoped_input(value: u32) -> EncryptedInputBuilder {
        let mut input = EncryptedInputBuilder::new(Address::repeat_byte(1), Address::repeat_byte(2));
        input.add_u32(value);
        input
    }

    #[tokio::test]
    async fn test_seal_produces_valid_frame() {
        let engine = MockEngine::new();
        let sealed = engine.seal_numeric(&scoped_input(5)).await.unwrap();

        assert_eq!(sealed.handles.len(), 1);
        let validated = decode_strict(&sealed.input_proof).unwrap();
        assert_eq!(validated.frame.num_handles(), 1);
        assert_eq!(validated.frame.num_signers(), 1);
        assert!(validated.frame.contains_handle(&sealed.handles[0]));
        assert_eq!(sealed.handles[0][30], 4);
    }

    #[tokio::test]
    async fn test_coprocessor_signature_recovers() {
        let engine = MockEngine::new();
        let input = scoped_input(5);
        let sealed = engine.seal_numeric(&input).await.unwrap();
        let frame = decode_strict(&sealed.input_proof).unwrap().frame;

        let sig = alloy::primitives::PrimitiveSignature::try_from(&frame.signatures()[0][..]).unwrap();
        let digest = input_proof_digest(&sealed.handles, input.contract(), input.user());
        assert_eq!(
            sig.recover_address_from_prehash(&digest).unwrap(),
            engine.coprocessor_address()
        );
    }

    #[tokio::test]
    async fn test_legacy_trailing_byte() {
        let engine = MockEngine::new().with_legacy_trailing_byte(true);
        let sealed = engine.seal_numeric(&scoped_input(1)).await.unwrap();

        assert_eq!(sealed.input_proof.len(), 2 + 32 + 65 + 1);
        assert!(decode_strict(&sealed.input_proof).is_err());
        assert!(decode_and_validate(&sealed.input_proof).unwrap().trimmed);
    }

    #[tokio::test]
    async fn test_failure_injection_is_consumed() {
        let engine = MockEngine::new();
        engine.fail_next("Relayer didn't response correctly");

        let err = engine.seal_numeric(&scoped_input(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Relayer didn't response correctly");
        assert_eq!(engine.pending_failures(), 0);
        assert!(engine.seal_numeric(&scoped_input(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_handles_are_unique() {
        let engine = MockEngine::new();
        let a = engine.seal_numeric(&scoped_input(1)).await.unwrap();
        let b = engine.seal_numeric(&scoped_input(1)).await.unwrap();
        assert_ne!(a.handles, b.handles);
        assert_eq!(engine.sealed_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let engine = MockEngine::new();
        let input = EncryptedInputBuilder::new(Address::ZERO, Address::ZERO);
        assert!(matches!(
            engine.seal_numeric(&input).await,
            Err(EngineError::InvalidInput(_))
        ));
    }
}
