//! FHE engine abstraction
//!
//! The engine is everything that touches homomorphic ciphertexts: sealing
//! clear values into on-chain handles (via the coprocessor/relayer) and
//! user-decrypting handles under a signed capability. The vault only sees
//! handles and proofs.

pub mod backends;

use alloy::primitives::{Address, B256, keccak256};
use async_trait::async_trait;
use tripseal_proto::Handle;
use zeroize::Zeroizing;

use crate::capability::DecryptionCapability;
use crate::error::EngineResult;

/// A clear value queued for encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl ClearValue {
    pub fn bit_width(&self) -> u32 {
        match self {
            ClearValue::Bool(_) => 1,
            ClearValue::U8(_) => 8,
            ClearValue::U16(_) => 16,
            ClearValue::U32(_) => 32,
            ClearValue::U64(_) => 64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match *self {
            ClearValue::Bool(b) => b as u64,
            ClearValue::U8(v) => v as u64,
            ClearValue::U16(v) => v as u64,
            ClearValue::U32(v) => v as u64,
            ClearValue::U64(v) => v,
        }
    }

    /// Ciphertext type tag embedded in handles
    pub fn type_tag(&self) -> u8 {
        match self {
            ClearValue::Bool(_) => 0,
            ClearValue::U8(_) => 2,
            ClearValue::U16(_) => 3,
            ClearValue::U32(_) => 4,
            ClearValue::U64(_) => 5,
        }
    }
}

/// Engine-native encrypted input, scoped to one `(contract, user)` pair
///
/// Handles produced from it are only accepted by `contract` when submitted
/// by `user`.
#[derive(Debug, Clone)]
pub struct EncryptedInputBuilder {
    contract: Address,
    user: Address,
    values: Vec<ClearValue>,
}

impl EncryptedInputBuilder {
    pub fn new(contract: Address, user: Address) -> Self {
        Self {
            contract,
            user,
            values: Vec::new(),
        }
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.values.push(ClearValue::Bool(value));
        self
    }

    pub fn add_u8(&mut self, value: u8) -> &mut Self {
        self.values.push(ClearValue::U8(value));
        self
    }

    pub fn add_u16(&mut self, value: u16) -> &mut Self {
        self.values.push(ClearValue::U16(value));
        self
    }

    pub fn add_u32(&mut self, value: u32) -> &mut Self {
        self.values.push(ClearValue::U32(value));
        self
    }

    pub fn add_u64(&mut self, value: u64) -> &mut Self {
        self.values.push(ClearValue::U64(value));
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn user(&self) -> Address {
        self.user
    }

    pub fn values(&self) -> &[ClearValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Engine output: one handle per added value plus the shared input proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedInput {
    pub handles: Vec<Handle>,
    pub input_proof: Vec<u8>,
}

/// Ephemeral keypair for user decryption
pub struct EngineKeypair {
    pub public_key: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

/// A handle to decrypt together with the contract it is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRef {
    pub handle: Handle,
    pub contract: Address,
}

/// FHE engine operations
///
/// Implementations must be thread-safe; the vault shares one engine across
/// operations.
#[async_trait]
pub trait FheEngine: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Chain the engine's handles belong to
    fn chain_id(&self) -> u64;

    /// Verifying contract of the decryption EIP-712 domain
    fn decryption_verifier(&self) -> Address;

    /// Generate an ephemeral keypair for a decryption capability
    fn generate_keypair(&self) -> EngineResult<EngineKeypair>;

    /// Encrypt the queued values, returning handles and an input proof
    ///
    /// Errors carry the oracle's message unchanged so callers can tell
    /// transient outages from terminal rejections.
    async fn seal_numeric(&self, input: &EncryptedInputBuilder) -> EngineResult<SealedInput>;

    /// Decrypt handles the capability's user is allowed to read
    async fn user_decrypt(
        &self,
        handles: &[HandleRef],
        capability: &DecryptionCapability,
    ) -> EngineResult<Vec<u64>>;
}

/// Digest the coprocessor signs for an input proof
///
/// Binds the handles to the contract and user they were produced for.
pub fn input_proof_digest(handles: &[Handle], contract: Address, user: Address) -> B256 {
    let mut buf = Vec::with_capacity(handles.len() * 32 + 40);
    for handle in handles {
        buf.extend_from_slice(handle);
    }
    buf.extend_from_slice(contract.as_slice());
    buf.extend_from_slice(user.as_slice());
    keccak256(buf)
}
