//! # tripseal-core: Confidential trip vault client
//!
//! Submits trips to a confidential-storage contract and reads them back:
//!
//! - free-form text (route, schedule) is sealed with XChaCha20-Poly1305 and
//!   stored as opaque bytes;
//! - numeric fields (nights, unit counter) are encrypted by an external FHE
//!   engine into `(handle, proof)` pairs the contract can compute on;
//! - reading requires a time-bounded decryption capability: an EIP-712
//!   signature over an ephemeral public key, cached until it expires.
//!
//! ## Layers
//!
//! | Module       | Role                                                 |
//! |--------------|------------------------------------------------------|
//! | `retry`      | bounded linear backoff around the encryption oracle  |
//! | `engine`     | `FheEngine` trait, input builder, `MockEngine`       |
//! | `pipeline`   | `u32` → validated `EncryptedInput`                   |
//! | `capability` | issue, persist and reuse `DecryptionCapability`s     |
//! | `seal`       | payload sealing bound to the owner address           |
//! | `ledger`     | contract ABI, `InMemoryLedger`, JSON-RPC ledger      |
//! | `vault`      | `VaultClient`: submit / retrieve / list              |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tripseal_core::{InMemoryLedger, LocalSigner, MockEngine, TripDraft, VaultClient, XChaChaSealer};
//! use tripseal_storage::InMemoryCapabilityStore;
//!
//! let engine = Arc::new(MockEngine::new());
//! let ledger = Arc::new(InMemoryLedger::new(contract));
//! let vault = VaultClient::new(ledger, Arc::new(InMemoryCapabilityStore::new()), Arc::new(XChaChaSealer::random()))
//!     .with_engine(engine)
//!     .with_signer(Arc::new(LocalSigner::random()));
//!
//! let receipt = vault.submit(&draft).await?;
//! let trip = vault.retrieve(receipt.record_id.unwrap_or_default()).await?;
//! ```

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod retry;
pub mod seal;
pub mod vault;

pub use capability::{
    CapabilityPolicy, CapabilitySigner, DecryptionCapability, LocalSigner, SignError,
    load_or_sign,
};
pub use config::VaultSettings;
pub use engine::backends::MockEngine;
pub use engine::{EncryptedInputBuilder, FheEngine, SealedInput};
pub use error::{ErrorKind, VaultError, VaultResult};
pub use ledger::{InMemoryLedger, LedgerWriteParams, StoredRecord, TripLedger};
pub use pipeline::{EncryptedInput, EncryptionPipeline, encrypt_numeric};
pub use retry::{Retry, RetryPolicy, RetryResult, run_with_retry};
pub use seal::{PayloadSealer, XChaChaSealer};
pub use vault::{
    DecryptedTrip, IllegalTransition, OperationKind, OperationPhase, OperationTracker,
    ProgressObserver, SubmitReceipt, TravelStyle, TripDraft, TripSummary, VaultClient,
};
