//! Encryption pipeline: clear `u32` → validated `(handle, proof)`

use std::sync::Arc;

use alloy::primitives::Address;
use tripseal_proto::{CodecMode, Handle, decode_with_mode};

use crate::engine::{EncryptedInputBuilder, FheEngine, SealedInput};
use crate::error::{EngineError, VaultError, VaultResult};
use crate::retry::{Retry, RetryPolicy, is_oracle_outage, is_transient_message};

/// One numeric value ready for a ledger write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handle: Handle,
    /// Validated proof bytes (legacy trailing byte already dropped)
    pub proof: Vec<u8>,
}

/// Engine wrapper adding retry and proof validation
#[derive(Clone)]
pub struct EncryptionPipeline {
    engine: Option<Arc<dyn FheEngine>>,
    retry: RetryPolicy,
    codec: CodecMode,
}

impl EncryptionPipeline {
    pub fn new(engine: Option<Arc<dyn FheEngine>>) -> Self {
        Self {
            engine,
            retry: RetryPolicy::oracle(),
            codec: CodecMode::Tolerant,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_codec(mut self, codec: CodecMode) -> Self {
        self.codec = codec;
        self
    }

    /// Encrypt `value` for `contract`, to be submitted by `signer`
    ///
    /// `on_attempt` is called before every oracle attempt.
    pub async fn encrypt_u32(
        &self,
        contract: Address,
        signer: Option<Address>,
        value: u32,
        on_attempt: impl FnMut(u32),
    ) -> VaultResult<EncryptedInput> {
        let engine = self
            .engine
            .as_deref()
            .ok_or_else(|| VaultError::EngineUnavailable("Missing FHE instance or signer".into()))?;
        let signer = match signer {
            Some(addr) if addr != Address::ZERO => addr,
            _ => {
                return Err(VaultError::EngineUnavailable(
                    "Missing FHE instance or signer".into(),
                ));
            }
        };

        let mut input = EncryptedInputBuilder::new(contract, signer);
        input.add_u32(value);

        let outcome = Retry::new(self.retry.clone())
            .run_observed(
                || engine.seal_numeric(&input),
                |e: &EngineError| is_oracle_transient(e),
                on_attempt,
            )
            .await;

        let attempts = outcome.attempts;
        let sealed = outcome
            .into_result()
            .map_err(|e| classify_engine_error(e, attempts))?;

        validate_sealed(sealed, 1, self.codec)
    }
}

/// Encrypt one `u32` with the default oracle retry policy
pub async fn encrypt_numeric(
    engine: Option<Arc<dyn FheEngine>>,
    contract: Address,
    signer: Option<Address>,
    value: u32,
) -> VaultResult<EncryptedInput> {
    EncryptionPipeline::new(engine)
        .encrypt_u32(contract, signer, value, |_| {})
        .await
}

fn is_oracle_transient(err: &EngineError) -> bool {
    matches!(err, EngineError::Oracle(msg) if is_transient_message(msg))
}

fn classify_engine_error(err: EngineError, attempts: u32) -> VaultError {
    match err {
        EngineError::Oracle(msg) if is_oracle_outage(&msg) => {
            tracing::warn!(attempts, last_error = %msg, "encryption oracle unavailable");
            VaultError::OracleUnavailable {
                attempts,
                last_error: msg,
            }
        }
        EngineError::Unavailable(msg) => VaultError::EngineUnavailable(msg),
        EngineError::Oracle(msg) => VaultError::Engine(msg),
        other => VaultError::Engine(other.to_string()),
    }
}

fn validate_sealed(
    sealed: SealedInput,
    expected_handles: usize,
    codec: CodecMode,
) -> VaultResult<EncryptedInput> {
    let validated = decode_with_mode(&sealed.input_proof, codec)?;

    if sealed.handles.len() != expected_handles {
        return Err(VaultError::ProofInconsistent(format!(
            "engine returned {} handles for {expected_handles} values",
            sealed.handles.len()
        )));
    }
    let handle = sealed.handles[0];
    if !validated.frame.contains_handle(&handle) {
        return Err(VaultError::ProofInconsistent(
            "returned handle is not covered by the proof".into(),
        ));
    }

    Ok(EncryptedInput {
        handle,
        proof: validated.bytes,
    })
}
