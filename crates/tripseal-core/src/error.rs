use thiserror::Error;
use tripseal_proto::ProofError;
use tripseal_storage::StoreError;

use crate::vault::IllegalTransition;

/// Selector of the input verifier's `InvalidProof` revert
pub const INVALID_PROOF_SELECTOR: &str = "0x1817ecd7";

/// Errors from an FHE engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine not available: {0}")]
    Unavailable(String),

    /// Raw failure reported by the encryption oracle; the message is kept
    /// verbatim so transient conditions can be recognised from it
    #[error("{0}")]
    Oracle(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from payload sealing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SealError {
    #[error("Sealed payload too short: {0} bytes")]
    TooShort(usize),

    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    #[error("Payload authentication failed")]
    Authentication,

    #[error("Sealing failed: {0}")]
    Encryption(String),
}

pub type SealResult<T> = Result<T, SealError>;

/// Errors from the ledger collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Contract call failed: {0}")]
    Call(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Trip {0} not found")]
    NotFound(u64),

    #[error("Input proof rejected ({INVALID_PROOF_SELECTOR}): {0}")]
    InvalidProof(String),

    #[error("Invalid ledger configuration: {0}")]
    Config(String),
}

impl LedgerError {
    /// Whether the chain's input verifier rejected an encrypted input
    pub fn is_proof_rejection(&self) -> bool {
        match self {
            LedgerError::InvalidProof(_) => true,
            LedgerError::Call(msg) | LedgerError::Transaction(msg) => {
                msg.contains(INVALID_PROOF_SELECTOR)
            }
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors from the capability cache
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Ephemeral keypair generation failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Capability store error: {0}")]
    Store(#[from] StoreError),
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("FHE engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Malformed input proof: {0}")]
    ProofMalformed(#[from] ProofError),

    #[error("Inconsistent input proof: {0}")]
    ProofInconsistent(String),

    #[error("Relayer temporarily unavailable. Please try again in a moment.")]
    OracleUnavailable { attempts: u32, last_error: String },

    /// Terminal engine failure, message passed through unchanged
    #[error("{0}")]
    Engine(String),

    #[error("Decryption authorization denied by user")]
    AuthorizationDenied,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Seal(#[from] SealError),

    #[error("Decrypted payload is not valid: {0}")]
    Payload(String),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    State(#[from] IllegalTransition),
}

pub type VaultResult<T> = Result<T, VaultError>;

/// User-facing failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProofMalformed,
    OracleUnavailable,
    AuthorizationDenied,
    LedgerCallFailed,
    InvalidRequest,
    Integrity,
}

impl ErrorKind {
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorKind::ProofMalformed => {
                "The encryption service returned an unsupported proof format. Restart the node and refresh."
            }
            ErrorKind::OracleUnavailable => {
                "Relayer temporarily unavailable. Please try again in a moment."
            }
            ErrorKind::AuthorizationDenied => "Authorize decryption in your wallet to continue.",
            ErrorKind::LedgerCallFailed => "The contract call failed. Check the network and retry.",
            ErrorKind::InvalidRequest => "Check the request and try again.",
            ErrorKind::Integrity => "Stored data could not be authenticated.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::ProofMalformed => "proof-malformed",
            ErrorKind::OracleUnavailable => "oracle-unavailable",
            ErrorKind::AuthorizationDenied => "authorization-denied",
            ErrorKind::LedgerCallFailed => "ledger-call-failed",
            ErrorKind::InvalidRequest => "invalid-request",
            ErrorKind::Integrity => "integrity",
        };
        write!(f, "{s}")
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::ProofMalformed(_) | VaultError::ProofInconsistent(_) => {
                ErrorKind::ProofMalformed
            }
            VaultError::OracleUnavailable { .. } => ErrorKind::OracleUnavailable,
            VaultError::AuthorizationDenied => ErrorKind::AuthorizationDenied,
            VaultError::Ledger(e) if e.is_proof_rejection() => ErrorKind::ProofMalformed,
            VaultError::Ledger(_) => ErrorKind::LedgerCallFailed,
            VaultError::Seal(_) | VaultError::Payload(_) => ErrorKind::Integrity,
            VaultError::Capability(CapabilityError::Store(_)) => ErrorKind::Integrity,
            VaultError::Capability(CapabilityError::Engine(_))
            | VaultError::InvalidRequest(_)
            | VaultError::EngineUnavailable(_)
            | VaultError::Engine(_)
            | VaultError::State(_) => ErrorKind::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_failure_has_one_kind() {
        let cases = [
            (
                VaultError::ProofMalformed(ProofError::TooShort { got_len: 1 }),
                ErrorKind::ProofMalformed,
            ),
            (
                VaultError::OracleUnavailable {
                    attempts: 3,
                    last_error: "Bad JSON".into(),
                },
                ErrorKind::OracleUnavailable,
            ),
            (VaultError::AuthorizationDenied, ErrorKind::AuthorizationDenied),
            (
                VaultError::Ledger(LedgerError::Call("reverted".into())),
                ErrorKind::LedgerCallFailed,
            ),
            (
                VaultError::Ledger(LedgerError::Transaction(
                    "execution reverted: 0x1817ecd7".into(),
                )),
                ErrorKind::ProofMalformed,
            ),
            (
                VaultError::InvalidRequest("title".into()),
                ErrorKind::InvalidRequest,
            ),
            (VaultError::Seal(SealError::Authentication), ErrorKind::Integrity),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_oracle_message_is_normalized() {
        let err = VaultError::OracleUnavailable {
            attempts: 3,
            last_error: "Relayer didn't response correctly".into(),
        };
        assert_eq!(
            err.to_string(),
            "Relayer temporarily unavailable. Please try again in a moment."
        );
    }

    #[test]
    fn test_engine_message_passes_through() {
        let err = VaultError::Engine("value out of range".into());
        assert_eq!(err.to_string(), "value out of range");
    }
}
