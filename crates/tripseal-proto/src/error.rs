use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("Proof too short: {got_len} bytes (header needs 2)")]
    TooShort { got_len: usize },

    #[error(
        "Proof length mismatch: got {got_len}, expected {expected_len} \
         (handles={num_handles}, signers={num_signers})"
    )]
    LengthMismatch {
        got_len: usize,
        expected_len: usize,
        num_handles: u8,
        num_signers: u8,
    },

    #[error("Too many {what}: {count} (max 255)")]
    TooMany { what: &'static str, count: usize },

    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

impl ProofError {
    /// Whether this error describes a proof whose framing is broken
    ///
    /// Construction and hex-parsing errors are caller mistakes, not
    /// protocol mismatches.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ProofError::TooShort { .. } | ProofError::LengthMismatch { .. }
        )
    }
}

pub type ProofResult<T> = Result<T, ProofError>;
