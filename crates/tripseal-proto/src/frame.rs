//! Encrypted-input proof frame

use crate::error::{ProofError, ProofResult};

/// Length of the `[numHandles][numSigners]` header
pub const HEADER_LEN: usize = 2;
/// Length of one ciphertext handle
pub const HANDLE_LEN: usize = 32;
/// Length of one coprocessor signature (r || s || v)
pub const SIGNATURE_LEN: usize = 65;

/// Opaque on-chain reference to a ciphertext
pub type Handle = [u8; HANDLE_LEN];

/// One recoverable ECDSA signature
pub type SignatureBytes = [u8; SIGNATURE_LEN];

/// Expected proof length for the given header counts
pub fn expected_len(num_handles: u8, num_signers: u8) -> usize {
    HEADER_LEN + HANDLE_LEN * num_handles as usize + SIGNATURE_LEN * num_signers as usize
}

/// How strictly to treat the one-byte-longer legacy framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecMode {
    /// Accept `expected + 1` by dropping the trailing byte
    #[default]
    Tolerant,
    /// Accept only the exact length
    Strict,
}

/// Decoded proof frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofFrame {
    handles: Vec<Handle>,
    signatures: Vec<SignatureBytes>,
}

impl ProofFrame {
    /// Build a frame, rejecting counts that do not fit the 1-byte header
    pub fn new(handles: Vec<Handle>, signatures: Vec<SignatureBytes>) -> ProofResult<Self> {
        if handles.len() > u8::MAX as usize {
            return Err(ProofError::TooMany {
                what: "handles",
                count: handles.len(),
            });
        }
        if signatures.len() > u8::MAX as usize {
            return Err(ProofError::TooMany {
                what: "signers",
                count: signatures.len(),
            });
        }
        Ok(Self {
            handles,
            signatures,
        })
    }

    pub fn num_handles(&self) -> u8 {
        self.handles.len() as u8
    }

    pub fn num_signers(&self) -> u8 {
        self.signatures.len() as u8
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn signatures(&self) -> &[SignatureBytes] {
        &self.signatures
    }

    pub fn handle(&self, index: usize) -> Option<&Handle> {
        self.handles.get(index)
    }

    pub fn signature(&self, index: usize) -> Option<&SignatureBytes> {
        self.signatures.get(index)
    }

    pub fn contains_handle(&self, handle: &Handle) -> bool {
        self.handles.iter().any(|h| h == handle)
    }

    /// Serialized length of this frame
    pub fn encoded_len(&self) -> usize {
        expected_len(self.num_handles(), self.num_signers())
    }

    /// Serialize to the wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.num_handles());
        out.push(self.num_signers());
        for handle in &self.handles {
            out.extend_from_slice(handle);
        }
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out
    }
}

/// A proof that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedProof {
    pub frame: ProofFrame,
    /// Proof bytes to forward on-chain (trimmed when `trimmed` is set)
    pub bytes: Vec<u8>,
    /// Whether the trailing legacy byte was dropped
    pub trimmed: bool,
}

/// Decode a proof, tolerating the one-byte-longer legacy framing
pub fn decode_and_validate(bytes: &[u8]) -> ProofResult<ValidatedProof> {
    decode_with_mode(bytes, CodecMode::Tolerant)
}

/// Decode a proof, accepting only the exact framing
pub fn decode_strict(bytes: &[u8]) -> ProofResult<ValidatedProof> {
    decode_with_mode(bytes, CodecMode::Strict)
}

pub fn decode_with_mode(bytes: &[u8], mode: CodecMode) -> ProofResult<ValidatedProof> {
    let (num_handles, num_signers) = match bytes {
        [h, s, ..] => (*h, *s),
        _ => {
            return Err(ProofError::TooShort {
                got_len: bytes.len(),
            });
        }
    };

    let expected = expected_len(num_handles, num_signers);

    let trimmed = if bytes.len() == expected {
        false
    } else if mode == CodecMode::Tolerant && bytes.len() == expected + 1 {
        tracing::warn!(
            got_len = bytes.len(),
            expected_len = expected,
            num_handles,
            num_signers,
            "proof length off by one, dropping trailing byte"
        );
        true
    } else {
        return Err(ProofError::LengthMismatch {
            got_len: bytes.len(),
            expected_len: expected,
            num_handles,
            num_signers,
        });
    };

    let body = &bytes[HEADER_LEN..expected];
    let (handle_bytes, signature_bytes) = body.split_at(HANDLE_LEN * num_handles as usize);

    let handles = handle_bytes
        .chunks_exact(HANDLE_LEN)
        .map(|chunk| {
            let mut h = [0u8; HANDLE_LEN];
            h.copy_from_slice(chunk);
            h
        })
        .collect();

    let signatures = signature_bytes
        .chunks_exact(SIGNATURE_LEN)
        .map(|chunk| {
            let mut s = [0u8; SIGNATURE_LEN];
            s.copy_from_slice(chunk);
            s
        })
        .collect();

    Ok(ValidatedProof {
        frame: ProofFrame {
            handles,
            signatures,
        },
        bytes: bytes[..expected].to_vec(),
        trimmed,
    })
}
