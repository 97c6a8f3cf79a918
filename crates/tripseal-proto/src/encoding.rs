//! `0x`-prefixed hex, the encoding every EVM tool prints

use crate::error::{ProofError, ProofResult};

/// Encode bytes as lowercase `0x`-prefixed hex
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex, with or without `0x` prefix, ignoring surrounding whitespace
pub fn decode_hex(s: &str) -> ProofResult<Vec<u8>> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| ProofError::InvalidHex(e.to_string()))
}
