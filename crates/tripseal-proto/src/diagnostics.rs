//! Human-facing proof summaries (used by `tripseal proof inspect`)

use serde::Serialize;

use crate::encoding::encode_hex;
use crate::frame::{HEADER_LEN, decode_and_validate, expected_len};

/// Outcome of decoding a proof in tolerant mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Exact,
    TrailingByte,
    Malformed,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Exact => write!(f, "valid"),
            Verdict::TrailingByte => write!(f, "valid (legacy trailing byte)"),
            Verdict::Malformed => write!(f, "malformed"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProofDiagnostics {
    pub len: usize,
    /// `None` when the header itself is missing
    pub num_handles: Option<u8>,
    pub num_signers: Option<u8>,
    pub expected_len: Option<usize>,
    pub verdict: Verdict,
    pub handles: Vec<String>,
    pub signatures: Vec<String>,
}

/// Summarize any byte sequence; never fails
pub fn diagnose(bytes: &[u8]) -> ProofDiagnostics {
    let header = (bytes.len() >= HEADER_LEN).then(|| (bytes[0], bytes[1]));

    let mut diag = ProofDiagnostics {
        len: bytes.len(),
        num_handles: header.map(|(h, _)| h),
        num_signers: header.map(|(_, s)| s),
        expected_len: header.map(|(h, s)| expected_len(h, s)),
        verdict: Verdict::Malformed,
        handles: Vec::new(),
        signatures: Vec::new(),
    };

    if let Ok(validated) = decode_and_validate(bytes) {
        diag.verdict = if validated.trimmed {
            Verdict::TrailingByte
        } else {
            Verdict::Exact
        };
        diag.handles = validated.frame.handles().iter().map(encode_hex).collect();
        diag.signatures = validated
            .frame
            .signatures()
            .iter()
            .map(encode_hex)
            .collect();
    }

    diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ProofFrame;

    #[test]
    fn test_diagnose_exact() {
        let bytes = ProofFrame::new(vec![[0xab; 32]], vec![[0x01; 65]])
            .unwrap()
            .encode();
        let diag = diagnose(&bytes);

        assert_eq!(diag.verdict, Verdict::Exact);
        assert_eq!(diag.expected_len, Some(99));
        assert_eq!(diag.handles, vec![format!("0x{}", "ab".repeat(32))]);
    }

    #[test]
    fn test_diagnose_headerless() {
        let diag = diagnose(&[7]);
        assert_eq!(diag.verdict, Verdict::Malformed);
        assert_eq!(diag.num_handles, None);
        assert_eq!(diag.expected_len, None);
    }

    #[test]
    fn test_diagnose_serializes() {
        let diag = diagnose(&[0, 0, 0]);
        assert_eq!(diag.verdict, Verdict::TrailingByte);

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["verdict"], "trailing_byte");
    }
}
