//! Property-based tests for proof framing
//!
//! Proofs are built from arbitrary header counts and body bytes, so the
//! properties hold for any content, not just frames produced by an engine.

use proptest::prelude::*;
use tripseal_proto::{ProofError, decode_and_validate, decode_strict, expected_len};

fn raw_proof(num_handles: u8, num_signers: u8, fill: u8) -> Vec<u8> {
    let mut bytes = vec![num_handles, num_signers];
    bytes.resize(expected_len(num_handles, num_signers), fill);
    bytes
}

proptest! {
    /// Property: every correctly sized proof decodes with the header counts
    #[test]
    fn prop_exact_length_accepted(n in 0u8..16, m in 0u8..8, fill in any::<u8>()) {
        let bytes = raw_proof(n, m, fill);
        let validated = decode_and_validate(&bytes).unwrap();

        prop_assert_eq!(validated.frame.num_handles(), n);
        prop_assert_eq!(validated.frame.num_signers(), m);
        prop_assert_eq!(validated.bytes, bytes);
        prop_assert!(!validated.trimmed);
    }

    /// Property: one extra byte is dropped and the frame is unchanged
    #[test]
    fn prop_single_extra_byte_trimmed(n in 0u8..16, m in 0u8..8, extra in any::<u8>()) {
        let bytes = raw_proof(n, m, 0x5a);
        let exact = decode_and_validate(&bytes).unwrap();

        let mut longer = bytes.clone();
        longer.push(extra);
        let validated = decode_and_validate(&longer).unwrap();

        prop_assert_eq!(validated.frame, exact.frame);
        prop_assert_eq!(validated.bytes, bytes);
        prop_assert!(validated.trimmed);
        prop_assert!(decode_strict(&longer).is_err());
    }

    /// Property: two extra bytes are always malformed
    #[test]
    fn prop_two_extra_bytes_rejected(n in 0u8..16, m in 0u8..8, a in any::<u8>(), b in any::<u8>()) {
        let mut bytes = raw_proof(n, m, 0);
        bytes.extend([a, b]);

        let is_mismatch = matches!(
            decode_and_validate(&bytes),
            Err(ProofError::LengthMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    /// Property: inputs shorter than the header are malformed
    #[test]
    fn prop_short_inputs_rejected(bytes in prop::collection::vec(any::<u8>(), 0..2)) {
        let err = decode_and_validate(&bytes).unwrap_err();
        prop_assert!(err.is_malformed());
    }

    /// Property: decoding is total over arbitrary bytes
    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        match decode_and_validate(&bytes) {
            Ok(v) => prop_assert!(v.bytes.len() == bytes.len() || v.bytes.len() + 1 == bytes.len()),
            Err(e) => prop_assert!(e.is_malformed()),
        }
    }
}
