//! tripseal-proto: Wire formats for FHE encrypted inputs
//!
//! An encrypted input travels on-chain as a `(handle, proof)` pair. The
//! handle is an opaque 32-byte reference; the proof is a fixed binary frame
//! checked by the chain's input verifier:
//!
//! ```text
//! [numHandles:1][numSigners:1][handles: numHandles × 32][signatures: numSigners × 65]
//! ```
//!
//! ## Decoding Modes
//!
//! | Mode       | Exact length | Length + 1          | Anything else |
//! |------------|--------------|---------------------|---------------|
//! | `Tolerant` | accepted     | trimmed, logged     | rejected      |
//! | `Strict`   | accepted     | rejected            | rejected      |
//!
//! The one-byte-longer variant comes from oracle/proxy stacks that emit a
//! 66-byte final signature. `Tolerant` is the client default; `Strict`
//! mirrors what the on-chain verifier accepts.
//!
//! ## Example
//!
//! ```rust
//! use tripseal_proto::{ProofFrame, decode_and_validate};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = ProofFrame::new(vec![[7u8; 32]], vec![[1u8; 65]])?;
//! let bytes = frame.encode();
//!
//! let validated = decode_and_validate(&bytes)?;
//! assert_eq!(validated.frame, frame);
//! assert!(!validated.trimmed);
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod frame;

pub use diagnostics::{ProofDiagnostics, Verdict, diagnose};
pub use encoding::{decode_hex, encode_hex};
pub use error::{ProofError, ProofResult};
pub use frame::{
    CodecMode, HANDLE_LEN, HEADER_LEN, Handle, ProofFrame, SIGNATURE_LEN, SignatureBytes,
    ValidatedProof, decode_and_validate, decode_strict, decode_with_mode, expected_len,
};
