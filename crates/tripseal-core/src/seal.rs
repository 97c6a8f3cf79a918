//! Payload sealing for free-form trip text
//!
//! Wire format:
//!
//! ```text
//! [version:1 = 0x01][nonce:24][ciphertext || tag:16]
//! ```
//!
//! The owner address is the AEAD associated data and also feeds the key
//! derivation, so a payload sealed for one owner cannot be opened under
//! another owner's capability.

use alloy::primitives::Address;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::error::{SealError, SealResult};

pub const PAYLOAD_VERSION: u8 = 0x01;
pub const NONCE_BYTES: usize = 24;
pub const TAG_BYTES: usize = 16;

const KEY_CONTEXT: &str = "tripseal 2024-06 payload sealing v1";

/// Seals and unseals opaque payloads for an owner
pub trait PayloadSealer: Send + Sync {
    fn seal(&self, owner: Address, plaintext: &[u8]) -> SealResult<Vec<u8>>;

    fn unseal(&self, owner: Address, sealed: &[u8]) -> SealResult<Zeroizing<Vec<u8>>>;
}

/// XChaCha20-Poly1305 with per-owner keys derived from a master secret
pub struct XChaChaSealer {
    master: Zeroizing<[u8; 32]>,
}

impl XChaChaSealer {
    pub fn new(master: [u8; 32]) -> Self {
        Self {
            master: Zeroizing::new(master),
        }
    }

    pub fn random() -> Self {
        let mut master = [0u8; 32];
        OsRng.fill_bytes(&mut master);
        Self::new(master)
    }

    fn owner_key(&self, owner: Address) -> Zeroizing<[u8; 32]> {
        let mut material = Zeroizing::new(Vec::<u8>::with_capacity(52));
        material.extend_from_slice(&self.master[..]);
        material.extend_from_slice(owner.as_slice());
        Zeroizing::new(blake3::derive_key(KEY_CONTEXT, &material))
    }
}

impl PayloadSealer for XChaChaSealer {
    fn seal(&self, owner: Address, plaintext: &[u8]) -> SealResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        let key = self.owner_key(owner);
        let cipher = XChaCha20Poly1305::new((&*key).into());
        let ct = cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: owner.as_slice(),
                },
            )
            .map_err(|_| SealError::Encryption("aead encrypt failed".into()))?;

        let mut out = Vec::with_capacity(1 + NONCE_BYTES + ct.len());
        out.push(PAYLOAD_VERSION);
        out.extend_from_slice(&nonce);
        out.extend(ct);
        Ok(out)
    }

    fn unseal(&self, owner: Address, sealed: &[u8]) -> SealResult<Zeroizing<Vec<u8>>> {
        if sealed.len() < 1 + NONCE_BYTES + TAG_BYTES {
            return Err(SealError::TooShort(sealed.len()));
        }
        if sealed[0] != PAYLOAD_VERSION {
            return Err(SealError::UnsupportedVersion(sealed[0]));
        }

        let (nonce, ct) = sealed[1..].split_at(NONCE_BYTES);
        let key = self.owner_key(owner);
        let cipher = XChaCha20Poly1305::new((&*key).into());
        cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ct,
                    aad: owner.as_slice(),
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| SealError::Authentication)
    }
}
