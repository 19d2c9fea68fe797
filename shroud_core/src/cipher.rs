//! AEAD seal/open for the cipher stage, plus labeled key and nonce
//! derivation from immutable root material.

use blake3::Hasher;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::error::ShroudError;

pub const KEY_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 12;

/// Derives a working key from a root key, a direction/purpose label, and a
/// per-use salt (message id, stored salt, ...).
pub fn derive_key(root: &[u8; KEY_BYTES], label: &[u8], salt: &[u8]) -> [u8; KEY_BYTES] {
    let mut hasher = Hasher::new_keyed(root);
    hasher.update(b"shroud::key");
    hasher.update(label);
    hasher.update(salt);
    *hasher.finalize().as_bytes()
}

/// Deterministic nonce from labeled parts. Only for uses where the salt is
/// unique per key (at-rest credential storage); message traffic uses fresh
/// random nonces instead.
pub fn derive_nonce(label: &[u8], parts: &[&[u8]]) -> [u8; NONCE_BYTES] {
    let mut hasher = Hasher::new();
    hasher.update(b"shroud::nonce");
    hasher.update(label);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut nonce = [0u8; NONCE_BYTES];
    nonce.copy_from_slice(&digest.as_bytes()[..NONCE_BYTES]);
    nonce
}

pub fn seal(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, ShroudError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| ShroudError::Aead)?;
    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| ShroudError::Aead)
}

/// Inverse of [`seal`]. A wrong key, nonce, aad, or tampered ciphertext
/// fails with [`ShroudError::Decryption`]; garbage is never returned.
pub fn open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, ShroudError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| ShroudError::Aead)?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| ShroudError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: [u8; KEY_BYTES] = [0x11; KEY_BYTES];

    #[test]
    fn seal_open_roundtrip() {
        let key = derive_key(&ROOT, b"request", b"msg-1");
        let nonce = [7u8; NONCE_BYTES];
        let ciphertext = seal(&key, &nonce, b"compacted body", b"msg-1").unwrap();
        assert_ne!(&ciphertext[..], b"compacted body");
        let plaintext = open(&key, &nonce, &ciphertext, b"msg-1").unwrap();
        assert_eq!(plaintext, b"compacted body");
    }

    #[test]
    fn wrong_key_fails_closed() {
        let key = derive_key(&ROOT, b"request", b"msg-1");
        let other = derive_key(&ROOT, b"request", b"msg-2");
        let nonce = [7u8; NONCE_BYTES];
        let ciphertext = seal(&key, &nonce, b"body", b"").unwrap();
        let err = open(&other, &nonce, &ciphertext, b"").unwrap_err();
        assert!(matches!(err, ShroudError::Decryption));
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let key = derive_key(&ROOT, b"request", b"msg-1");
        let nonce = [7u8; NONCE_BYTES];
        let mut ciphertext = seal(&key, &nonce, b"body", b"").unwrap();
        ciphertext[0] ^= 0x01;
        let err = open(&key, &nonce, &ciphertext, b"").unwrap_err();
        assert!(matches!(err, ShroudError::Decryption));
    }

    #[test]
    fn aad_binds_the_ciphertext() {
        let key = derive_key(&ROOT, b"request", b"msg-1");
        let nonce = [7u8; NONCE_BYTES];
        let ciphertext = seal(&key, &nonce, b"body", b"msg-1").unwrap();
        assert!(open(&key, &nonce, &ciphertext, b"msg-2").is_err());
    }

    #[test]
    fn derived_keys_separate_by_label_and_salt() {
        let a = derive_key(&ROOT, b"request", b"msg-1");
        let b = derive_key(&ROOT, b"response", b"msg-1");
        let c = derive_key(&ROOT, b"request", b"msg-2");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn derived_nonce_is_stable() {
        let a = derive_nonce(b"stored-credential", &[b"salt"]);
        let b = derive_nonce(b"stored-credential", &[b"salt"]);
        assert_eq!(a, b);
    }
}
