//! Keyed integrity digest over the unencrypted compacted message.
//!
//! BLAKE3 keyed hashing with a domain-separation label. Deterministic for
//! identical input; verification decodes the transmitted hex form and
//! compares in constant time.

use blake3::Hasher;
use subtle::ConstantTimeEq;

pub const MAC_BYTES: usize = 32;

pub fn keyed_mac(key: &[u8; 32], label: &[u8], data: &[u8]) -> [u8; MAC_BYTES] {
    let mut hasher = Hasher::new_keyed(key);
    hasher.update(b"shroud::mac");
    hasher.update(label);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

pub fn keyed_mac_hex(key: &[u8; 32], label: &[u8], data: &[u8]) -> String {
    hex::encode(keyed_mac(key, label, data))
}

/// Constant-time check of a transmitted hex digest against a freshly
/// computed one. Undecodable or wrong-length input never matches.
pub fn mac_matches(transmitted_hex: &str, computed: &[u8; MAC_BYTES]) -> bool {
    let decoded = match hex::decode(transmitted_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    if decoded.len() != MAC_BYTES {
        return false;
    }
    decoded.ct_eq(computed).into()
}
