//! Shipped full-strength profile.
//!
//! Per-message ChaCha20-Poly1305 keys derived from immutable subkeys, keyed
//! BLAKE3 integrity digest, embedded-vs-envelope Phase 1 checks, replay
//! lookup in Phase 2, and rename+decoy obfuscation schemes per direction.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{derive_key, derive_nonce, open, seal, NONCE_BYTES};
use crate::error::ShroudError;
use crate::mac::keyed_mac_hex;
use crate::message::{Request, Response};
use crate::obfuscate::FieldScheme;
use crate::package::{Package, FIELD_MAC, FIELD_PAYLOAD, FIELD_VECTORS, FIELD_VERSION};
use crate::profile::{Gate, SealedBody, SecurityProfile};
use crate::replay::{MemoryReplayStore, ReplayStore};
use crate::rng::{fill_random, random_token};
use crate::vectors::{Vectors, MESSAGE_ID, NONCE, SALT, TIMESTAMP};

pub const CREDENTIAL_HEADER: &str = "password";

const MESSAGE_ID_BYTES: usize = 16;
const UNSOLICITED_SALT: &str = "unsolicited";

const REQUEST_SCHEME: FieldScheme = FieldScheme::new(
    &[
        (FIELD_VERSION, "v"),
        (FIELD_PAYLOAD, "opaque"),
        (FIELD_MAC, "crc"),
        (FIELD_VECTORS, "trailer"),
    ],
    &["hop", "window"],
);

const RESPONSE_SCHEME: FieldScheme = FieldScheme::new(
    &[
        (FIELD_VERSION, "rev"),
        (FIELD_PAYLOAD, "frame"),
        (FIELD_MAC, "sum"),
        (FIELD_VECTORS, "echo"),
    ],
    &["lane"],
);

/// Immutable key material injected at profile construction. Each concern
/// gets its own subkey; per-message keys are derived, never stored.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyConfig {
    message: [u8; 32],
    credential: [u8; 32],
    storage: [u8; 32],
    mac: [u8; 32],
}

impl KeyConfig {
    pub fn new(
        message: [u8; 32],
        credential: [u8; 32],
        storage: [u8; 32],
        mac: [u8; 32],
    ) -> Self {
        Self {
            message,
            credential,
            storage,
            mac,
        }
    }

    /// Derives the four subkeys from a single deployment root key.
    pub fn from_root(root: &[u8; 32]) -> Self {
        Self {
            message: derive_key(root, b"subkey", b"message"),
            credential: derive_key(root, b"subkey", b"credential"),
            storage: derive_key(root, b"subkey", b"storage"),
            mac: derive_key(root, b"subkey", b"mac"),
        }
    }
}

pub struct StandardProfile {
    keys: KeyConfig,
    replay: Arc<dyn ReplayStore>,
    request_scheme: FieldScheme,
    response_scheme: FieldScheme,
}

impl StandardProfile {
    pub fn new(keys: KeyConfig, replay: Arc<dyn ReplayStore>) -> Self {
        Self {
            keys,
            replay,
            request_scheme: REQUEST_SCHEME,
            response_scheme: RESPONSE_SCHEME,
        }
    }

    /// Convenience constructor backed by a process-local replay store.
    pub fn with_memory_replay(keys: KeyConfig) -> Self {
        Self::new(keys, Arc::new(MemoryReplayStore::new()))
    }

    pub fn with_schemes(mut self, request: FieldScheme, response: FieldScheme) -> Self {
        self.request_scheme = request;
        self.response_scheme = response;
        self
    }

    fn mask_credential(&self, clear: &str, message_id: &str) -> Result<String, ShroudError> {
        let key = derive_key(&self.keys.credential, b"credential", message_id.as_bytes());
        let nonce = derive_nonce(b"credential", &[message_id.as_bytes()]);
        let sealed = seal(&key, &nonce, clear.as_bytes(), message_id.as_bytes())?;
        Ok(hex::encode(sealed))
    }

    fn unmask_credential(&self, masked: &str, message_id: &str) -> Result<String, ShroudError> {
        let key = derive_key(&self.keys.credential, b"credential", message_id.as_bytes());
        let nonce = derive_nonce(b"credential", &[message_id.as_bytes()]);
        let sealed = hex::decode(masked).map_err(|_| ShroudError::Credential)?;
        let clear = open(&key, &nonce, &sealed, message_id.as_bytes())
            .map_err(|_| ShroudError::Credential)?;
        String::from_utf8(clear).map_err(|_| ShroudError::Credential)
    }

    fn decode_nonce(vectors: &Vectors) -> Result<[u8; NONCE_BYTES], ShroudError> {
        let nonce_hex = vectors.get(NONCE).ok_or(ShroudError::MissingVector { name: NONCE })?;
        let bytes = hex::decode(nonce_hex).map_err(|_| ShroudError::Decryption)?;
        if bytes.len() != NONCE_BYTES {
            return Err(ShroudError::Decryption);
        }
        let mut nonce = [0u8; NONCE_BYTES];
        nonce.copy_from_slice(&bytes);
        Ok(nonce)
    }
}

impl SecurityProfile for StandardProfile {
    fn secure_request(&self, mut request: Request) -> Result<Request, ShroudError> {
        let message_id = request
            .variable_or_insert(MESSAGE_ID, random_token(MESSAGE_ID_BYTES))
            .to_owned();
        request.variable_or_insert(TIMESTAMP, unix_millis().to_string());
        if let Some(clear) = request.header(CREDENTIAL_HEADER).map(str::to_owned) {
            let masked = self.mask_credential(&clear, &message_id)?;
            request.set_header(CREDENTIAL_HEADER, &masked);
        }
        Ok(request)
    }

    fn unsecure_request(&self, mut request: Request) -> Result<Request, ShroudError> {
        let message_id = request
            .variable(MESSAGE_ID)
            .ok_or(ShroudError::MissingVector { name: MESSAGE_ID })?
            .to_owned();
        if let Some(masked) = request.header(CREDENTIAL_HEADER).map(str::to_owned) {
            let clear = self.unmask_credential(&masked, &message_id)?;
            request.set_header(CREDENTIAL_HEADER, &clear);
        }
        Ok(request)
    }

    fn encrypt_request(
        &self,
        compacted: &[u8],
        request: &Request,
    ) -> Result<SealedBody, ShroudError> {
        let message_id = request
            .variable(MESSAGE_ID)
            .ok_or(ShroudError::MissingVector { name: MESSAGE_ID })?;
        let key = derive_key(&self.keys.message, b"request", message_id.as_bytes());
        let mut nonce = [0u8; NONCE_BYTES];
        fill_random(&mut nonce);
        let ciphertext = seal(&key, &nonce, compacted, message_id.as_bytes())?;
        Ok(SealedBody {
            ciphertext,
            attach: vec![(NONCE.to_owned(), hex::encode(nonce))],
        })
    }

    fn decrypt_request(
        &self,
        ciphertext: &[u8],
        vectors: &Vectors,
    ) -> Result<Vec<u8>, ShroudError> {
        let message_id = vectors
            .get(MESSAGE_ID)
            .ok_or(ShroudError::MissingVector { name: MESSAGE_ID })?;
        let nonce = Self::decode_nonce(vectors)?;
        let key = derive_key(&self.keys.message, b"request", message_id.as_bytes());
        open(&key, &nonce, ciphertext, message_id.as_bytes())
    }

    fn encrypt_response(
        &self,
        compacted: &[u8],
        response: &Response,
    ) -> Result<SealedBody, ShroudError> {
        let salt = response.vector(MESSAGE_ID).unwrap_or(UNSOLICITED_SALT);
        let key = derive_key(&self.keys.message, b"response", salt.as_bytes());
        let mut nonce = [0u8; NONCE_BYTES];
        fill_random(&mut nonce);
        let ciphertext = seal(&key, &nonce, compacted, salt.as_bytes())?;
        Ok(SealedBody {
            ciphertext,
            attach: vec![(NONCE.to_owned(), hex::encode(nonce))],
        })
    }

    fn decrypt_response(
        &self,
        ciphertext: &[u8],
        vectors: &Vectors,
    ) -> Result<Vec<u8>, ShroudError> {
        let salt = vectors.get(MESSAGE_ID).unwrap_or(UNSOLICITED_SALT);
        let nonce = Self::decode_nonce(vectors)?;
        let key = derive_key(&self.keys.message, b"response", salt.as_bytes());
        open(&key, &nonce, ciphertext, salt.as_bytes())
    }

    fn generate_mac(&self, compacted: &[u8]) -> String {
        keyed_mac_hex(&self.keys.mac, b"message", compacted)
    }

    fn invalidate_request(&self, request: &Request, vectors: &Vectors) -> Gate {
        // Embedded variables were sealed inside the ciphertext; the envelope
        // copies travel in clear. Any divergence means tampering or replay
        // splicing, caught before credential restoration.
        for name in [TIMESTAMP, MESSAGE_ID] {
            match (request.variable(name), vectors.get(name)) {
                (Some(embedded), Some(envelope)) if embedded == envelope => {}
                _ => return Gate::Reject,
            }
        }
        Gate::Pass
    }

    fn final_invalidation(&self, request: &Request, _vectors: &Vectors) -> Gate {
        match request.variable(MESSAGE_ID) {
            Some(message_id) => Gate::when(!self.replay.witness(message_id)),
            None => Gate::Reject,
        }
    }

    fn obfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError> {
        self.request_scheme.apply(package)
    }

    fn deobfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError> {
        self.request_scheme.revert(package)
    }

    fn obfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError> {
        self.response_scheme.apply(package)
    }

    fn deobfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError> {
        self.response_scheme.revert(package)
    }

    fn prepare_response(
        &self,
        mut response: Response,
        origin: Option<&Request>,
    ) -> Result<Response, ShroudError> {
        if let Some(request) = origin {
            let message_id = request
                .variable(MESSAGE_ID)
                .ok_or(ShroudError::MissingVector { name: MESSAGE_ID })?;
            response.set_vector(MESSAGE_ID, message_id);
        }
        Ok(response)
    }

    fn validate_response(&self, response: &Response, sent: &Vectors) -> Gate {
        match (response.vector(MESSAGE_ID), sent.get(MESSAGE_ID)) {
            (Some(received), Some(expected)) => Gate::when(received == expected),
            _ => Gate::Reject,
        }
    }

    fn encrypt_server_password(&self, clear: &str, aux: &Vectors) -> Result<String, ShroudError> {
        let salt = aux.get(SALT).ok_or(ShroudError::MissingVector { name: SALT })?;
        let key = derive_key(&self.keys.storage, b"stored-credential", salt.as_bytes());
        let nonce = derive_nonce(b"stored-credential", &[salt.as_bytes()]);
        let sealed = seal(&key, &nonce, clear.as_bytes(), salt.as_bytes())?;
        Ok(hex::encode(sealed))
    }

    fn decrypt_server_password(&self, stored: &str, aux: &Vectors) -> Result<String, ShroudError> {
        let salt = aux.get(SALT).ok_or(ShroudError::MissingVector { name: SALT })?;
        let key = derive_key(&self.keys.storage, b"stored-credential", salt.as_bytes());
        let nonce = derive_nonce(b"stored-credential", &[salt.as_bytes()]);
        let sealed = hex::decode(stored).map_err(|_| ShroudError::Credential)?;
        let clear =
            open(&key, &nonce, &sealed, salt.as_bytes()).map_err(|_| ShroudError::Credential)?;
        String::from_utf8(clear).map_err(|_| ShroudError::Credential)
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
