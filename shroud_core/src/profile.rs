//! The pluggable security profile: the capability set a deployment
//! substitutes to govern how messages are secured, encrypted, obfuscated,
//! validated, and rejected.
//!
//! One profile instance serves every concurrent message flow, so
//! implementations must be stateless with respect to any single message:
//! immutable configuration (key material, schemes) only. Message-specific
//! state lives in `Request`/`Response`/`Vectors`.

use crate::error::ShroudError;
use crate::message::{Request, Response};
use crate::package::Package;
use crate::vectors::Vectors;

/// Verdict of a validation stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Reject,
}

impl Gate {
    pub fn is_reject(self) -> bool {
        self == Gate::Reject
    }

    /// `Pass` when `accepted` holds.
    pub fn when(accepted: bool) -> Self {
        if accepted {
            Gate::Pass
        } else {
            Gate::Reject
        }
    }
}

/// Output of the cipher stage's encrypt direction: the ciphertext plus the
/// clear values (nonce, key hints) that must travel alongside it as message
/// variables or response vectors. Attaching through this value instead of
/// concatenating into the ciphertext keeps the encode/decode pair symmetric
/// by construction.
#[derive(Clone, Debug)]
pub struct SealedBody {
    pub ciphertext: Vec<u8>,
    pub attach: Vec<(String, String)>,
}

impl SealedBody {
    pub fn bare(ciphertext: Vec<u8>) -> Self {
        Self {
            ciphertext,
            attach: Vec::new(),
        }
    }
}

/// The ordered pipeline in `pipeline` drives these operations; a profile
/// decides what each stage does, never when it runs.
pub trait SecurityProfile: Send + Sync {
    /// Transforms clear-text credential headers into transport-safe form and
    /// attaches the anti-replay token and timestamp message variables. Runs
    /// exactly once per outbound request, before compaction. Must leave every
    /// header later validation needs.
    fn secure_request(&self, request: Request) -> Result<Request, ShroudError>;

    /// Restores credential headers to usable clear text. Runs only after the
    /// pre-unsecure gate passed.
    fn unsecure_request(&self, request: Request) -> Result<Request, ShroudError>;

    /// Encrypts the compacted request body. Exact inverse of
    /// [`decrypt_request`](Self::decrypt_request) for every input this
    /// profile produces, given the attached vectors.
    fn encrypt_request(
        &self,
        compacted: &[u8],
        request: &Request,
    ) -> Result<SealedBody, ShroudError>;

    /// Recovers the compacted request body byte-for-byte, or fails with
    /// [`ShroudError::Decryption`]. Never returns garbage for downstream
    /// stages to treat as valid.
    fn decrypt_request(&self, ciphertext: &[u8], vectors: &Vectors)
        -> Result<Vec<u8>, ShroudError>;

    /// Response-direction counterpart of [`encrypt_request`](Self::encrypt_request).
    fn encrypt_response(
        &self,
        compacted: &[u8],
        response: &Response,
    ) -> Result<SealedBody, ShroudError>;

    /// Response-direction counterpart of [`decrypt_request`](Self::decrypt_request).
    fn decrypt_response(
        &self,
        ciphertext: &[u8],
        vectors: &Vectors,
    ) -> Result<Vec<u8>, ShroudError>;

    /// Deterministic keyed digest over the unencrypted compacted message.
    /// Computed and attached by the outbound pipeline; verified by the
    /// transport collaborator, not by inbound control flow.
    fn generate_mac(&self, compacted: &[u8]) -> String;

    /// Pre-unsecure gate: cheap comparison of clear signals (the embedded
    /// message variables of the still-secured request against the envelope
    /// vectors). Gates the expensive credential restoration.
    fn invalidate_request(&self, request: &Request, vectors: &Vectors) -> Gate;

    /// Post-unsecure gate: checks that may need stateful lookups, e.g. the
    /// replay store. The only stage permitted to block.
    fn final_invalidation(&self, request: &Request, vectors: &Vectors) -> Gate;

    /// Structural relabeling of the outbound request package.
    fn obfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError>;

    /// Inverse of [`obfuscate_request_package`](Self::obfuscate_request_package);
    /// undeclared fields are a transform asymmetry.
    fn deobfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError>;

    fn obfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError>;

    fn deobfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError>;

    /// Copies the correlation token from the originating request's message
    /// variables into the response's vectors. `origin` is absent for
    /// unsolicited responses.
    fn prepare_response(
        &self,
        response: Response,
        origin: Option<&Request>,
    ) -> Result<Response, ShroudError>;

    /// Client-side check that a received response correlates with what was
    /// sent. Rejection is terminal for that request.
    fn validate_response(&self, response: &Response, sent: &Vectors) -> Gate;

    /// At-rest credential storage, parameterized by an auxiliary vector set
    /// (stored salt) distinct from message vectors. Inverse pair with
    /// [`decrypt_server_password`](Self::decrypt_server_password); never
    /// keyed from per-message material.
    fn encrypt_server_password(&self, clear: &str, aux: &Vectors) -> Result<String, ShroudError>;

    fn decrypt_server_password(&self, stored: &str, aux: &Vectors) -> Result<String, ShroudError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_when_maps_bool() {
        assert_eq!(Gate::when(true), Gate::Pass);
        assert_eq!(Gate::when(false), Gate::Reject);
        assert!(Gate::Reject.is_reject());
        assert!(!Gate::Pass.is_reject());
    }
}
