//! Shipped weak profile.
//!
//! Identity cipher and hex credential masking: the pairing a deployment
//! chooses for low-value response channels where only correlation and
//! integrity matter. Keeps the keyed digest; carries no replay store.

use crate::error::ShroudError;
use crate::mac::keyed_mac_hex;
use crate::message::{Request, Response};
use crate::obfuscate::FieldScheme;
use crate::package::{Package, FIELD_MAC, FIELD_PAYLOAD, FIELD_VECTORS, FIELD_VERSION};
use crate::profile::{Gate, SealedBody, SecurityProfile};
use crate::rng::random_token;
use crate::standard::CREDENTIAL_HEADER;
use crate::vectors::{Vectors, MESSAGE_ID, TIMESTAMP};

const MESSAGE_ID_BYTES: usize = 16;

const CANONICAL_SCHEME: FieldScheme = FieldScheme::identity(&[
    (FIELD_VERSION, FIELD_VERSION),
    (FIELD_PAYLOAD, FIELD_PAYLOAD),
    (FIELD_MAC, FIELD_MAC),
    (FIELD_VECTORS, FIELD_VECTORS),
]);

pub struct PlainProfile {
    mac_key: [u8; 32],
}

impl PlainProfile {
    pub fn new(mac_key: [u8; 32]) -> Self {
        Self { mac_key }
    }
}

impl SecurityProfile for PlainProfile {
    fn secure_request(&self, mut request: Request) -> Result<Request, ShroudError> {
        request.variable_or_insert(MESSAGE_ID, random_token(MESSAGE_ID_BYTES));
        request.variable_or_insert(TIMESTAMP, unix_millis().to_string());
        if let Some(clear) = request.header(CREDENTIAL_HEADER).map(str::to_owned) {
            request.set_header(CREDENTIAL_HEADER, &hex::encode(clear.as_bytes()));
        }
        Ok(request)
    }

    fn unsecure_request(&self, mut request: Request) -> Result<Request, ShroudError> {
        if let Some(masked) = request.header(CREDENTIAL_HEADER).map(str::to_owned) {
            let decoded = hex::decode(&masked).map_err(|_| ShroudError::Credential)?;
            let clear = String::from_utf8(decoded).map_err(|_| ShroudError::Credential)?;
            request.set_header(CREDENTIAL_HEADER, &clear);
        }
        Ok(request)
    }

    fn encrypt_request(
        &self,
        compacted: &[u8],
        _request: &Request,
    ) -> Result<SealedBody, ShroudError> {
        Ok(SealedBody::bare(compacted.to_vec()))
    }

    fn decrypt_request(
        &self,
        ciphertext: &[u8],
        _vectors: &Vectors,
    ) -> Result<Vec<u8>, ShroudError> {
        Ok(ciphertext.to_vec())
    }

    fn encrypt_response(
        &self,
        compacted: &[u8],
        _response: &Response,
    ) -> Result<SealedBody, ShroudError> {
        Ok(SealedBody::bare(compacted.to_vec()))
    }

    fn decrypt_response(
        &self,
        ciphertext: &[u8],
        _vectors: &Vectors,
    ) -> Result<Vec<u8>, ShroudError> {
        Ok(ciphertext.to_vec())
    }

    fn generate_mac(&self, compacted: &[u8]) -> String {
        keyed_mac_hex(&self.mac_key, b"plain", compacted)
    }

    fn invalidate_request(&self, request: &Request, vectors: &Vectors) -> Gate {
        for name in [TIMESTAMP, MESSAGE_ID] {
            match (request.variable(name), vectors.get(name)) {
                (Some(embedded), Some(envelope)) if embedded == envelope => {}
                _ => return Gate::Reject,
            }
        }
        Gate::Pass
    }

    fn final_invalidation(&self, _request: &Request, _vectors: &Vectors) -> Gate {
        Gate::Pass
    }

    fn obfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError> {
        CANONICAL_SCHEME.apply(package)
    }

    fn deobfuscate_request_package(&self, package: Package) -> Result<Package, ShroudError> {
        CANONICAL_SCHEME.revert(package)
    }

    fn obfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError> {
        CANONICAL_SCHEME.apply(package)
    }

    fn deobfuscate_response_package(&self, package: Package) -> Result<Package, ShroudError> {
        CANONICAL_SCHEME.revert(package)
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

    fn encrypt_server_password(&self, clear: &str, _aux: &Vectors) -> Result<String, ShroudError> {
        Ok(hex::encode(clear.as_bytes()))
    }

    fn decrypt_server_password(&self, stored: &str, _aux: &Vectors) -> Result<String, ShroudError> {
        let decoded = hex::decode(stored).map_err(|_| ShroudError::Credential)?;
        String::from_utf8(decoded).map_err(|_| ShroudError::Credential)
    }
}

fn unix_millis() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PlainProfile {
        PlainProfile::new([0x22; 32])
    }

    #[test]
    fn credential_hex_roundtrip() {
        let profile = profile();
        let request = Request::new(b"body".to_vec()).with_header(CREDENTIAL_HEADER, "s3cret");
        let secured = profile.secure_request(request).unwrap();
        assert_eq!(
            secured.header(CREDENTIAL_HEADER),
            Some(hex::encode(b"s3cret").as_str())
        );
        let restored = profile.unsecure_request(secured).unwrap();
        assert_eq!(restored.header(CREDENTIAL_HEADER), Some("s3cret"));
    }

    #[test]
    fn identity_cipher_roundtrip() {
        let profile = profile();
        let sealed = profile
            .encrypt_request(b"compacted", &Request::new(b"".to_vec()))
            .unwrap();
        assert_eq!(sealed.ciphertext, b"compacted");
        assert!(sealed.attach.is_empty());
        let recovered = profile
            .decrypt_request(&sealed.ciphertext, &Vectors::new())
            .unwrap();
        assert_eq!(recovered, b"compacted");
    }

    #[test]
    fn correlation_gate() {
        let profile = profile();
        let response = Response::new(b"ok".to_vec()).with_vector(MESSAGE_ID, "6");
        let sent_match = Vectors::from([("message_id", "6")]);
        let sent_other = Vectors::from([("message_id", "7")]);
        assert_eq!(profile.validate_response(&response, &sent_match), Gate::Pass);
        assert_eq!(
            profile.validate_response(&response, &sent_other),
            Gate::Reject
        );
    }
}
