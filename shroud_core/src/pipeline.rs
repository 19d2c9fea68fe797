//! The fixed, ordered pipeline of security stages.
//!
//! Outbound: secure, compact, encrypt, digest, obfuscate. Inbound:
//! deobfuscate, decrypt, expand, pre-unsecure gate, unsecure, final gate,
//! deliver. The gate sequence is linear and short-circuiting: a rejection at
//! either checkpoint drops the message before any later stage runs, and
//! [`Delivery`] can only be constructed by traversing the whole sequence.
//!
//! The profile decides what each stage does; this module decides when it
//! runs. Rearranging the order here is what would create a replay hole or a
//! plaintext leak, so the order is not configurable.

use log::debug;
use subtle::ConstantTimeEq;

use crate::codec::Codec;
use crate::error::{RejectPhase, ShroudError};
use crate::message::{Request, Response};
use crate::package::{
    FieldValue, Package, FIELD_MAC, FIELD_PAYLOAD, FIELD_VECTORS, FIELD_VERSION,
};
use crate::profile::SecurityProfile;
use crate::vectors::Vectors;
use crate::versioning::{check_version, PACKAGE_VERSION};

/// Result of securing one outbound request: the obfuscated wire package and
/// the clear snapshot of the message variables, retained by the caller to
/// validate the eventual response.
#[derive(Clone, Debug)]
pub struct Outbound {
    pub package: Package,
    pub sent: Vectors,
}

/// An inbound request that passed deobfuscation, decryption, and both
/// validation gates. The only way to obtain one is [`accept_request`].
#[derive(Debug)]
pub struct Delivery {
    request: Request,
    vectors: Vectors,
    mac: String,
    compacted: Vec<u8>,
}

impl Delivery {
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn vectors(&self) -> &Vectors {
        &self.vectors
    }

    /// The digest transmitted with the package. Not consulted by the inbound
    /// pipeline itself; the transport collaborator checks it.
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Recomputes the digest over the recovered compacted message and
    /// compares it with the transmitted one in constant time.
    pub fn mac_matches<P: SecurityProfile + ?Sized>(&self, profile: &P) -> bool {
        let computed = profile.generate_mac(&self.compacted);
        bool::from(self.mac.as_bytes().ct_eq(computed.as_bytes()))
    }
}

/// Secures and packages one outbound request.
pub fn dispatch_request<P, C>(
    profile: &P,
    codec: &C,
    request: Request,
) -> Result<Outbound, ShroudError>
where
    P: SecurityProfile + ?Sized,
    C: Codec + ?Sized,
{
    let request = profile.secure_request(request)?;
    let compacted = codec.compact_request(&request)?;
    let sealed = profile.encrypt_request(&compacted, &request)?;
    let mac = profile.generate_mac(&compacted);

    let mut request = request;
    request.merge_variables(sealed.attach);
    let sent = request.variables_snapshot();
    debug!("request packaged: {} vector(s), {} ciphertext byte(s)", sent.len(), sealed.ciphertext.len());

    let package = pack(sealed.ciphertext, mac, &sent);
    let package = profile.obfuscate_request_package(package)?;
    Ok(Outbound { package, sent })
}

/// Runs one received package through deobfuscation, decryption, and the
/// two-phase gate. Credential restoration only happens for requests that
/// already passed the cheap pre-unsecure check.
pub fn accept_request<P, C>(
    profile: &P,
    codec: &C,
    package: Package,
) -> Result<Delivery, ShroudError>
where
    P: SecurityProfile + ?Sized,
    C: Codec + ?Sized,
{
    let package = profile.deobfuscate_request_package(package)?;
    let (ciphertext, mac, vectors) = unpack(package)?;
    let compacted = profile.decrypt_request(&ciphertext, &vectors)?;
    let secured = codec.expand_request(&compacted)?;

    if profile.invalidate_request(&secured, &vectors).is_reject() {
        debug!("inbound request rejected at the pre-unsecure gate");
        return Err(ShroudError::Rejected(RejectPhase::PreValidation));
    }
    let request = profile.unsecure_request(secured)?;
    if profile.final_invalidation(&request, &vectors).is_reject() {
        debug!("inbound request rejected at the final gate");
        return Err(ShroudError::Rejected(RejectPhase::FinalValidation));
    }

    Ok(Delivery {
        request,
        vectors,
        mac,
        compacted,
    })
}

/// Prepares and packages one outbound response. `origin` is the accepted
/// request being answered; `None` for unsolicited responses.
pub fn dispatch_response<P, C>(
    profile: &P,
    codec: &C,
    response: Response,
    origin: Option<&Request>,
) -> Result<Package, ShroudError>
where
    P: SecurityProfile + ?Sized,
    C: Codec + ?Sized,
{
    let response = profile.prepare_response(response, origin)?;
    let compacted = codec.compact_response(&response)?;
    let sealed = profile.encrypt_response(&compacted, &response)?;
    let mac = profile.generate_mac(&compacted);

    let mut response = response;
    response.merge_vectors(sealed.attach);
    let package = pack(sealed.ciphertext, mac, &response.vectors_snapshot());
    profile.obfuscate_response_package(package)
}

/// Client side: unwraps a received response and checks it correlates with
/// the `sent` vector snapshot retained from [`dispatch_request`].
pub fn accept_response<P, C>(
    profile: &P,
    codec: &C,
    package: Package,
    sent: &Vectors,
) -> Result<Response, ShroudError>
where
    P: SecurityProfile + ?Sized,
    C: Codec + ?Sized,
{
    let package = profile.deobfuscate_response_package(package)?;
    let (ciphertext, _mac, vectors) = unpack(package)?;
    let compacted = profile.decrypt_response(&ciphertext, &vectors)?;
    let response = codec.expand_response(&compacted)?;

    if profile.validate_response(&response, sent).is_reject() {
        debug!("inbound response rejected by correlation check");
        return Err(ShroudError::Rejected(RejectPhase::ResponseValidation));
    }
    Ok(response)
}

fn pack(ciphertext: Vec<u8>, mac: String, vectors: &Vectors) -> Package {
    let mut package = Package::new();
    package.insert(FIELD_VERSION, FieldValue::Text(PACKAGE_VERSION.to_string()));
    package.insert(FIELD_PAYLOAD, FieldValue::Blob(ciphertext));
    package.insert(FIELD_MAC, FieldValue::Text(mac));
    package.insert(
        FIELD_VECTORS,
        FieldValue::Map(vectors.clone().into_map()),
    );
    package
}

fn unpack(mut package: Package) -> Result<(Vec<u8>, String, Vectors), ShroudError> {
    let version = match package.remove(FIELD_VERSION) {
        Some(FieldValue::Text(text)) => text
            .parse::<u16>()
            .map_err(|_| ShroudError::TransformAsymmetry {
                field: FIELD_VERSION.to_owned(),
            })?,
        Some(_) => {
            return Err(ShroudError::TransformAsymmetry {
                field: FIELD_VERSION.to_owned(),
            })
        }
        None => return Err(ShroudError::MissingField {
            field: FIELD_VERSION,
        }),
    };
    check_version(version, PACKAGE_VERSION, "Package")?;

    let ciphertext = match package.remove(FIELD_PAYLOAD) {
        Some(FieldValue::Blob(bytes)) => bytes,
        Some(_) => {
            return Err(ShroudError::TransformAsymmetry {
                field: FIELD_PAYLOAD.to_owned(),
            })
        }
        None => return Err(ShroudError::MissingField {
            field: FIELD_PAYLOAD,
        }),
    };
    let mac = match package.remove(FIELD_MAC) {
        Some(FieldValue::Text(text)) => text,
        Some(_) => {
            return Err(ShroudError::TransformAsymmetry {
                field: FIELD_MAC.to_owned(),
            })
        }
        None => return Err(ShroudError::MissingField { field: FIELD_MAC }),
    };
    let vectors = match package.remove(FIELD_VECTORS) {
        Some(FieldValue::Map(map)) => Vectors::from_map(map),
        Some(_) => {
            return Err(ShroudError::TransformAsymmetry {
                field: FIELD_VECTORS.to_owned(),
            })
        }
        None => return Err(ShroudError::MissingField {
            field: FIELD_VECTORS,
        }),
    };

    Ok((ciphertext, mac, vectors))
}
