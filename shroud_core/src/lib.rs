//! Pluggable security-profile pipeline for two-way request/response
//! messaging.
//!
//! The pipeline fixes the order of the security stages (secure, compact,
//! encrypt, digest, obfuscate outbound; the mirrored sequence plus a
//! two-phase validation gate inbound). A deployment substitutes a
//! [`SecurityProfile`] to decide what each stage does; the surrounding
//! transport supplies a [`Codec`] and delivers the resulting [`Package`].

pub mod cipher;
pub mod codec;
pub mod error;
pub mod mac;
pub mod message;
pub mod obfuscate;
pub mod package;
pub mod pipeline;
pub mod plain;
pub mod profile;
pub mod replay;
pub mod rng;
pub mod standard;
pub mod vectors;
pub mod versioning;

pub use crate::codec::{Codec, JsonCodec};
pub use crate::error::{RejectPhase, ShroudError};
pub use crate::message::{Request, Response};
pub use crate::obfuscate::FieldScheme;
pub use crate::package::{
    FieldValue, Package, CANONICAL_FIELDS, FIELD_MAC, FIELD_PAYLOAD, FIELD_VECTORS, FIELD_VERSION,
};
pub use crate::pipeline::{
    accept_request, accept_response, dispatch_request, dispatch_response, Delivery, Outbound,
};
pub use crate::plain::PlainProfile;
pub use crate::profile::{Gate, SealedBody, SecurityProfile};
pub use crate::replay::{MemoryReplayStore, ReplayStore};
pub use crate::standard::{KeyConfig, StandardProfile, CREDENTIAL_HEADER};
pub use crate::vectors::{Vectors, MESSAGE_ID, NONCE, SALT, TIMESTAMP};
pub use crate::versioning::PACKAGE_VERSION;
