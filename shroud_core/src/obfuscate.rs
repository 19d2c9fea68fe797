//! Structural obfuscation of the outer package layout.
//!
//! A scheme renames the canonical wire fields and may inject declared decoy
//! fields. The transform is a bijection restricted to the fields the scheme
//! declares: decoys are dropped on revert, and any undeclared field on
//! revert is treated as a hostile package. Not a confidentiality mechanism.

use crate::error::ShroudError;
use crate::package::{FieldValue, Package};
use crate::rng::fill_derived;

const DECOY_VALUE_BYTES: usize = 12;

#[derive(Clone, Copy, Debug)]
pub struct FieldScheme {
    renames: &'static [(&'static str, &'static str)],
    decoys: &'static [&'static str],
}

impl FieldScheme {
    pub const fn new(
        renames: &'static [(&'static str, &'static str)],
        decoys: &'static [&'static str],
    ) -> Self {
        Self { renames, decoys }
    }

    /// Scheme that keeps the given names unchanged on the wire, no decoys.
    pub const fn identity(canonical: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            renames: canonical,
            decoys: &[],
        }
    }

    fn wire_name(&self, clear: &str) -> Option<&'static str> {
        self.renames
            .iter()
            .find(|(from, _)| *from == clear)
            .map(|(_, to)| *to)
    }

    fn clear_name(&self, wire: &str) -> Option<&'static str> {
        self.renames
            .iter()
            .find(|(_, to)| *to == wire)
            .map(|(from, _)| *from)
    }

    fn is_decoy(&self, wire: &str) -> bool {
        self.decoys.contains(&wire)
    }

    /// Renames every field to its wire form and appends the declared decoys.
    /// A field the scheme does not declare cannot be transmitted.
    pub fn apply(&self, package: Package) -> Result<Package, ShroudError> {
        let fields = package.into_fields();

        // Decoy content is derived from the blob fields so a stateless
        // profile emits identical decoys for identical packages.
        let mut entropy = Vec::new();
        for (_, value) in &fields {
            if let FieldValue::Blob(bytes) = value {
                entropy.extend_from_slice(bytes);
            }
        }

        let mut out = Package::new();
        for (clear, value) in fields {
            match self.wire_name(&clear) {
                Some(wire) => out.insert(wire, value),
                None => {
                    return Err(ShroudError::TransformAsymmetry { field: clear });
                }
            }
        }
        for decoy in self.decoys {
            debug_assert!(
                self.clear_name(decoy).is_none(),
                "decoy name collides with a declared wire field"
            );
            let mut filler = [0u8; DECOY_VALUE_BYTES];
            fill_derived(b"decoy", &[decoy.as_bytes(), &entropy], &mut filler);
            out.insert(decoy, FieldValue::Text(hex::encode(filler)));
        }
        Ok(out)
    }

    /// Inverse of [`apply`]: drops decoys, restores canonical names, and
    /// rejects any field the paired apply could not have produced.
    pub fn revert(&self, package: Package) -> Result<Package, ShroudError> {
        let mut out = Package::new();
        for (wire, value) in package.into_fields() {
            if self.is_decoy(&wire) {
                continue;
            }
            match self.clear_name(&wire) {
                Some(clear) => out.insert(clear, value),
                None => {
                    return Err(ShroudError::TransformAsymmetry { field: wire });
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{FIELD_MAC, FIELD_PAYLOAD, FIELD_VECTORS, FIELD_VERSION};

    const SCHEME: FieldScheme = FieldScheme::new(
        &[
            (FIELD_VERSION, "v"),
            (FIELD_PAYLOAD, "opaque"),
            (FIELD_MAC, "crc"),
            (FIELD_VECTORS, "trailer"),
        ],
        &["hop", "window"],
    );

    fn sample_package() -> Package {
        let mut package = Package::new();
        package.insert(FIELD_VERSION, FieldValue::Text("1".into()));
        package.insert(FIELD_PAYLOAD, FieldValue::Blob(vec![0xDE, 0xAD]));
        package.insert(FIELD_MAC, FieldValue::Text("abcd".into()));
        package
    }

    #[test]
    fn apply_revert_restricted_roundtrip() {
        let original = sample_package();
        let wire = SCHEME.apply(original.clone()).unwrap();
        assert!(wire.get(FIELD_PAYLOAD).is_none());
        assert!(wire.get("opaque").is_some());
        assert!(wire.get("hop").is_some());
        assert!(wire.get("window").is_some());
        let restored = SCHEME.revert(wire).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn decoys_are_deterministic_per_package() {
        let a = SCHEME.apply(sample_package()).unwrap();
        let b = SCHEME.apply(sample_package()).unwrap();
        assert_eq!(a.get("hop"), b.get("hop"));
        assert_ne!(a.get("hop"), a.get("window"));
    }

    #[test]
    fn undeclared_field_is_rejected_on_revert() {
        let mut wire = SCHEME.apply(sample_package()).unwrap();
        wire.insert("smuggled", FieldValue::Text("x".into()));
        let err = SCHEME.revert(wire).unwrap_err();
        match err {
            ShroudError::TransformAsymmetry { field } => assert_eq!(field, "smuggled"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undeclared_field_cannot_be_transmitted() {
        let mut package = sample_package();
        package.insert("internal", FieldValue::Text("x".into()));
        assert!(SCHEME.apply(package).is_err());
    }

    #[test]
    fn identity_scheme_still_screens_unknown_fields() {
        const IDENTITY: FieldScheme = FieldScheme::identity(&[
            (FIELD_VERSION, FIELD_VERSION),
            (FIELD_PAYLOAD, FIELD_PAYLOAD),
            (FIELD_MAC, FIELD_MAC),
            (FIELD_VECTORS, FIELD_VECTORS),
        ]);
        let wire = IDENTITY.apply(sample_package()).unwrap();
        let restored = IDENTITY.revert(wire).unwrap();
        assert_eq!(restored, sample_package());

        let mut hostile = IDENTITY.apply(sample_package()).unwrap();
        hostile.insert("extra", FieldValue::Text("x".into()));
        assert!(IDENTITY.revert(hostile).is_err());
    }
}
