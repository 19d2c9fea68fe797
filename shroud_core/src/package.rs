use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical wire field names prior to obfuscation.
pub const FIELD_VERSION: &str = "version";
pub const FIELD_PAYLOAD: &str = "payload";
pub const FIELD_MAC: &str = "mac";
pub const FIELD_VECTORS: &str = "vectors";

pub const CANONICAL_FIELDS: &[&str] = &[FIELD_VERSION, FIELD_PAYLOAD, FIELD_MAC, FIELD_VECTORS];

/// Value of a single wire field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Blob(Vec<u8>),
    Map(BTreeMap<String, String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Ordered mapping of named fields representing exactly what crosses the
/// wire. Field order is insertion order and survives serialization, so the
/// obfuscation transform controls the transmitted layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    fields: Vec<(String, FieldValue)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, replacing any existing field of the same name in
    /// place so duplicates cannot cross the wire.
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name.to_owned(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let at = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(at).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, FieldValue)> {
        self.fields
    }

    pub fn from_fields(fields: Vec<(String, FieldValue)>) -> Self {
        let mut package = Self::new();
        for (name, value) in fields {
            package.insert(&name, value);
        }
        package
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let mut package = Package::new();
        package.insert("b", FieldValue::Text("2".into()));
        package.insert("a", FieldValue::Text("1".into()));
        package.insert("c", FieldValue::Blob(vec![3]));
        let names: Vec<_> = package.names().collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut package = Package::new();
        package.insert("a", FieldValue::Text("old".into()));
        package.insert("b", FieldValue::Text("2".into()));
        package.insert("a", FieldValue::Text("new".into()));
        assert_eq!(package.len(), 2);
        assert_eq!(package.get("a").and_then(FieldValue::as_text), Some("new"));
        let names: Vec<_> = package.names().collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn remove_returns_the_value() {
        let mut package = Package::new();
        package.insert("payload", FieldValue::Blob(vec![1, 2, 3]));
        let value = package.remove("payload").unwrap();
        assert_eq!(value.as_blob(), Some(&[1u8, 2, 3][..]));
        assert!(package.is_empty());
        assert!(package.remove("payload").is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_order_and_shape() {
        let mut package = Package::new();
        package.insert(FIELD_VERSION, FieldValue::Text("1".into()));
        package.insert(FIELD_PAYLOAD, FieldValue::Blob(vec![0xAA, 0xBB]));
        let json = serde_json::to_vec(&package).unwrap();
        let back: Package = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, package);
        let names: Vec<_> = back.names().collect();
        assert_eq!(names, [FIELD_VERSION, FIELD_PAYLOAD]);
    }
}
