use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known vector names shared by the shipped profiles.
pub const MESSAGE_ID: &str = "message_id";
pub const TIMESTAMP: &str = "timestamp";
pub const NONCE: &str = "nonce";
pub const SALT: &str = "salt";

/// Immutable clear-text key/value mapping extracted from an incoming package
/// and presented read-only to the decrypt and validation stages. Distinct
/// from the live `Request`/`Response` being processed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vectors {
    entries: BTreeMap<String, String>,
}

impl Vectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl FromIterator<(String, String)> for Vectors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Vectors {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}
