use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::vectors::Vectors;

/// Outgoing request for one send cycle: clear-text headers, clear-text
/// message variables, and the caller's payload bytes. Stages consume the
/// request by value and return the transformed value; nothing mutates
/// through a shared reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    headers: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
    payload: Vec<u8>,
}

impl Request {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: BTreeMap::new(),
            variables: BTreeMap::new(),
            payload: payload.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.set_variable(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_owned(), value.to_owned());
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_owned(), value.to_owned());
    }

    /// Sets the variable only when no value is present yet, returning the
    /// value now in place. Lets callers pre-seed deterministic values before
    /// the secure stage stamps its own.
    pub fn variable_or_insert(&mut self, name: &str, value: String) -> &str {
        self.variables.entry(name.to_owned()).or_insert(value)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn merge_variables<I: IntoIterator<Item = (String, String)>>(&mut self, extra: I) {
        self.variables.extend(extra);
    }

    /// Clear-text snapshot of the message variables. Survives the request's
    /// send cycle to pair with the eventual response.
    pub fn variables_snapshot(&self) -> Vectors {
        Vectors::from_map(self.variables.clone())
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }
}

/// Response mirror of [`Request`]. Its vector mapping is a separate
/// namespace from request message variables; conflating the two introduces
/// cross-talk between the directions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    vectors: BTreeMap<String, String>,
    payload: Vec<u8>,
}

impl Response {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            vectors: BTreeMap::new(),
            payload: payload.into(),
        }
    }

    pub fn with_vector(mut self, name: &str, value: &str) -> Self {
        self.set_vector(name, value);
        self
    }

    pub fn vector(&self, name: &str) -> Option<&str> {
        self.vectors.get(name).map(String::as_str)
    }

    pub fn set_vector(&mut self, name: &str, value: &str) {
        self.vectors.insert(name.to_owned(), value.to_owned());
    }

    pub fn vectors(&self) -> &BTreeMap<String, String> {
        &self.vectors
    }

    pub fn merge_vectors<I: IntoIterator<Item = (String, String)>>(&mut self, extra: I) {
        self.vectors.extend(extra);
    }

    pub fn vectors_snapshot(&self) -> Vectors {
        Vectors::from_map(self.vectors.clone())
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_or_insert_keeps_preseeded_value() {
        let mut request = Request::new(b"body".to_vec()).with_variable("timestamp", "100");
        let stamped = request.variable_or_insert("timestamp", "999".to_owned());
        assert_eq!(stamped, "100");
        assert_eq!(request.variable("timestamp"), Some("100"));
    }

    #[test]
    fn snapshot_is_detached_from_the_live_request() {
        let mut request = Request::new(b"body".to_vec()).with_variable("message_id", "6");
        let snapshot = request.variables_snapshot();
        request.set_variable("message_id", "7");
        assert_eq!(snapshot.get("message_id"), Some("6"));
        assert_eq!(request.variable("message_id"), Some("7"));
    }

    #[test]
    fn response_vectors_are_their_own_namespace() {
        let response = Response::new(b"ok".to_vec()).with_vector("message_id", "6");
        assert_eq!(response.vector("message_id"), Some("6"));
        assert_eq!(response.vector("timestamp"), None);
    }
}
