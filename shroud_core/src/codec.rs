//! Compaction seam between the pipeline and the transport collaborator.
//!
//! The core never interprets the compacted bytes; it only needs the pair of
//! inverse operations. `JsonCodec` is the reference implementation used by
//! the tests and the demo.

use crate::error::ShroudError;
use crate::message::{Request, Response};

pub trait Codec {
    fn compact_request(&self, request: &Request) -> Result<Vec<u8>, ShroudError>;
    fn expand_request(&self, compacted: &[u8]) -> Result<Request, ShroudError>;
    fn compact_response(&self, response: &Response) -> Result<Vec<u8>, ShroudError>;
    fn expand_response(&self, compacted: &[u8]) -> Result<Response, ShroudError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn compact_request(&self, request: &Request) -> Result<Vec<u8>, ShroudError> {
        Ok(serde_json::to_vec(request)?)
    }

    fn expand_request(&self, compacted: &[u8]) -> Result<Request, ShroudError> {
        Ok(serde_json::from_slice(compacted)?)
    }

    fn compact_response(&self, response: &Response) -> Result<Vec<u8>, ShroudError> {
        Ok(serde_json::to_vec(response)?)
    }

    fn expand_response(&self, compacted: &[u8]) -> Result<Response, ShroudError> {
        Ok(serde_json::from_slice(compacted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_compact_expand_roundtrip() {
        let request = Request::new(b"payload".to_vec())
            .with_header("password", "s3cret")
            .with_variable("message_id", "6");
        let compacted = JsonCodec.compact_request(&request).unwrap();
        let expanded = JsonCodec.expand_request(&compacted).unwrap();
        assert_eq!(expanded, request);
    }

    #[test]
    fn response_compact_expand_roundtrip() {
        let response = Response::new(b"result".to_vec()).with_vector("message_id", "6");
        let compacted = JsonCodec.compact_response(&response).unwrap();
        let expanded = JsonCodec.expand_response(&compacted).unwrap();
        assert_eq!(expanded, response);
    }

    #[test]
    fn garbage_bytes_fail_to_expand() {
        assert!(JsonCodec.expand_request(b"\x00\x01not json").is_err());
    }
}
