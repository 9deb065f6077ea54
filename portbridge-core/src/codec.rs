//! Pluggable payload serialization.
//!
//! The [`PayloadCodec`] trait decouples the dispatcher from the wire shape
//! of structured-clone data. Inbound payloads decode into the environment's
//! native value representation ([`serde_json::Value`]); reply results encode
//! back to bytes for the return trip. [`JsonPayloadCodec`] is the default
//! codec, useful for debugging and for embedders whose transport already
//! speaks JSON.
//!
//! # Example
//!
//! ```rust
//! use portbridge_core::{CloneablePayload, JsonPayloadCodec, PayloadCodec, Realm, RealmId};
//!
//! let codec = JsonPayloadCodec;
//! let realm = Realm::new(RealmId::new(1), "main");
//! let payload = CloneablePayload::new(br#"{"x":1}"#.to_vec());
//!
//! let value = codec.decode_value(&payload, &realm).unwrap();
//! assert_eq!(value["x"], 1);
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::payload::CloneablePayload;
use crate::realm::Realm;

/// Error type for codec operations.
#[derive(Debug)]
pub enum CodecError {
    /// Failed to encode a value to bytes.
    Encode(Box<dyn std::error::Error + Send + Sync>),
    /// Failed to decode a payload into a native value.
    Decode(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode(e) => write!(f, "encode error: {}", e),
            CodecError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Encode(e) => Some(e.as_ref()),
            CodecError::Decode(e) => Some(e.as_ref()),
        }
    }
}

/// Pluggable serialization between transport payloads and native values.
///
/// Implement this trait to support transports whose structured-clone format
/// is not JSON (bincode, protobuf, a browser-engine clone format, etc.).
/// The trait requires `Clone + 'static` so codec instances can be captured
/// by reply channels that outlive the dispatch call.
pub trait PayloadCodec: Clone + 'static {
    /// Decode a cloned payload into the native value representation of the
    /// target realm.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the payload is malformed or cannot
    /// be represented in the target environment.
    fn decode_value(&self, payload: &CloneablePayload, realm: &Realm) -> Result<Value, CodecError>;

    /// Encode a serializable value to bytes for the return trip.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;
}

/// JSON codec using serde_json.
///
/// The default codec. Human-readable on the wire, which makes transport
/// traffic easy to inspect while developing an embedder.
#[derive(Clone, Default, Debug, Copy)]
pub struct JsonPayloadCodec;

impl PayloadCodec for JsonPayloadCodec {
    fn decode_value(&self, payload: &CloneablePayload, realm: &Realm) -> Result<Value, CodecError> {
        tracing::trace!(realm = %realm.id(), bytes = payload.len(), "decoding payload");
        serde_json::from_slice(payload.as_bytes()).map_err(|e| CodecError::Decode(Box::new(e)))
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(Box::new(e)))
    }
}
