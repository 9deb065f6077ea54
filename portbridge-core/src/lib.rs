//! # portbridge-core
//!
//! Core abstractions for the portbridge IPC dispatcher.
//!
//! This crate provides the fundamental types shared by the dispatcher and
//! its collaborators:
//!
//! - **Realm handles**: explicit addressing of one scripting-environment
//!   instance, passed into every operation instead of a global singleton
//! - **Payload types**: opaque transport-cloned bodies, sender identity,
//!   and transferable messages carrying port descriptors
//! - **Codec trait**: pluggable decoding of payloads into the environment's
//!   native value representation
//!
//! The dispatcher itself lives in `portbridge-ipc`; nothing here performs
//! dispatch.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod codec;
mod payload;
mod port;
mod realm;

// Codec exports
pub use codec::{CodecError, JsonPayloadCodec, PayloadCodec};

// Payload exports
pub use payload::{CloneablePayload, SenderInfo, TransferableMessage};

// Port exports
pub use port::{PortDescriptor, PortToken};

// Realm exports
pub use realm::{Realm, RealmId};
