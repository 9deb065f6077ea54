//! # portbridge-ipc
//!
//! Event-bridging IPC dispatcher: re-emits messages arriving on a
//! process-boundary transport as named events in a local scripting
//! environment, and routes listener results back to the original caller.
//!
//! This crate provides:
//! - **`IpcDispatcher`**: the four dispatch operations (message, invoke,
//!   post-message with ports, synchronous message)
//! - **Reply channels**: one-shot request/reply correlation with a
//!   guaranteed terminal disposition
//! - **Port entanglement glue**: descriptor-to-local-channel wrapping with
//!   order preserved
//! - **`InboundIpc` / `InboundQueue`**: the surface a transport-driving
//!   loop feeds
//!
//! The transport itself, the environment's listener machinery, and the
//! structured-clone format are collaborators behind traits; see
//! `portbridge-core` for the shared types and contracts.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use portbridge_core::{
    CloneablePayload, CodecError, JsonPayloadCodec, PayloadCodec, PortDescriptor, PortToken,
    Realm, RealmId, SenderInfo, TransferableMessage,
};

// =============================================================================
// Modules
// =============================================================================

/// The dispatch operations and event names.
pub mod dispatcher;

/// Event emission contract and a reference emitter.
pub mod emitter;

/// Error types for dispatch operations.
pub mod error;

/// Per-dispatch event contexts.
pub mod event;

/// Transport-facing inbound message surface.
pub mod inbound;

/// Port entanglement contract and in-process broker.
pub mod ports;

/// One-shot reply channels.
pub mod reply;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use dispatcher::{
    IpcDispatcher, IPC_INVOKE_EVENT, IPC_MESSAGE_EVENT, IPC_MESSAGE_SYNC_EVENT, IPC_PORTS_EVENT,
};
pub use emitter::{EventArg, EventEmitter, EventHub};
pub use error::DispatchError;
pub use event::IpcEvent;
pub use inbound::{InboundIpc, InboundQueue, ReplySink};
pub use ports::{EntangleError, InProcessPorts, LocalPort, PortBroker};
pub use reply::{ReplyChannel, ReplyChannelError, ReplyError, ReplyOutcome};
