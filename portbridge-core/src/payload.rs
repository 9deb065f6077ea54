//! Inbound message bodies and sender identity.
//!
//! Payloads arrive as structurally-cloned snapshots: the transport has
//! already deep-copied the sender's data, so nothing here shares mutable
//! state with the remote side. The dispatcher treats a payload as opaque
//! bytes and leaves interpretation to the codec collaborator.

use serde::{Deserialize, Serialize};

use crate::port::PortDescriptor;

/// Opaque, transport-cloned message body.
///
/// The bytes are whatever the transport's structured-clone serialization
/// produced on the sending side. They are never inspected here; the codec
/// collaborator turns them into an environment-native value at dispatch
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneablePayload(Vec<u8>);

impl CloneablePayload {
    /// Wrap raw payload bytes.
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CloneablePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Identity of the remote execution context that sent a message.
///
/// Listeners use this to tell frames apart and to address any follow-up
/// traffic; the dispatcher itself only carries it through and prints it in
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Id of the sending process.
    pub process_id: u32,
    /// Routing id of the sending frame within that process.
    pub routing_id: u32,
}

impl SenderInfo {
    /// Create a sender identity.
    pub const fn new(process_id: u32, routing_id: u32) -> Self {
        Self {
            process_id,
            routing_id,
        }
    }
}

impl std::fmt::Display for SenderInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "process {} frame {}", self.process_id, self.routing_id)
    }
}

/// A payload bundled with the port endpoints transferred alongside it.
///
/// The descriptor order is significant: the wrapped ports handed to
/// listeners preserve it position for position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableMessage {
    /// The cloned message body.
    pub payload: CloneablePayload,
    /// Raw port endpoints transferred with the message, in sender order.
    pub ports: Vec<PortDescriptor>,
}

impl TransferableMessage {
    /// Bundle a payload with its transferred ports.
    pub const fn new(payload: CloneablePayload, ports: Vec<PortDescriptor>) -> Self {
        Self { payload, ports }
    }

    /// A transferable message carrying no ports.
    pub const fn without_ports(payload: CloneablePayload) -> Self {
        Self {
            payload,
            ports: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortToken;

    #[test]
    fn test_payload_accessors() {
        let payload = CloneablePayload::new(vec![1, 2, 3]);
        assert_eq!(payload.as_bytes(), &[1, 2, 3]);
        assert_eq!(payload.len(), 3);
        assert!(!payload.is_empty());
        assert!(CloneablePayload::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_payload_from_vec() {
        let payload: CloneablePayload = vec![9, 8].into();
        assert_eq!(payload.as_bytes(), &[9, 8]);
    }

    #[test]
    fn test_sender_info_display() {
        let sender = SenderInfo::new(3, 7);
        assert_eq!(sender.to_string(), "process 3 frame 7");
    }

    #[test]
    fn test_transferable_message_without_ports() {
        let message = TransferableMessage::without_ports(CloneablePayload::new(vec![0]));
        assert!(message.ports.is_empty());
    }

    #[test]
    fn test_transferable_message_keeps_port_order() {
        let ports = vec![
            PortDescriptor::new(PortToken::new(1, 1)),
            PortDescriptor::new(PortToken::new(2, 2)),
        ];
        let message = TransferableMessage::new(CloneablePayload::new(vec![]), ports.clone());
        assert_eq!(message.ports, ports);
    }

    #[test]
    fn test_transferable_message_serde_roundtrip() {
        let message = TransferableMessage::new(
            CloneablePayload::new(b"{}".to_vec()),
            vec![PortDescriptor::new(PortToken::new(5, 6))],
        );
        let json = serde_json::to_string(&message).expect("serialize");
        let decoded: TransferableMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(message, decoded);
    }
}
