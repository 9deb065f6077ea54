//! One-shot reply channels for request/response dispatch.
//!
//! When a request-style message arrives, the dispatcher wraps the
//! transport's pending-response handle in a [`ReplyChannel`] and attaches it
//! to the event context. A listener completes the channel with the result;
//! the channel encodes the outcome and forwards it back across the
//! transport. If nothing ever completes the channel, dropping it sends a
//! [`ReplyError::BrokenPromise`] outcome so the remote caller always
//! observes a terminal disposition.
//!
//! # Example
//!
//! ```rust,ignore
//! // Inside a listener: reply once, possibly after the dispatch returned.
//! if let Some(reply) = event.reply_channel() {
//!     reply.send(serde_json::json!(42))?;
//! }
//! ```

use std::cell::{Cell, RefCell};

use portbridge_core::PayloadCodec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors sent back across the transport in place of a listener result.
///
/// These errors are serializable so the remote caller can distinguish a
/// listener failure from a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyError {
    /// The reply channel was dropped without any listener completing it.
    ///
    /// This typically means no listener was registered for the channel, or
    /// a listener forgot to reply before the event context went away.
    BrokenPromise,

    /// The listener's result could not be serialized for the return trip.
    Serialization {
        /// Human-readable error message.
        message: String,
    },
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyError::BrokenPromise => write!(f, "reply channel dropped without completion"),
            ReplyError::Serialization { message } => {
                write!(f, "reply serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ReplyError {}

/// Result of one request/response dispatch as sent back to the caller.
pub type ReplyOutcome = Result<Value, ReplyError>;

/// Contract violations observed on the local side of a reply channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReplyChannelError {
    /// The channel was completed a second time.
    ///
    /// The transport handle is consumed by the first completion; a second
    /// completion is a listener bug. The already-sent result is never
    /// altered or resent.
    #[error("reply channel already completed")]
    DoubleReply,
}

/// Encodes an outcome and hands the bytes to the transport. Consumed by the
/// first completion.
type OutcomeSender = Box<dyn FnOnce(&ReplyOutcome)>;

/// One-shot carrier for a listener's result back across the transport.
///
/// Wraps exactly one pending-response handle. The first `send` or
/// `send_error` consumes the handle; every later attempt fails with
/// [`ReplyChannelError::DoubleReply`] without touching the already-sent
/// result. Dropping an uncompleted channel sends
/// [`ReplyError::BrokenPromise`].
///
/// # Single-Threaded
///
/// Uses `Cell`/`RefCell` internally. Reply channels live on the thread that
/// owns the scripting environment; a listener wanting to reply later keeps
/// the `Rc` handed out by the event context.
pub struct ReplyChannel {
    sender: RefCell<Option<OutcomeSender>>,
    fulfilled: Cell<bool>,
}

impl ReplyChannel {
    /// Wrap a transport pending-response handle.
    ///
    /// `transport_reply` receives the encoded outcome bytes and is called at
    /// most once. The codec is captured for the return-trip encoding; if a
    /// listener result fails to encode, a serialized
    /// [`ReplyError::Serialization`] outcome is sent instead.
    pub fn new<C, F>(codec: C, transport_reply: F) -> Self
    where
        C: PayloadCodec,
        F: FnOnce(&[u8]) + 'static,
    {
        let send = Box::new(move |outcome: &ReplyOutcome| match codec.encode(outcome) {
            Ok(bytes) => transport_reply(&bytes),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize reply outcome");
                let fallback: ReplyOutcome = Err(ReplyError::Serialization {
                    message: e.to_string(),
                });
                if let Ok(bytes) = codec.encode(&fallback) {
                    transport_reply(&bytes);
                }
            }
        });

        Self {
            sender: RefCell::new(Some(send)),
            fulfilled: Cell::new(false),
        }
    }

    /// Send a successful result back to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyChannelError::DoubleReply`] if the channel was already
    /// completed; the original result stands.
    pub fn send(&self, value: Value) -> Result<(), ReplyChannelError> {
        self.complete(Ok(value))
    }

    /// Send an error outcome back to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyChannelError::DoubleReply`] if the channel was already
    /// completed; the original result stands.
    pub fn send_error(&self, error: ReplyError) -> Result<(), ReplyChannelError> {
        self.complete(Err(error))
    }

    /// Check whether the channel has been completed.
    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled.get()
    }

    fn complete(&self, outcome: ReplyOutcome) -> Result<(), ReplyChannelError> {
        if self.fulfilled.get() {
            tracing::error!("reply channel completed twice, ignoring the second result");
            return Err(ReplyChannelError::DoubleReply);
        }
        self.fulfilled.set(true);

        if let Some(send) = self.sender.borrow_mut().take() {
            send(&outcome);
        }
        Ok(())
    }
}

impl Drop for ReplyChannel {
    fn drop(&mut self) {
        if !self.fulfilled.get() {
            self.fulfilled.set(true);
            if let Some(send) = self.sender.borrow_mut().take() {
                tracing::warn!("reply channel dropped without completion, sending broken promise");
                send(&Err(ReplyError::BrokenPromise));
            }
        }
    }
}

impl std::fmt::Debug for ReplyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyChannel")
            .field("fulfilled", &self.fulfilled.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use portbridge_core::{CloneablePayload, CodecError, JsonPayloadCodec, Realm};
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    fn capture() -> (Rc<RefCell<Vec<Vec<u8>>>>, impl FnOnce(&[u8]) + 'static) {
        let sent: Rc<RefCell<Vec<Vec<u8>>>> = Rc::new(RefCell::new(Vec::new()));
        let sent_clone = sent.clone();
        (sent, move |bytes: &[u8]| {
            sent_clone.borrow_mut().push(bytes.to_vec());
        })
    }

    fn decode_outcome(bytes: &[u8]) -> ReplyOutcome {
        serde_json::from_slice(bytes).expect("decode outcome")
    }

    #[test]
    fn test_reply_channel_send() {
        let (sent, transport_reply) = capture();
        let channel = ReplyChannel::new(JsonPayloadCodec, transport_reply);

        assert!(!channel.is_fulfilled());
        channel.send(json!(42)).expect("first send should succeed");
        assert!(channel.is_fulfilled());

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_outcome(&sent[0]), Ok(json!(42)));
    }

    #[test]
    fn test_reply_channel_send_error() {
        let (sent, transport_reply) = capture();
        let channel = ReplyChannel::new(JsonPayloadCodec, transport_reply);

        channel
            .send_error(ReplyError::BrokenPromise)
            .expect("first send should succeed");

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_outcome(&sent[0]), Err(ReplyError::BrokenPromise));
    }

    #[test]
    fn test_reply_channel_double_reply_rejected() {
        let (sent, transport_reply) = capture();
        let channel = ReplyChannel::new(JsonPayloadCodec, transport_reply);

        channel.send(json!(1)).expect("first send should succeed");
        let second = channel.send(json!(2));

        assert_eq!(second, Err(ReplyChannelError::DoubleReply));

        // The first result stands, nothing was resent.
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_outcome(&sent[0]), Ok(json!(1)));
    }

    #[test]
    fn test_reply_channel_broken_on_drop() {
        let (sent, transport_reply) = capture();
        {
            let _channel = ReplyChannel::new(JsonPayloadCodec, transport_reply);
            // Dropped without completion.
        }

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_outcome(&sent[0]), Err(ReplyError::BrokenPromise));
    }

    #[test]
    fn test_reply_channel_fulfilled_no_double_send_on_drop() {
        let (sent, transport_reply) = capture();
        {
            let channel = ReplyChannel::new(JsonPayloadCodec, transport_reply);
            channel.send(json!("done")).expect("send should succeed");
        }

        assert_eq!(sent.borrow().len(), 1);
    }

    /// Codec whose encode always fails, for exercising the fallback path.
    #[derive(Clone)]
    struct BrokenCodec;

    impl PayloadCodec for BrokenCodec {
        fn decode_value(
            &self,
            _payload: &CloneablePayload,
            _realm: &Realm,
        ) -> Result<Value, CodecError> {
            Err(CodecError::Decode(Box::new(std::io::Error::other(
                "unused",
            ))))
        }

        fn encode<T: Serialize>(&self, _value: &T) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::Encode(Box::new(std::io::Error::other(
                "broken",
            ))))
        }
    }

    #[test]
    fn test_reply_channel_encode_failure_sends_nothing_but_completes() {
        let (sent, transport_reply) = capture();
        let channel = ReplyChannel::new(BrokenCodec, transport_reply);

        channel
            .send(json!(1))
            .expect("completion itself should succeed");

        // Both the outcome and the fallback failed to encode, so the
        // transport saw nothing, but the channel is consumed all the same.
        assert!(channel.is_fulfilled());
        assert!(sent.borrow().is_empty());
        assert_eq!(channel.send(json!(2)), Err(ReplyChannelError::DoubleReply));
    }

    #[test]
    fn test_reply_error_display() {
        assert_eq!(
            ReplyError::BrokenPromise.to_string(),
            "reply channel dropped without completion"
        );
        assert_eq!(
            ReplyError::Serialization {
                message: "bad".to_string()
            }
            .to_string(),
            "reply serialization error: bad"
        );
    }

    #[test]
    fn test_reply_error_serde_roundtrip() {
        let errors = vec![
            ReplyError::BrokenPromise,
            ReplyError::Serialization {
                message: "test".to_string(),
            },
        ];

        for error in errors {
            let json = serde_json::to_string(&error).expect("serialize");
            let decoded: ReplyError = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(error, decoded);
        }
    }
}
