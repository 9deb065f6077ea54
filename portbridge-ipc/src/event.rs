//! Per-dispatch event contexts.
//!
//! An [`IpcEvent`] represents one dispatch occurrence. It is created by the
//! transport glue with the sender's identity, owned by the dispatch call,
//! and lent to the emitter for the duration of listener execution. For
//! request/response operations the dispatcher attaches a reply channel to
//! it before emitting; listeners retrieve the channel from the context
//! rather than from the positional event arguments.

use std::rc::Rc;

use portbridge_core::SenderInfo;

use crate::reply::ReplyChannel;

/// Context handle for one dispatch occurrence.
///
/// The reply channel is a first-class optional field. Fire-and-forget
/// operations never populate it; request/response operations always do. A
/// listener that wants to reply after the dispatch call has returned keeps
/// the `Rc` from [`reply_channel`](Self::reply_channel); if nobody does, the
/// channel is dropped with the event and resolves itself with a
/// broken-promise outcome.
pub struct IpcEvent {
    sender: SenderInfo,
    reply: Option<Rc<ReplyChannel>>,
}

impl IpcEvent {
    /// Create an event context for a message from the given sender.
    pub fn new(sender: SenderInfo) -> Self {
        Self {
            sender,
            reply: None,
        }
    }

    /// Identity of the remote context that sent the message.
    pub fn sender(&self) -> SenderInfo {
        self.sender
    }

    /// The reply channel for this dispatch, if the operation expects a
    /// response.
    pub fn reply_channel(&self) -> Option<Rc<ReplyChannel>> {
        self.reply.clone()
    }

    /// Check whether a reply channel is attached.
    pub fn has_reply_channel(&self) -> bool {
        self.reply.is_some()
    }

    pub(crate) fn attach_reply(&mut self, channel: ReplyChannel) {
        self.reply = Some(Rc::new(channel));
    }
}

impl std::fmt::Debug for IpcEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcEvent")
            .field("sender", &self.sender)
            .field("has_reply", &self.reply.is_some())
            .finish()
    }
}
