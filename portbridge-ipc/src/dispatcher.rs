//! The dispatch operations: inbound transport messages to named events.
//!
//! [`IpcDispatcher`] is the bridge between a process-boundary transport and
//! a scripting environment's listeners. Each operation takes the event
//! context, the channel name, and the payload, decodes the payload into a
//! native value, and fires one event with the fixed argument order
//! `(event, channel, value, ...)`. Request/response operations additionally
//! wrap the transport's pending-response handle in a [`ReplyChannel`] and
//! attach it to the event context before emitting.
//!
//! The dispatcher holds no state across calls. All operations are
//! synchronous and run on the thread owning the target environment; any
//! concurrency lives in the collaborators.

use std::rc::Rc;

use portbridge_core::{CloneablePayload, PayloadCodec, Realm, TransferableMessage};

use crate::emitter::{EventArg, EventEmitter};
use crate::error::DispatchError;
use crate::event::IpcEvent;
use crate::ports::PortBroker;
use crate::reply::ReplyChannel;

/// Event name for fire-and-forget messages.
pub const IPC_MESSAGE_EVENT: &str = "ipc-message";

/// Event name for request/response invocations.
pub const IPC_INVOKE_EVENT: &str = "ipc-invoke";

/// Event name for messages carrying transferred ports.
pub const IPC_PORTS_EVENT: &str = "ipc-ports";

/// Event name for synchronous request/response messages.
pub const IPC_MESSAGE_SYNC_EVENT: &str = "ipc-message-sync";

/// Bridges inbound transport messages into script-side events.
///
/// Generic over the emitter, the payload codec, and the port broker, all
/// held by composition. The emitter is typically the host object the
/// environment already exposes events on; the dispatcher only needs its
/// emission capability.
pub struct IpcDispatcher<E, C, P>
where
    E: EventEmitter,
    C: PayloadCodec,
    P: PortBroker,
{
    emitter: Rc<E>,
    codec: C,
    ports: Rc<P>,
}

impl<E, C, P> IpcDispatcher<E, C, P>
where
    E: EventEmitter,
    C: PayloadCodec,
    P: PortBroker,
{
    /// Create a dispatcher over the given collaborators.
    pub fn new(emitter: Rc<E>, codec: C, ports: Rc<P>) -> Self {
        Self {
            emitter,
            codec,
            ports,
        }
    }

    /// The emitter this dispatcher fires events on.
    pub fn emitter(&self) -> &Rc<E> {
        &self.emitter
    }

    /// Dispatch a fire-and-forget message.
    ///
    /// Emits [`IPC_MESSAGE_EVENT`] with `(event, channel, value)`. No reply
    /// channel is attached.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] if the payload cannot be decoded;
    /// no event is emitted.
    pub fn message(
        &self,
        event: IpcEvent,
        channel: &str,
        payload: &CloneablePayload,
        realm: &Realm,
    ) -> Result<(), DispatchError> {
        tracing::debug!(operation = "message", channel, "dispatching");

        let value = self.codec.decode_value(payload, realm)?;
        self.emitter
            .emit_event(IPC_MESSAGE_EVENT, &event, channel, vec![EventArg::Value(value)]);
        Ok(())
    }

    /// Dispatch a request expecting an asynchronous reply.
    ///
    /// Wraps `reply_to` in a [`ReplyChannel`], attaches it to the event
    /// context, and emits [`IPC_INVOKE_EVENT`] with `(event, channel,
    /// value)`. A listener completes the channel with the result, either
    /// during the emit or later from a kept handle. If no listener keeps or
    /// completes it, the channel resolves itself with a broken-promise
    /// outcome when the event context is dropped at the end of this call.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] if the payload cannot be decoded.
    /// In that case no event is emitted and `reply_to` is dropped uncalled;
    /// resolving the pending response is then the transport's business.
    pub fn invoke<F>(
        &self,
        mut event: IpcEvent,
        channel: &str,
        payload: &CloneablePayload,
        realm: &Realm,
        reply_to: F,
    ) -> Result<(), DispatchError>
    where
        F: FnOnce(&[u8]) + 'static,
    {
        tracing::debug!(operation = "invoke", channel, "dispatching");

        let value = self.codec.decode_value(payload, realm)?;
        event.attach_reply(ReplyChannel::new(self.codec.clone(), reply_to));
        self.emitter
            .emit_event(IPC_INVOKE_EVENT, &event, channel, vec![EventArg::Value(value)]);
        Ok(())
    }

    /// Dispatch a message carrying transferred port endpoints.
    ///
    /// Decodes the payload, entangles the port descriptors through the
    /// broker, and emits [`IPC_PORTS_EVENT`] with `(event, channel, value,
    /// ports)`. The wrapped ports preserve descriptor order. No reply
    /// channel is attached.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] if the payload is malformed (the
    /// broker is never called in that case) or [`DispatchError::Entangle`]
    /// if a descriptor cannot be entangled. Either way no event is emitted.
    pub fn receive_post_message(
        &self,
        event: IpcEvent,
        channel: &str,
        message: TransferableMessage,
        realm: &Realm,
    ) -> Result<(), DispatchError> {
        tracing::debug!(
            operation = "receive-post-message",
            channel,
            ports = message.ports.len(),
            "dispatching"
        );

        let TransferableMessage { payload, ports } = message;
        let value = self.codec.decode_value(&payload, realm)?;
        let wrapped = self.ports.entangle(ports, realm)?;
        self.emitter.emit_event(
            IPC_PORTS_EVENT,
            &event,
            channel,
            vec![EventArg::Value(value), EventArg::Ports(wrapped)],
        );
        Ok(())
    }

    /// Dispatch a request whose sender is blocked awaiting the reply.
    ///
    /// Same shape as [`invoke`](Self::invoke) but emits
    /// [`IPC_MESSAGE_SYNC_EVENT`]. A listener is expected to complete the
    /// reply channel before this call returns; that expectation is not
    /// enforced, only the at-most-once completion is. A reply still pending
    /// at return is logged, and a listener that kept the channel may still
    /// complete it later.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] if the payload cannot be decoded;
    /// no event is emitted and `reply_to` is dropped uncalled.
    pub fn message_sync<F>(
        &self,
        mut event: IpcEvent,
        channel: &str,
        payload: &CloneablePayload,
        realm: &Realm,
        reply_to: F,
    ) -> Result<(), DispatchError>
    where
        F: FnOnce(&[u8]) + 'static,
    {
        tracing::debug!(operation = "message-sync", channel, "dispatching");

        let value = self.codec.decode_value(payload, realm)?;
        event.attach_reply(ReplyChannel::new(self.codec.clone(), reply_to));
        self.emitter.emit_event(
            IPC_MESSAGE_SYNC_EVENT,
            &event,
            channel,
            vec![EventArg::Value(value)],
        );

        if let Some(reply) = event.reply_channel() {
            if !reply.is_fulfilled() {
                tracing::warn!(
                    channel,
                    "synchronous dispatch returned with its reply still pending"
                );
            }
        }
        Ok(())
    }
}
