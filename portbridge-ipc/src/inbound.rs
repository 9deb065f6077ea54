//! The transport-facing message surface.
//!
//! A transport-driving loop does not want to know which dispatcher method
//! matches which wire message. [`InboundIpc`] reifies the four-operation
//! surface as one enum, [`IpcDispatcher::dispatch`] routes a variant to the
//! matching operation, and [`InboundQueue`] buffers messages delivered by
//! the transport until the environment-owning thread drains them.

use std::cell::RefCell;
use std::collections::VecDeque;

use portbridge_core::{CloneablePayload, PayloadCodec, Realm, SenderInfo, TransferableMessage};

use crate::dispatcher::IpcDispatcher;
use crate::emitter::EventEmitter;
use crate::error::DispatchError;
use crate::event::IpcEvent;
use crate::ports::PortBroker;

/// Pending-response handle supplied by the transport with request-style
/// messages. Receives the encoded reply outcome; called at most once.
pub type ReplySink = Box<dyn FnOnce(&[u8])>;

/// One inbound message as delivered by the transport.
pub enum InboundIpc {
    /// Fire-and-forget message.
    Message {
        /// Topic the message was sent on.
        channel: String,
        /// Cloned message body.
        payload: CloneablePayload,
    },
    /// Request expecting an asynchronous reply.
    Invoke {
        /// Topic the request was sent on.
        channel: String,
        /// Cloned request body.
        payload: CloneablePayload,
        /// Where the encoded reply outcome goes.
        reply_to: ReplySink,
    },
    /// Message carrying transferred port endpoints.
    PostMessage {
        /// Topic the message was sent on.
        channel: String,
        /// Body plus the raw port descriptors, in sender order.
        message: TransferableMessage,
    },
    /// Request whose sender is blocked awaiting the reply.
    MessageSync {
        /// Topic the request was sent on.
        channel: String,
        /// Cloned request body.
        payload: CloneablePayload,
        /// Where the encoded reply outcome goes.
        reply_to: ReplySink,
    },
}

impl InboundIpc {
    /// The channel this message was sent on.
    pub fn channel(&self) -> &str {
        match self {
            InboundIpc::Message { channel, .. }
            | InboundIpc::Invoke { channel, .. }
            | InboundIpc::PostMessage { channel, .. }
            | InboundIpc::MessageSync { channel, .. } => channel,
        }
    }

    /// Short operation name for diagnostics.
    pub fn operation(&self) -> &'static str {
        match self {
            InboundIpc::Message { .. } => "message",
            InboundIpc::Invoke { .. } => "invoke",
            InboundIpc::PostMessage { .. } => "post-message",
            InboundIpc::MessageSync { .. } => "message-sync",
        }
    }
}

impl std::fmt::Debug for InboundIpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundIpc")
            .field("operation", &self.operation())
            .field("channel", &self.channel())
            .finish()
    }
}

impl<E, C, P> IpcDispatcher<E, C, P>
where
    E: EventEmitter,
    C: PayloadCodec,
    P: PortBroker,
{
    /// Route one inbound message to the matching dispatch operation.
    ///
    /// # Errors
    ///
    /// Propagates the routed operation's [`DispatchError`].
    pub fn dispatch(
        &self,
        event: IpcEvent,
        inbound: InboundIpc,
        realm: &Realm,
    ) -> Result<(), DispatchError> {
        match inbound {
            InboundIpc::Message { channel, payload } => {
                self.message(event, &channel, &payload, realm)
            }
            InboundIpc::Invoke {
                channel,
                payload,
                reply_to,
            } => self.invoke(event, &channel, &payload, realm, reply_to),
            InboundIpc::PostMessage { channel, message } => {
                self.receive_post_message(event, &channel, message, realm)
            }
            InboundIpc::MessageSync {
                channel,
                payload,
                reply_to,
            } => self.message_sync(event, &channel, &payload, realm, reply_to),
        }
    }
}

/// FIFO buffer between the transport and the environment-owning thread.
///
/// The transport pushes messages as they arrive; the owning thread drains
/// the queue, dispatching each message in delivery order. Draining stops at
/// the first dispatch error, leaving the remaining messages queued for the
/// caller to inspect or discard.
#[derive(Default)]
pub struct InboundQueue {
    items: RefCell<VecDeque<(SenderInfo, InboundIpc)>>,
}

impl InboundQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message from the given sender.
    pub fn push(&self, sender: SenderInfo, inbound: InboundIpc) {
        self.items.borrow_mut().push_back((sender, inbound));
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Dispatch every queued message in delivery order.
    ///
    /// Returns the number of messages dispatched.
    ///
    /// # Errors
    ///
    /// Stops at the first failing dispatch and returns its error; messages
    /// after the failing one stay queued.
    pub fn drain<E, C, P>(
        &self,
        dispatcher: &IpcDispatcher<E, C, P>,
        realm: &Realm,
    ) -> Result<usize, DispatchError>
    where
        E: EventEmitter,
        C: PayloadCodec,
        P: PortBroker,
    {
        let mut dispatched = 0;
        loop {
            let next = self.items.borrow_mut().pop_front();
            let Some((sender, inbound)) = next else {
                return Ok(dispatched);
            };

            let event = IpcEvent::new(sender);
            dispatcher.dispatch(event, inbound, realm)?;
            dispatched += 1;
        }
    }
}

impl std::fmt::Debug for InboundQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundQueue")
            .field("queued", &self.len())
            .finish()
    }
}
