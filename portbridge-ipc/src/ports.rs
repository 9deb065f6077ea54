//! Port entanglement: raw descriptors to usable local channels.
//!
//! Port endpoints cross the process boundary as bare [`PortDescriptor`]
//! tokens. Before a listener can use one it must be entangled with its
//! remote counterpart, producing a [`LocalPort`] that posts into and drains
//! from the paired endpoint. Entanglement itself belongs to the embedder;
//! the dispatcher only requires the [`PortBroker`] contract and guarantees
//! that descriptor order is preserved in the wrapped result.
//!
//! [`InProcessPorts`] is a broker for same-process pairs, used by tests and
//! demos and by embedders whose "remote" side lives in the same process.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use portbridge_core::{PortDescriptor, PortToken, Realm};
use serde_json::Value;

/// Errors from entangling transferred port descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EntangleError {
    /// The descriptor's endpoint is unknown or was already consumed by an
    /// earlier entanglement.
    #[error("port endpoint unavailable: {token}")]
    Consumed {
        /// Token of the unusable descriptor.
        token: PortToken,
    },
}

/// Converts raw port descriptors into usable local channel objects.
///
/// Implementations own the mapping from tokens to live endpoints. The
/// returned sequence must have the same length and order as the input:
/// descriptor *i* yields wrapped port *i*.
pub trait PortBroker {
    /// Entangle each descriptor with its remote counterpart.
    ///
    /// Ownership of the descriptors transfers into this call; on success
    /// the caller holds only the wrapped ports.
    ///
    /// # Errors
    ///
    /// Returns [`EntangleError`] if any descriptor cannot be entangled; no
    /// event should be emitted with a partially wrapped set.
    fn entangle(
        &self,
        descriptors: Vec<PortDescriptor>,
        realm: &Realm,
    ) -> Result<Vec<LocalPort>, EntangleError>;
}

type SharedQueue = Rc<RefCell<VecDeque<Value>>>;

/// A usable, entangled port endpoint in the local environment.
///
/// Values posted here appear on the paired endpoint and vice versa. Clones
/// share the same underlying endpoint.
#[derive(Clone)]
pub struct LocalPort {
    token: PortToken,
    inbox: SharedQueue,
    outbox: SharedQueue,
}

impl LocalPort {
    /// Token of the endpoint this port wraps.
    pub fn token(&self) -> PortToken {
        self.token
    }

    /// Post a value to the paired endpoint.
    pub fn post(&self, value: Value) {
        self.outbox.borrow_mut().push_back(value);
    }

    /// Take the next value delivered by the paired endpoint, if any.
    pub fn try_recv(&self) -> Option<Value> {
        self.inbox.borrow_mut().pop_front()
    }

    /// Number of delivered values not yet received.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }
}

impl std::fmt::Debug for LocalPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPort")
            .field("token", &self.token)
            .field("pending", &self.pending())
            .finish()
    }
}

struct PortEnd {
    inbox: SharedQueue,
    outbox: SharedQueue,
}

/// Port broker for pairs living in the current process.
///
/// `create_pair` mints two cross-connected endpoints and returns their
/// descriptors; either descriptor can then travel with a message and be
/// entangled exactly once. Entangling consumes the endpoint, so a replayed
/// or duplicated descriptor fails with [`EntangleError::Consumed`].
pub struct InProcessPorts {
    pending: RefCell<HashMap<PortToken, PortEnd>>,
    next_pair: std::cell::Cell<u64>,
}

impl InProcessPorts {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(HashMap::new()),
            next_pair: std::cell::Cell::new(1),
        }
    }

    /// Mint an entangled pair, returning the descriptors for both ends.
    pub fn create_pair(&self) -> (PortDescriptor, PortDescriptor) {
        let pair = self.next_pair.get();
        self.next_pair.set(pair + 1);

        let first_token = PortToken::new(pair, 1);
        let second_token = PortToken::new(pair, 2);

        let first_queue: SharedQueue = Rc::new(RefCell::new(VecDeque::new()));
        let second_queue: SharedQueue = Rc::new(RefCell::new(VecDeque::new()));

        let mut pending = self.pending.borrow_mut();
        pending.insert(
            first_token,
            PortEnd {
                inbox: first_queue.clone(),
                outbox: second_queue.clone(),
            },
        );
        pending.insert(
            second_token,
            PortEnd {
                inbox: second_queue,
                outbox: first_queue,
            },
        );

        (
            PortDescriptor::new(first_token),
            PortDescriptor::new(second_token),
        )
    }

    /// Number of endpoints minted but not yet entangled.
    pub fn pending_endpoints(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Default for InProcessPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl PortBroker for InProcessPorts {
    fn entangle(
        &self,
        descriptors: Vec<PortDescriptor>,
        realm: &Realm,
    ) -> Result<Vec<LocalPort>, EntangleError> {
        tracing::trace!(realm = %realm.id(), count = descriptors.len(), "entangling ports");

        descriptors
            .into_iter()
            .map(|descriptor| {
                let end = self
                    .pending
                    .borrow_mut()
                    .remove(&descriptor.token)
                    .ok_or(EntangleError::Consumed {
                        token: descriptor.token,
                    })?;
                Ok(LocalPort {
                    token: descriptor.token,
                    inbox: end.inbox,
                    outbox: end.outbox,
                })
            })
            .collect()
    }
}
