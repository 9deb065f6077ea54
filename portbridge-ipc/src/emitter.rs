//! Event emission into the scripting environment.
//!
//! The dispatcher is generic over anything that can fire a named event at
//! its listeners. [`EventEmitter`] is that capability as a trait, held by
//! composition rather than inheritance so any host object can carry a
//! dispatcher without joining a class hierarchy. [`EventHub`] is a concrete
//! single-threaded emitter for tests, demos, and embedders without their
//! own event machinery.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::event::IpcEvent;
use crate::ports::LocalPort;

/// One positional argument of an emitted event.
///
/// Listener signatures are fixed at `(event, channel, args...)`; this enum
/// covers the two argument shapes the dispatcher produces.
#[derive(Debug)]
pub enum EventArg {
    /// A native value decoded from the message payload.
    Value(Value),
    /// Entangled ports transferred with the message, in sender order.
    Ports(Vec<LocalPort>),
}

impl EventArg {
    /// The native value, if this argument is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            EventArg::Value(value) => Some(value),
            EventArg::Ports(_) => None,
        }
    }

    /// The entangled ports, if this argument carries them.
    pub fn as_ports(&self) -> Option<&[LocalPort]> {
        match self {
            EventArg::Value(_) => None,
            EventArg::Ports(ports) => Some(ports),
        }
    }
}

/// Capability to fire a named event into the scripting environment.
///
/// `emit_event` must run every listener registered for `name` synchronously,
/// before returning, on the calling thread. Emitting an event nobody
/// listens to is a valid no-op, and emission never fails: listener errors
/// are the environment's concern, not the dispatcher's.
pub trait EventEmitter {
    /// Fire `name` at all registered listeners with the fixed argument
    /// order `(event, channel, args...)`.
    fn emit_event(&self, name: &str, event: &IpcEvent, channel: &str, args: Vec<EventArg>);
}

type Listener = Box<dyn Fn(&IpcEvent, &str, &[EventArg])>;

/// A plain synchronous event emitter.
///
/// Listeners are run in registration order on the calling thread. Not for
/// use across threads, and listeners must not register further listeners
/// while an emit is in progress.
#[derive(Default)]
pub struct EventHub {
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
}

impl EventHub {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for the named event.
    pub fn on<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(&IpcEvent, &str, &[EventArg]) + 'static,
    {
        self.listeners
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(Box::new(listener));
    }

    /// Number of listeners registered for the named event.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.borrow().get(name).map_or(0, Vec::len)
    }
}

impl EventEmitter for EventHub {
    fn emit_event(&self, name: &str, event: &IpcEvent, channel: &str, args: Vec<EventArg>) {
        let listeners = self.listeners.borrow();
        match listeners.get(name) {
            Some(registered) => {
                for listener in registered {
                    listener(event, channel, &args);
                }
            }
            None => {
                tracing::trace!(event = name, channel, "no listeners registered");
            }
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("events", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use portbridge_core::SenderInfo;
    use serde_json::json;

    use super::*;

    fn test_event() -> IpcEvent {
        IpcEvent::new(SenderInfo::new(1, 1))
    }

    #[test]
    fn test_emit_runs_listeners_in_registration_order() {
        let hub = EventHub::new();
        let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let first = order.clone();
        hub.on("ping", move |_event, _channel, _args| {
            first.borrow_mut().push(1);
        });
        let second = order.clone();
        hub.on("ping", move |_event, _channel, _args| {
            second.borrow_mut().push(2);
        });

        hub.emit_event("ping", &test_event(), "chan", Vec::new());
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let hub = EventHub::new();
        // No panic, no error.
        hub.emit_event("nobody-home", &test_event(), "chan", Vec::new());
        assert_eq!(hub.listener_count("nobody-home"), 0);
    }

    #[test]
    fn test_emit_is_synchronous() {
        let hub = EventHub::new();
        let seen: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));

        let seen_clone = seen.clone();
        hub.on("data", move |_event, channel, args| {
            assert_eq!(channel, "chan");
            *seen_clone.borrow_mut() = args[0].as_value().cloned();
        });

        hub.emit_event(
            "data",
            &test_event(),
            "chan",
            vec![EventArg::Value(json!({"x": 1}))],
        );

        // Listener ran before emit_event returned.
        assert_eq!(*seen.borrow(), Some(json!({"x": 1})));
    }

    #[test]
    fn test_listeners_scoped_per_event_name() {
        let hub = EventHub::new();
        let hits: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));

        let hits_clone = hits.clone();
        hub.on("a", move |_event, _channel, _args| {
            *hits_clone.borrow_mut() += 1;
        });

        hub.emit_event("b", &test_event(), "chan", Vec::new());
        assert_eq!(*hits.borrow(), 0);

        hub.emit_event("a", &test_event(), "chan", Vec::new());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_event_arg_accessors() {
        let value_arg = EventArg::Value(json!(1));
        assert_eq!(value_arg.as_value(), Some(&json!(1)));
        assert!(value_arg.as_ports().is_none());

        let ports_arg = EventArg::Ports(Vec::new());
        assert!(ports_arg.as_value().is_none());
        assert_eq!(ports_arg.as_ports().map(<[LocalPort]>::len), Some(0));
    }
}
