//! Echo Bridge Example: a loopback transport feeding the dispatcher.
//!
//! This example plays both sides of the process boundary in one process:
//! a fake remote context enqueues messages, and listeners registered on an
//! `EventHub` react to them, replying where a reply is expected.
//!
//! ```bash
//! cargo run --example echo_bridge
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use portbridge_ipc::{
    CloneablePayload, EventHub, InProcessPorts, InboundIpc, InboundQueue, IpcDispatcher,
    JsonPayloadCodec, PortBroker, Realm, RealmId, ReplyOutcome, SenderInfo, TransferableMessage,
    IPC_INVOKE_EVENT, IPC_MESSAGE_EVENT, IPC_PORTS_EVENT,
};
use serde_json::json;

fn payload(value: &serde_json::Value) -> CloneablePayload {
    CloneablePayload::new(serde_json::to_vec(value).expect("serialize payload"))
}

fn main() {
    let realm = Realm::new(RealmId::new(1), "echo-demo");
    let sender = SenderInfo::new(7, 1);

    let hub = Rc::new(EventHub::new());
    let broker = Rc::new(InProcessPorts::new());
    let dispatcher = IpcDispatcher::new(hub.clone(), JsonPayloadCodec, broker.clone());

    // Listener side: a log subscriber, an echo handler, and a port greeter.
    hub.on(IPC_MESSAGE_EVENT, |event, channel, args| {
        println!(
            "[listener] message on {:?} from {}: {:?}",
            channel,
            event.sender(),
            args[0].as_value()
        );
    });

    hub.on(IPC_INVOKE_EVENT, |event, channel, args| {
        let request = args[0].as_value().cloned().unwrap_or_default();
        println!("[listener] invoke on {:?}: {}", channel, request);
        if let Some(reply) = event.reply_channel() {
            reply
                .send(json!({ "echo": request }))
                .expect("reply once");
        }
    });

    hub.on(IPC_PORTS_EVENT, |_event, channel, args| {
        let ports = args[1].as_ports().expect("ports argument");
        println!("[listener] {} port(s) arrived on {:?}", ports.len(), channel);
        for port in ports {
            port.post(json!("hello from the listener side"));
        }
    });

    // Transport side: enqueue traffic the way a remote context would.
    let queue = InboundQueue::new();

    queue.push(
        sender,
        InboundIpc::Message {
            channel: "log".to_string(),
            payload: payload(&json!({"level": "info", "text": "renderer started"})),
        },
    );

    let replies: Rc<RefCell<Vec<Vec<u8>>>> = Rc::new(RefCell::new(Vec::new()));
    let replies_clone = replies.clone();
    queue.push(
        sender,
        InboundIpc::Invoke {
            channel: "echo".to_string(),
            payload: payload(&json!("anybody there?")),
            reply_to: Box::new(move |bytes| replies_clone.borrow_mut().push(bytes.to_vec())),
        },
    );

    let (transferred, kept) = broker.create_pair();
    queue.push(
        sender,
        InboundIpc::PostMessage {
            channel: "side-channel".to_string(),
            message: TransferableMessage::new(payload(&json!("take this port")), vec![transferred]),
        },
    );

    let dispatched = queue
        .drain(&dispatcher, &realm)
        .expect("dispatch should succeed");
    println!("[bridge] dispatched {} message(s)", dispatched);

    // Back on the "remote" side: read the invoke reply and the port.
    for bytes in replies.borrow().iter() {
        let outcome: ReplyOutcome = serde_json::from_slice(bytes).expect("decode outcome");
        println!("[remote] invoke outcome: {:?}", outcome);
    }

    let our_end = broker
        .entangle(vec![kept], &realm)
        .expect("entangle our end");
    while let Some(value) = our_end[0].try_recv() {
        println!("[remote] port delivered: {}", value);
    }
}
