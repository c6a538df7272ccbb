//! Metrics stream: steps fire events, the harness drains them.

use tokio::sync::mpsc;
use xray_load_core::RequestEvent;

/// Receives one event per HTTP request or command execution.
pub trait EventSink: Send + Sync {
    fn fire(&self, event: RequestEvent);
}

/// Sink backed by an unbounded channel. Clones feed the same receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RequestEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RequestEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn fire(&self, event: RequestEvent) {
        // Receiver only goes away after every user has stopped.
        let _ = self.tx.send(event);
    }
}

/// Drain whatever is currently buffered without waiting.
pub fn drain_ready(rx: &mut mpsc::UnboundedReceiver<RequestEvent>) -> Vec<RequestEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}
