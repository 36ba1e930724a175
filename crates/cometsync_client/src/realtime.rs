//! The realtime bridge: an opaque bidirectional push-event channel.
//!
//! The wire format of the underlying socket library is deliberately out
//! of scope; implementations wrap whatever event channel the application
//! uses. The engine only needs two things from a channel: a per-call
//! request/acknowledgment pair, and inbound `"comets"` events.

use crate::config::TransportConfig;
use cometsync_protocol::{CometEvent, Method, Params};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reply delivered through the channel's per-request acknowledgment
/// callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReply {
    /// Status code reported by the server.
    pub status: u16,
    /// Response body.
    pub body: Params,
}

/// Handler receiving inbound comet events from a channel.
pub type CometHandler = Arc<dyn Fn(CometEvent) + Send + Sync>;

/// An open bidirectional push-event channel.
pub trait RealtimeChannel: Send + Sync {
    /// Emits a `{ method, path, data }` envelope and waits for the
    /// acknowledgment. `Err` carries the emission exception text.
    fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&Params>,
    ) -> Result<ChannelReply, String>;

    /// True while the channel is usable. The transport falls back to
    /// HTTP whenever this is false.
    fn is_connected(&self) -> bool;
}

/// Opens channels for a transport context.
pub trait RealtimeConnector: Send + Sync {
    /// Opens a channel against the context's base URL, registering
    /// `on_comet` for inbound `"comets"` events.
    fn connect(
        &self,
        config: &TransportConfig,
        on_comet: CometHandler,
    ) -> Result<Arc<dyn RealtimeChannel>, String>;
}

/// A scripted channel for tests: pops canned replies in order and
/// records every request. With no scripted reply left it acknowledges
/// with `200 {}`.
#[derive(Default)]
pub struct MockChannel {
    connected: AtomicBool,
    replies: Mutex<VecDeque<Result<ChannelReply, String>>>,
    requests: Mutex<Vec<(Method, String, Option<Params>)>>,
}

impl MockChannel {
    /// Creates a connected channel.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues an acknowledgment.
    pub fn push_reply(&self, reply: ChannelReply) {
        self.replies.lock().push_back(Ok(reply));
    }

    /// Queues an emission exception.
    pub fn push_exception(&self, message: impl Into<String>) {
        self.replies.lock().push_back(Err(message.into()));
    }

    /// Flips the connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<(Method, String, Option<Params>)> {
        self.requests.lock().clone()
    }
}

impl RealtimeChannel for MockChannel {
    fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&Params>,
    ) -> Result<ChannelReply, String> {
        self.requests
            .lock()
            .push((method, path.to_string(), data.cloned()));
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Ok(ChannelReply {
                status: 200,
                body: Params::new(),
            })
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// A connector handing out a prebuilt [`MockChannel`]; captures the
/// comet handler so tests can push inbound events.
pub struct MockConnector {
    channel: Arc<MockChannel>,
    handler: Mutex<Option<CometHandler>>,
    fail: AtomicBool,
}

impl MockConnector {
    /// Creates a connector serving the given channel.
    pub fn new(channel: Arc<MockChannel>) -> Self {
        Self {
            channel,
            handler: Mutex::new(None),
            fail: AtomicBool::new(false),
        }
    }

    /// Makes subsequent `connect` calls fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// True once a channel was handed out.
    pub fn connected(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Delivers an inbound comet event through the captured handler.
    pub fn push_comet(&self, event: CometEvent) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

impl RealtimeConnector for MockConnector {
    fn connect(
        &self,
        _config: &TransportConfig,
        on_comet: CometHandler,
    ) -> Result<Arc<dyn RealtimeChannel>, String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        *self.handler.lock() = Some(on_comet);
        Ok(Arc::clone(&self.channel) as Arc<dyn RealtimeChannel>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cometsync_protocol::{params, CometVerb};
    use serde_json::json;

    #[test]
    fn mock_channel_scripting() {
        let channel = MockChannel::new();
        channel.push_reply(ChannelReply {
            status: 200,
            body: params([("data", json!([]))]),
        });
        channel.push_exception("socket closed");

        let reply = channel.request(Method::Get, "/widgets", None).unwrap();
        assert_eq!(reply.status, 200);
        assert!(channel.request(Method::Get, "/widgets", None).is_err());
        assert_eq!(channel.requests().len(), 2);
    }

    #[test]
    fn connector_captures_the_handler() {
        let channel = Arc::new(MockChannel::new());
        let connector = MockConnector::new(Arc::clone(&channel));
        let seen: Arc<Mutex<Vec<CometEvent>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let handler: CometHandler = Arc::new(move |event| sink.lock().push(event));
        connector
            .connect(&TransportConfig::default(), handler)
            .unwrap();

        connector.push_comet(CometEvent::new(CometVerb::Create, "widgets", json!({})));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn failing_connector_refuses() {
        let connector = MockConnector::new(Arc::new(MockChannel::new()));
        connector.set_fail(true);
        let handler: CometHandler = Arc::new(|_| {});
        assert!(connector
            .connect(&TransportConfig::default(), handler)
            .is_err());
        assert!(!connector.connected());
    }
}
