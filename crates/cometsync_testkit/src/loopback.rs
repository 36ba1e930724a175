//! Loopback adapters: the client's transport traits routed into an
//! in-process reference server.

use cometsync_client::{
    ChannelReply, CometHandler, Headers, HttpClient, HttpResponse, InstanceOptions,
    RealtimeChannel, RealtimeConfig, RealtimeConnector, SyncContext, TransportConfig,
};
use cometsync_protocol::{Method, Params};
use cometsync_server::ResourceServer;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Base URL the loopback transports are configured with.
pub const LOOPBACK_BASE: &str = "http://loopback";

/// [`HttpClient`] routing requests into a reference server.
pub struct LoopbackHttp {
    server: Arc<ResourceServer>,
}

impl LoopbackHttp {
    /// Creates a client bound to the given server.
    pub fn new(server: Arc<ResourceServer>) -> Self {
        Self { server }
    }
}

impl HttpClient for LoopbackHttp {
    fn request(
        &self,
        method: Method,
        url: &str,
        _headers: &Headers,
        body: Option<&str>,
    ) -> Result<HttpResponse, String> {
        let path_and_query = url.strip_prefix(LOOPBACK_BASE).unwrap_or(url);
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };

        let params = match body {
            Some(body) => serde_json::from_str::<Params>(body).map_err(|e| e.to_string())?,
            None => query.map(parse_query).unwrap_or_default(),
        };

        match self.server.handle(method, path, &params) {
            Ok((status, body)) => Ok(HttpResponse {
                status,
                status_text: match status {
                    200 => "OK".into(),
                    201 => "Created".into(),
                    _ => String::new(),
                },
                body: Value::Object(body).to_string(),
            }),
            Err(e) => Ok(HttpResponse {
                status: e.status(),
                status_text: e.status_text().into(),
                body: String::new(),
            }),
        }
    }
}

/// Decodes a query string back into a parameter map. Every value comes
/// back as a string, the way it would off the wire.
fn parse_query(query: &str) -> Params {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = urlencoding::decode(key).ok()?.into_owned();
            let value = urlencoding::decode(value).ok()?.into_owned();
            Some((key, Value::String(value)))
        })
        .collect()
}

/// [`RealtimeChannel`] acknowledging requests straight from the
/// reference server.
pub struct LoopbackChannel {
    server: Arc<ResourceServer>,
    connected: AtomicBool,
}

impl LoopbackChannel {
    /// Creates a connected channel.
    pub fn new(server: Arc<ResourceServer>) -> Self {
        Self {
            server,
            connected: AtomicBool::new(true),
        }
    }

    /// Flips the connection state; while disconnected the client falls
    /// back to HTTP.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl RealtimeChannel for LoopbackChannel {
    fn request(
        &self,
        method: Method,
        path: &str,
        data: Option<&Params>,
    ) -> Result<ChannelReply, String> {
        let params = data.cloned().unwrap_or_default();
        match self.server.handle(method, path, &params) {
            Ok((status, body)) => Ok(ChannelReply { status, body }),
            Err(e) => {
                let mut body = Params::new();
                body.insert("error".into(), Value::String(e.to_string()));
                Ok(ChannelReply {
                    status: e.status(),
                    body,
                })
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// [`RealtimeConnector`] wiring the server's comet broadcast into the
/// client's dispatch.
pub struct LoopbackConnector {
    server: Arc<ResourceServer>,
    channel: Arc<LoopbackChannel>,
}

impl LoopbackConnector {
    /// Creates a connector for the given server.
    pub fn new(server: Arc<ResourceServer>) -> Self {
        let channel = Arc::new(LoopbackChannel::new(Arc::clone(&server)));
        Self { server, channel }
    }

    /// The channel this connector hands out, for connectivity scripting.
    pub fn channel(&self) -> Arc<LoopbackChannel> {
        Arc::clone(&self.channel)
    }
}

impl RealtimeConnector for LoopbackConnector {
    fn connect(
        &self,
        _config: &TransportConfig,
        on_comet: CometHandler,
    ) -> Result<Arc<dyn RealtimeChannel>, String> {
        self.server
            .subscribe_comets(Arc::new(move |event| on_comet(event.clone())));
        Ok(Arc::clone(&self.channel) as Arc<dyn RealtimeChannel>)
    }
}

/// A context whose default transport talks HTTP to the given server.
pub fn context_with_server(server: &Arc<ResourceServer>) -> Arc<SyncContext> {
    let ctx = SyncContext::new();
    ctx.configure(TransportConfig::new(LOOPBACK_BASE));
    bind_loopback(&ctx, server);
    ctx
}

/// A context whose default transport is realtime-enabled against the
/// given server; returns the connector for channel scripting.
pub fn realtime_context_with_server(
    server: &Arc<ResourceServer>,
) -> (Arc<SyncContext>, Arc<LoopbackConnector>) {
    let ctx = SyncContext::new();
    ctx.configure(TransportConfig::new(LOOPBACK_BASE).with_realtime(RealtimeConfig::new()));
    bind_loopback(&ctx, server);
    let connector = Arc::new(LoopbackConnector::new(Arc::clone(server)));
    ctx.set_realtime_connector(Arc::clone(&connector) as Arc<dyn RealtimeConnector>);
    (ctx, connector)
}

fn bind_loopback(ctx: &Arc<SyncContext>, server: &Arc<ResourceServer>) {
    let client = Arc::new(LoopbackHttp::new(Arc::clone(server)));
    ctx.instance_with(InstanceOptions::new().with_http_client(client as Arc<dyn HttpClient>))
        .expect("default context is always registered");
}
