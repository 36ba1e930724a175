//! The transport abstraction: request/response semantics for one
//! configured context, plus the comet listener registry shared with the
//! realtime bridge.

use crate::config::{BeforeSend, ContentType, TransportConfig};
use crate::events::{EventSlot, EventSlots, LOADING_SLOT};
use crate::http::HttpClient;
use crate::network::NetworkMonitor;
use crate::realtime::{CometHandler, RealtimeChannel, RealtimeConnector};
use cometsync_protocol::{normalized, CometEvent, Method, Params, ResponseEnvelope};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Error message returned when a request is attempted while offline.
pub const OFFLINE_ERROR: &str = "You seem to be offline :)";

/// Normalized error message for transport exceptions; the underlying
/// exception text is logged, never surfaced.
pub const FETCH_ERROR: &str = "Fetch error";

const NO_CLIENT_ERROR: &str =
    "no HTTP client bound to this transport context; rebind one via instance options";

/// A comet listener registered by a store.
pub struct CometListener {
    /// Room (namespace) the listener subscribes to.
    pub room: String,
    /// Dedup key; re-registering the same id for the same room is a
    /// no-op.
    pub listener_id: String,
    /// Invoked for every event dispatched to the room.
    pub on_comet: Arc<dyn Fn(&CometEvent) + Send + Sync>,
}

/// One configured transport context.
///
/// Every verb method routes through a single internal [`Transport::fetch`];
/// [`Transport::sync`] selects the channel-backed path instead whenever a
/// realtime channel is connected.
pub struct Transport {
    config: RwLock<TransportConfig>,
    http: RwLock<Option<Arc<dyn HttpClient>>>,
    connector: RwLock<Option<Arc<dyn RealtimeConnector>>>,
    channel: RwLock<Option<Arc<dyn RealtimeChannel>>>,
    channel_opening: AtomicBool,
    comet_listeners: RwLock<HashMap<String, Vec<CometListener>>>,
    network: Arc<NetworkMonitor>,
    loading: Arc<EventSlot>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

impl Transport {
    pub(crate) fn new(
        config: TransportConfig,
        http: Option<Arc<dyn HttpClient>>,
        connector: Option<Arc<dyn RealtimeConnector>>,
        network: Arc<NetworkMonitor>,
        events: &EventSlots,
    ) -> Arc<Self> {
        let loading = events.slot(LOADING_SLOT);
        Arc::new(Self {
            config: RwLock::new(config),
            http: RwLock::new(http),
            connector: RwLock::new(connector),
            channel: RwLock::new(None),
            channel_opening: AtomicBool::new(false),
            comet_listeners: RwLock::new(HashMap::new()),
            network,
            loading,
        })
    }

    /// Current configuration (cloned).
    pub fn config(&self) -> TransportConfig {
        self.config.read().clone()
    }

    /// Rebinds the HTTP client. The client differs between
    /// server-rendered and browser-like execution, so it is bound per
    /// resolution rather than fixed at configuration.
    pub fn bind_http_client(&self, client: Arc<dyn HttpClient>) {
        *self.http.write() = Some(client);
    }

    /// Replaces the pre-send hook.
    pub fn bind_before_send(&self, hook: BeforeSend) {
        self.config.write().before_send = Some(hook);
    }

    pub(crate) fn set_connector(&self, connector: Arc<dyn RealtimeConnector>) {
        *self.connector.write() = Some(connector);
    }

    /// `GET url?params`.
    pub fn get(&self, url: &str, params: Option<&Params>) -> ResponseEnvelope {
        self.fetch(url, Method::Get, params)
    }

    /// `POST url` with a body.
    pub fn post(&self, url: &str, params: &Params) -> ResponseEnvelope {
        self.fetch(url, Method::Post, Some(params))
    }

    /// `PUT url` with a body.
    pub fn put(&self, url: &str, params: &Params) -> ResponseEnvelope {
        self.fetch(url, Method::Put, Some(params))
    }

    /// `PATCH url?params`.
    pub fn patch(&self, url: &str, params: Option<&Params>) -> ResponseEnvelope {
        self.fetch(url, Method::Patch, params)
    }

    /// `DELETE url?params`.
    pub fn delete(&self, url: &str, params: Option<&Params>) -> ResponseEnvelope {
        self.fetch(url, Method::Delete, params)
    }

    /// `OPTIONS url?params`.
    pub fn options(&self, url: &str, params: Option<&Params>) -> ResponseEnvelope {
        self.fetch(url, Method::Options, params)
    }

    /// Uploads a payload: `PUT` when the payload carries an `id`,
    /// `POST` otherwise. Upload bodies are passed through without the
    /// `__client_time` stamp; multipart assembly is the client
    /// implementation's concern.
    pub fn upload(&self, url: &str, body: &Params) -> ResponseEnvelope {
        let method = if body.get("id").is_some_and(|v| !v.is_null()) {
            Method::Put
        } else {
            Method::Post
        };
        self.request(url, method, Some(body), false)
    }

    /// The single internal HTTP request path.
    pub fn fetch(&self, url: &str, method: Method, params: Option<&Params>) -> ResponseEnvelope {
        self.request(url, method, params, true)
    }

    fn request(
        &self,
        url: &str,
        method: Method,
        params: Option<&Params>,
        stamp: bool,
    ) -> ResponseEnvelope {
        if !self.network.is_online() {
            self.network.queue_refresh();
            return ResponseEnvelope::error(404, OFFLINE_ERROR);
        }

        let config = self.config();
        if config.base_url.is_empty() {
            warn!(url, "transport has no base_url; passing the path through as-is");
        }
        let client = match self.http.read().clone() {
            Some(client) => client,
            None => {
                warn!(url, "no HTTP client bound to this context");
                return ResponseEnvelope::error(500, NO_CLIENT_ERROR);
            }
        };

        let (remote, body) = if method.has_body() {
            let payload = if stamp {
                stamped(params)
            } else {
                params.cloned().unwrap_or_default()
            };
            let encoded = match config.content_type {
                ContentType::Json => match serde_json::to_string(&payload) {
                    Ok(encoded) => encoded,
                    Err(e) => {
                        debug!(error = %e, url, "body serialization failed");
                        return ResponseEnvelope::error(500, FETCH_ERROR);
                    }
                },
                ContentType::FormUrlEncoded => form_encode(&payload),
            };
            (format!("{}{}", config.base_url, url), Some(encoded))
        } else {
            let with_query = match params {
                Some(params) if !params.is_empty() => {
                    format!("{}?{}", url, form_encode(params))
                }
                _ => url.to_string(),
            };
            (format!("{}{}", config.base_url, with_query), None)
        };

        let mut headers = config.request_defaults.clone();
        headers.insert(
            "Content-Type".into(),
            config.content_type.header_value().into(),
        );
        if let Some(hook) = &config.before_send {
            hook(&mut headers);
        }

        self.loading.set_value(Value::Bool(true));
        if config.debug {
            debug!(method = %method, url = %remote, "transport request");
        }

        match client.request(method, &remote, &headers, body.as_deref()) {
            Ok(response) => {
                if config.debug {
                    debug!(status = response.status, url = %remote, "transport response");
                }
                if !response.ok() {
                    let error = format!("{} - {}", url, response.status_text);
                    debug!(error = %error, "request failed");
                    return ResponseEnvelope::error(response.status, error);
                }
                match serde_json::from_str::<Params>(&response.body) {
                    Ok(body) => ResponseEnvelope::from_body(response.status, body),
                    Err(e) => {
                        debug!(error = %e, url = %remote, "response body was not a JSON object");
                        ResponseEnvelope::error(500, FETCH_ERROR)
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, url = %remote, "fetch error");
                ResponseEnvelope::error(500, FETCH_ERROR)
            }
        }
    }

    /// Uniform entry point used by the store engine.
    ///
    /// Selects the channel-backed path when a realtime channel is
    /// connected, the HTTP path otherwise. The selection happens per
    /// call, so a channel that drops mid-session falls back to HTTP
    /// transparently.
    pub fn sync(&self, url: &str, method: Method, params: Option<&Params>) -> ResponseEnvelope {
        let channel = self.channel.read().clone();
        match channel {
            Some(channel) if channel.is_connected() => {
                self.channel_sync(channel.as_ref(), url, method, params)
            }
            _ => self.fetch(url, method, params),
        }
    }

    fn channel_sync(
        &self,
        channel: &dyn RealtimeChannel,
        url: &str,
        method: Method,
        params: Option<&Params>,
    ) -> ResponseEnvelope {
        if !self.network.is_online() {
            self.network.queue_refresh();
            return ResponseEnvelope::error(404, OFFLINE_ERROR);
        }
        let debug_mode = self.config.read().debug;
        match channel.request(method, url, params) {
            Ok(reply) => {
                if debug_mode {
                    debug!(method = %method, path = url, status = reply.status, "channel response");
                }
                ResponseEnvelope::from_body(reply.status, reply.body)
            }
            Err(e) => {
                if debug_mode {
                    debug!(method = %method, path = url, error = %e, "channel error");
                }
                ResponseEnvelope::error(500, e)
            }
        }
    }

    /// Lazily opens the realtime channel for this context.
    ///
    /// A no-op when no realtime configuration is present, when a channel
    /// is already open, or while another open is in progress. Open
    /// failures are logged and the transport keeps using HTTP.
    pub fn switch_to_realtime(self: &Arc<Self>) {
        let config = self.config();
        if config.realtime.is_none() || self.channel.read().is_some() {
            return;
        }
        if self.channel_opening.swap(true, Ordering::SeqCst) {
            return;
        }
        let connector = match self.connector.read().clone() {
            Some(connector) => connector,
            None => {
                warn!(context = %config.context, "realtime configured but no connector registered");
                self.channel_opening.store(false, Ordering::SeqCst);
                return;
            }
        };
        let weak = Arc::downgrade(self);
        let handler: CometHandler = Arc::new(move |event| {
            if let Some(transport) = weak.upgrade() {
                transport.dispatch_comet(&event);
            }
        });
        match connector.connect(&config, handler) {
            Ok(channel) => {
                *self.channel.write() = Some(channel);
            }
            Err(e) => {
                warn!(error = %e, context = %config.context, "realtime initialization error");
            }
        }
        self.channel_opening.store(false, Ordering::SeqCst);
    }

    /// Drops the realtime channel, restoring pure-HTTP `sync`.
    pub fn drop_realtime(&self) {
        *self.channel.write() = None;
    }

    /// True while a realtime channel is open and connected.
    pub fn realtime_active(&self) -> bool {
        self.channel
            .read()
            .as_ref()
            .is_some_and(|channel| channel.is_connected())
    }

    /// Registers a comet listener; a no-op when the same
    /// `(room, listener_id)` pair is already registered.
    pub fn on_comets_notify(&self, listener: CometListener) {
        let mut map = self.comet_listeners.write();
        let list = map.entry(listener.room.clone()).or_default();
        if list.iter().any(|l| l.listener_id == listener.listener_id) {
            return;
        }
        list.push(listener);
    }

    /// Removes a listener by room and id.
    pub fn stop_comets_on(&self, room: &str, listener_id: &str) {
        if let Some(list) = self.comet_listeners.write().get_mut(room) {
            list.retain(|l| l.listener_id != listener_id);
        }
    }

    /// Fans an inbound event out to the listeners of its room. Rooms
    /// with no listeners are a silent no-op.
    pub fn dispatch_comet(&self, event: &CometEvent) {
        if self.config.read().debug {
            debug!(room = %event.room, verb = event.verb.as_str(), "comet");
        }
        let handlers: Vec<_> = {
            let listeners = self.comet_listeners.read();
            match listeners.get(&event.room) {
                Some(list) => list.iter().map(|l| Arc::clone(&l.on_comet)).collect(),
                None => return,
            }
        };
        for handler in handlers {
            handler(event);
        }
    }
}

/// Form/query-string encoding of a parameter map. Scalars are written
/// in their string normal form, matching the loose identity rules.
fn form_encode(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(&normalized(v))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Clones the payload and injects the `__client_time` stamp.
fn stamped(params: Option<&Params>) -> Params {
    let mut body = params.cloned().unwrap_or_default();
    body.insert(
        "__client_time".into(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    body
}
