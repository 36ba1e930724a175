//! The application-lifetime context.
//!
//! Owns every registry the engine needs (transport contexts, event
//! slots, memoized stores, the network monitor) so lifecycle and
//! testability stay explicit: contexts are injected, nothing is
//! process-global.

use crate::config::{BeforeSend, TransportConfig, DEFAULT_CONTEXT};
use crate::error::{ClientError, ClientResult};
use crate::events::EventSlots;
use crate::http::HttpClient;
use crate::network::NetworkMonitor;
use crate::realtime::RealtimeConnector;
use crate::store::{Store, StoreOptions, StoreRegistry};
use crate::transport::Transport;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Options for resolving a transport instance while rebinding the
/// execution-specific pieces (the fetch implementation differs between
/// server-rendered and browser-like execution).
#[derive(Default)]
pub struct InstanceOptions {
    /// Context name; `"default"` when absent.
    pub context: Option<String>,
    /// HTTP client to bind on the resolved context.
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// Pre-send hook to bind on the resolved context.
    pub before_send: Option<BeforeSend>,
}

impl InstanceOptions {
    /// Empty options, resolving the default context unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the context name.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the HTTP client to bind.
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the pre-send hook to bind.
    pub fn with_before_send(mut self, hook: BeforeSend) -> Self {
        self.before_send = Some(hook);
        self
    }
}

/// The context object owning all engine registries.
pub struct SyncContext {
    network: Arc<NetworkMonitor>,
    events: Arc<EventSlots>,
    transports: RwLock<HashMap<String, Arc<Transport>>>,
    stores: StoreRegistry,
    connector: RwLock<Option<Arc<dyn RealtimeConnector>>>,
    default_http: RwLock<Option<Arc<dyn HttpClient>>>,
}

impl SyncContext {
    /// A context without session storage: the network monitor assumes
    /// online. A `"default"` transport context is pre-registered.
    pub fn new() -> Arc<Self> {
        Self::with_network(NetworkMonitor::new())
    }

    /// A context around the given network monitor.
    pub fn with_network(network: NetworkMonitor) -> Arc<Self> {
        let ctx = Arc::new(Self {
            network: Arc::new(network),
            events: Arc::new(EventSlots::new()),
            transports: RwLock::new(HashMap::new()),
            stores: StoreRegistry::new(),
            connector: RwLock::new(None),
            default_http: RwLock::new(initial_http()),
        });
        ctx.configure(TransportConfig::default());
        ctx
    }

    /// The network monitor.
    pub fn network(&self) -> &Arc<NetworkMonitor> {
        &self.network
    }

    /// The event slot registry.
    pub fn events(&self) -> &Arc<EventSlots> {
        &self.events
    }

    /// Sets the HTTP client bound to contexts configured after this
    /// call. Already-configured contexts rebind through
    /// [`SyncContext::instance_with`].
    pub fn set_default_http_client(&self, client: Arc<dyn HttpClient>) {
        *self.default_http.write() = Some(client);
    }

    /// Sets the connector used when a context with realtime
    /// configuration opens its channel. Applies to every context,
    /// including already-configured ones.
    pub fn set_realtime_connector(&self, connector: Arc<dyn RealtimeConnector>) {
        *self.connector.write() = Some(Arc::clone(&connector));
        for transport in self.transports.read().values() {
            transport.set_connector(Arc::clone(&connector));
        }
    }

    /// Registers (or replaces) a named transport context and returns the
    /// instance. The context name comes from the configuration and
    /// defaults to `"default"`.
    pub fn configure(&self, config: TransportConfig) -> Arc<Transport> {
        let name = config.context.clone();
        let transport = Transport::new(
            config,
            self.default_http.read().clone(),
            self.connector.read().clone(),
            Arc::clone(&self.network),
            &self.events,
        );
        self.transports.write().insert(name, Arc::clone(&transport));
        transport
    }

    /// Resolves a registered context by name.
    pub fn instance(&self, context: &str) -> ClientResult<Arc<Transport>> {
        self.transports
            .read()
            .get(context)
            .cloned()
            .ok_or_else(|| ClientError::UnknownContext {
                context: context.to_string(),
            })
    }

    /// Resolves a context by options, rebinding the HTTP client and the
    /// pre-send hook when the options carry them.
    pub fn instance_with(&self, options: InstanceOptions) -> ClientResult<Arc<Transport>> {
        let name = options.context.as_deref().unwrap_or(DEFAULT_CONTEXT);
        let transport = self.instance(name)?;
        if let Some(client) = options.http_client {
            transport.bind_http_client(client);
        }
        if let Some(hook) = options.before_send {
            transport.bind_before_send(hook);
        }
        Ok(transport)
    }

    pub(crate) fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// Resolves (or creates) the store for a named resource.
    ///
    /// Two calls with semantically identical query parameters share one
    /// memoized result record; see the store module for the memo key.
    pub fn use_store(self: &Arc<Self>, resource: &str, options: StoreOptions) -> ClientResult<Store> {
        crate::store::open(self, resource, options)
    }
}

fn initial_http() -> Option<Arc<dyn HttpClient>> {
    #[cfg(feature = "reqwest")]
    {
        Some(Arc::new(crate::http::ReqwestClient::new()))
    }
    #[cfg(not(feature = "reqwest"))]
    {
        None
    }
}
