//! # cometsync Client
//!
//! A client-side data-synchronization engine: it keeps a local,
//! paginated, mutable copy of a server-exposed resource collection in
//! sync with a backend over HTTP and an optional realtime push channel,
//! while tolerating intermittent connectivity.
//!
//! This crate provides:
//! - Network monitor: environment-reported connectivity with persisted
//!   last-known state and a one-shot refresh-on-reconnect flag
//! - Event slot registry: named observable slots shared across
//!   components
//! - Transport abstraction: per-context configuration, HTTP verb
//!   methods, a comet listener registry
//! - Realtime bridge: an opaque push-event channel swapped in for HTTP
//!   `sync` while connected
//! - Resource store engine: query/pagination/mutation API over memoized
//!   shared result records
//!
//! ## Architecture
//!
//! The server is the source of truth. The client applies optimistic
//! deltas locally and reconciles against authoritative server pushes
//! ("comets"), idempotently by record id. All registries live on an
//! injected [`SyncContext`] rather than in process-global state.
//!
//! ## Key invariants
//!
//! - Identical queries (resource, sort, filter params) share one result
//!   record, memoized for the context lifetime
//! - `pages == ceil(record_count / limit)` unless the server supplies
//!   `pages`
//! - Comet events apply at most once (id-existence checks) and never
//!   across rooms
//! - Network-path errors are data (`{ error, status }`), never panics or
//!   `Err` values

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod debounce;
mod error;
mod events;
mod http;
mod network;
mod realtime;
mod store;
mod transport;

pub use config::{
    BeforeSend, ContentType, Headers, RealtimeConfig, TransportConfig, DEFAULT_CONTEXT,
};
pub use context::{InstanceOptions, SyncContext};
pub use debounce::Debounce;
pub use error::{ClientError, ClientResult};
pub use events::{EventSlot, EventSlots, LOADING_SLOT};
pub use http::{HttpClient, HttpResponse, MockHttpClient, RecordedRequest};
pub use network::{MemoryStatusStore, NetworkMonitor, RefreshHandler, StatusListener, StatusStore};
pub use realtime::{
    ChannelReply, CometHandler, MockChannel, MockConnector, RealtimeChannel, RealtimeConnector,
};
pub use store::{
    MutationListener, Order, QueryTransformer, ResultTransformer, SharedResult, Store,
    StoreOptions, StoreResult, Subscription,
};
pub use transport::{CometListener, Transport, FETCH_ERROR, OFFLINE_ERROR};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
