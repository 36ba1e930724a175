//! The resource store engine.
//!
//! For a named resource, builds on the transport abstraction and the
//! realtime bridge to expose a query/pagination/mutation API over a
//! single shared result record, memoized by a composite key of resource
//! name, ordering, filter parameters, transport context and includes
//! directive.

mod result;

pub use result::{SharedResult, StoreResult};

use crate::context::SyncContext;
use crate::debounce::Debounce;
use crate::error::ClientResult;
use crate::events::{EventSlot, LOADING_SLOT};
use crate::network::NetworkMonitor;
use crate::transport::{CometListener, Transport};
use cometsync_protocol::{
    loose_eq, normalized, page_count, same_id, CometEvent, CometVerb, Method, Params,
    ResponseEnvelope, ResultPage,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl Order {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }

    fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Order::Desc
        } else {
            Order::Asc
        }
    }
}

/// Pure transformer applied to raw response bodies before merging.
pub type ResultTransformer = Arc<dyn Fn(Params) -> Params + Send + Sync>;

/// Pure transformer applied to outgoing queries before sending.
pub type QueryTransformer = Arc<dyn Fn(Params) -> Params + Send + Sync>;

/// Listener for store mutation events.
pub type MutationListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`Store::on`]; pass back to [`Store::off`] to
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    verb: CometVerb,
    id: u64,
}

/// Options for [`SyncContext::use_store`].
#[derive(Clone)]
pub struct StoreOptions {
    /// Base filter parameters, included in every query and used for the
    /// membership check on pushed `create` events.
    pub params: Params,
    /// `"direction|field"` sort spec.
    pub order_and_by: String,
    /// Comet room; defaults to the resource name.
    pub namespace: Option<String>,
    /// Transport context name.
    pub transport_context: String,
    /// Includes directive forwarded to the backend.
    pub includes: String,
    /// Server-provided initial data, merged when the memoized record is
    /// first created.
    pub init_data: Option<ResultPage>,
    /// Page-size override.
    pub limit: Option<u64>,
    /// Response shaping.
    pub result_transformer: Option<ResultTransformer>,
    /// Query shaping.
    pub query_transformer: Option<QueryTransformer>,
    /// Quiescence window for debounced search.
    pub search_debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            params: Params::new(),
            order_and_by: "asc".into(),
            namespace: None,
            transport_context: crate::config::DEFAULT_CONTEXT.into(),
            includes: String::new(),
            init_data: None,
            limit: None,
            result_transformer: None,
            query_transformer: None,
            search_debounce: Duration::from_millis(500),
        }
    }
}

impl StoreOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base filter parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the `"direction|field"` sort spec.
    pub fn with_order(mut self, order_and_by: impl Into<String>) -> Self {
        self.order_and_by = order_and_by.into();
        self
    }

    /// Sets the comet room.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the transport context.
    pub fn with_transport_context(mut self, context: impl Into<String>) -> Self {
        self.transport_context = context.into();
        self
    }

    /// Sets the includes directive.
    pub fn with_includes(mut self, includes: impl Into<String>) -> Self {
        self.includes = includes.into();
        self
    }

    /// Seeds server-provided initial data.
    pub fn with_init_data(mut self, init_data: ResultPage) -> Self {
        self.init_data = Some(init_data);
        self
    }

    /// Overrides the page size.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Installs a result transformer.
    pub fn with_result_transformer(
        mut self,
        transformer: impl Fn(Params) -> Params + Send + Sync + 'static,
    ) -> Self {
        self.result_transformer = Some(Arc::new(transformer));
        self
    }

    /// Installs a query transformer.
    pub fn with_query_transformer(
        mut self,
        transformer: impl Fn(Params) -> Params + Send + Sync + 'static,
    ) -> Self {
        self.query_transformer = Some(Arc::new(transformer));
        self
    }

    /// Sets the search debounce window.
    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }
}

/// Registry of memoized shared results, keyed by memo key.
pub(crate) struct StoreRegistry {
    map: RwLock<HashMap<String, Arc<SharedResult>>>,
}

impl StoreRegistry {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    fn resolve(&self, key: &str, init: impl FnOnce() -> StoreResult) -> Arc<SharedResult> {
        if let Some(found) = self.map.read().get(key) {
            return Arc::clone(found);
        }
        let mut map = self.map.write();
        Arc::clone(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(SharedResult::new(init()))),
        )
    }
}

#[derive(Debug)]
struct Cursor {
    offset: u64,
    overlay: Params,
    search: String,
    infinite: bool,
    /// Committed 1-based page; advanced only after an error-free sync.
    page: u64,
    /// Page a pagination operation wants committed; adopted by the merge
    /// when the server does not report one.
    pending_page: Option<u64>,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            offset: 0,
            overlay: Params::new(),
            search: String::new(),
            infinite: false,
            page: 1,
            pending_page: None,
        }
    }
}

struct StoreCore {
    name: String,
    url: String,
    params: Params,
    order: Order,
    order_by: String,
    includes: String,
    namespace: String,
    reverse: bool,
    memo_key: String,
    result: Arc<SharedResult>,
    transport: Arc<Transport>,
    network: Arc<NetworkMonitor>,
    loading_slot: Arc<EventSlot>,
    cursor: Mutex<Cursor>,
    listeners: RwLock<HashMap<CometVerb, Vec<(u64, MutationListener)>>>,
    listener_seq: AtomicU64,
    result_transformer: ResultTransformer,
    query_transformer: QueryTransformer,
    debounce: Debounce,
}

/// A store handle.
///
/// Cheap to clone; every handle with the same memo key operates on the
/// same memoized result record.
#[derive(Clone)]
pub struct Store {
    core: Arc<StoreCore>,
}

pub(crate) fn open(
    ctx: &Arc<SyncContext>,
    resource: &str,
    options: StoreOptions,
) -> ClientResult<Store> {
    let raw = resource.strip_prefix('/').unwrap_or(resource);
    let reverse = raw.starts_with('~');
    let (order, order_by) = parse_order_and_by(&options.order_and_by);
    let memo_key = memo_key(
        raw,
        order,
        &order_by,
        &options.transport_context,
        &options.params,
        &options.includes,
    );

    let name = raw.trim_start_matches('~').to_string();
    let namespace = {
        let ns = options.namespace.clone().unwrap_or_else(|| name.clone());
        let ns = ns.strip_prefix('/').unwrap_or(&ns);
        ns.replace('~', "")
    };

    let transport = ctx.instance(&options.transport_context)?;
    let result = ctx.stores().resolve(&memo_key, || initial_result(&options));

    let core = Arc::new(StoreCore {
        url: format!("/{name}"),
        name,
        params: options.params,
        order,
        order_by,
        includes: options.includes,
        namespace,
        reverse,
        memo_key,
        result,
        transport: Arc::clone(&transport),
        network: Arc::clone(ctx.network()),
        loading_slot: ctx.events().slot(LOADING_SLOT),
        cursor: Mutex::new(Cursor::default()),
        listeners: RwLock::new(HashMap::new()),
        listener_seq: AtomicU64::new(0),
        result_transformer: options
            .result_transformer
            .unwrap_or_else(|| Arc::new(|raw| raw)),
        query_transformer: options
            .query_transformer
            .unwrap_or_else(|| Arc::new(|raw| raw)),
        debounce: Debounce::new(options.search_debounce),
    });

    if transport.config().realtime.is_some() {
        transport.switch_to_realtime();
        core.start_listening();
    }

    Ok(Store { core })
}

fn initial_result(options: &StoreOptions) -> StoreResult {
    let mut record = StoreResult::default();
    if let Some(limit) = options.limit {
        record.limit = limit;
    }
    if let Some(init) = &options.init_data {
        record.data = init.data.clone();
        record.record_count = init.record_count;
        if let Some(limit) = init.limit {
            record.limit = limit;
        }
        if let Some(page) = init.page {
            record.page = page;
        }
        record.pages = init
            .pages
            .unwrap_or_else(|| page_count(init.record_count, record.limit));
    }
    record
}

fn parse_order_and_by(spec: &str) -> (Order, String) {
    let mut parts = spec.splitn(2, '|');
    let order = Order::parse(parts.next().unwrap_or(""));
    let order_by = parts.next().unwrap_or("").trim().to_string();
    (order, order_by)
}

/// Deterministic memo key: resource name (with any reverse marker),
/// canonical serialization of `{order, orderBy, transportContext,
/// ...params}` (sorted keys, so caller key order does not matter), and
/// the includes directive.
fn memo_key(
    raw_name: &str,
    order: Order,
    order_by: &str,
    transport_context: &str,
    params: &Params,
    includes: &str,
) -> String {
    let mut key_map: BTreeMap<String, Value> = BTreeMap::new();
    key_map.insert("order".into(), Value::String(order.as_str().into()));
    key_map.insert("orderBy".into(), Value::String(order_by.into()));
    key_map.insert(
        "transportContext".into(),
        Value::String(transport_context.into()),
    );
    for (k, v) in params {
        key_map.insert(k.clone(), v.clone());
    }
    let serialized = serde_json::to_string(&key_map).unwrap_or_default();
    format!("/{raw_name}/{serialized}/{includes}")
}

/// Human-readable resource title: `"widget_parts"` becomes
/// `"Widget Parts"`, `"id"` becomes `"ID"`.
fn make_name(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part == "id" {
                "ID".to_string()
            } else {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl StoreCore {
    fn sync_with(&self, force: Option<ResultPage>) {
        if let Some(page) = force {
            self.mutate_many(page);
            return;
        }
        if !self.network.is_online() {
            return;
        }
        if self.result.insync() {
            return;
        }
        if !self.result.begin_request() {
            return;
        }

        let query = self.prep_query();
        self.result.update(|r| r.loading = true);
        let envelope = self.transport.sync(&self.url, Method::Get, Some(&query));
        self.loading_slot.set_value(Value::Bool(false));

        if let Some(error) = envelope.error {
            self.result.update(|r| {
                r.error = Some(error);
                r.loading = false;
            });
        } else {
            let body = (self.result_transformer)(envelope.body);
            self.mutate_many(ResultPage::from_body(&body));
        }
        self.result.end_request();
    }

    /// Builds the outgoing query: base params, limit/offset, the
    /// one-shot query overlay, sort, includes and search term, then the
    /// caller's query transformer.
    fn prep_query(&self) -> Params {
        let mut cursor = self.cursor.lock();
        let snapshot = self.result.snapshot();

        let mut query = self.params.clone();
        query.insert("limit".into(), json!(snapshot.limit));
        query.insert("offset".into(), json!(cursor.offset));
        for (k, v) in std::mem::take(&mut cursor.overlay) {
            query.insert(k, v);
        }
        query.insert("orderDirection".into(), json!(self.order.as_str()));
        if !self.order_by.is_empty() {
            query.insert("orderBy".into(), json!(self.order_by));
        }
        if !self.includes.is_empty() {
            query.insert("includes".into(), json!(self.includes));
        }
        // A `limit: null` base param opts out of paging entirely.
        if matches!(self.params.get("limit"), Some(Value::Null)) {
            query.remove("limit");
        }
        if !cursor.search.is_empty() {
            query.insert("search".into(), json!(cursor.search));
        }
        drop(cursor);
        (self.query_transformer)(query)
    }

    /// Merges a server result page into the shared record.
    fn mutate_many(&self, page: ResultPage) {
        let ResultPage {
            data: mut incoming,
            record_count,
            page: server_page,
            pages,
            limit,
        } = page;

        let (infinite, pending_page) = {
            let mut cursor = self.cursor.lock();
            (cursor.infinite, cursor.pending_page.take())
        };
        let reverse = self.reverse;
        if reverse {
            incoming.reverse();
        }

        self.result.update(move |r| {
            if let Some(limit) = limit {
                if limit > 0 && limit != r.limit {
                    r.limit = limit;
                }
            }
            r.data = if infinite {
                if reverse {
                    let mut merged = incoming;
                    merged.extend(std::mem::take(&mut r.data));
                    merged
                } else {
                    let mut merged = std::mem::take(&mut r.data);
                    merged.extend(incoming);
                    merged
                }
            } else {
                incoming
            };
            if let Some(page) = server_page.or(pending_page) {
                r.page = page;
            }
            r.pages = pages.unwrap_or_else(|| page_count(record_count, r.limit));
            r.record_count = record_count;
            r.loading = false;
            r.error = None;
        });
        self.result.set_insync(true);
    }

    fn filter(&self, query: Params) {
        if !self.network.is_online() {
            return;
        }
        self.result.set_insync(false);
        {
            let mut cursor = self.cursor.lock();
            cursor.offset = 0;
            cursor.page = 1;
            cursor.pending_page = Some(1);
            cursor.overlay = query;
        }
        self.sync_with(None);
    }

    fn search(self: &Arc<Self>, term: &str) {
        let core = Arc::clone(self);
        let term = term.to_string();
        self.debounce.call(move || {
            if !core.network.is_online() {
                return;
            }
            core.result.set_insync(false);
            {
                let mut cursor = core.cursor.lock();
                cursor.offset = 0;
                cursor.page = 1;
                cursor.pending_page = Some(1);
                cursor.search = term;
            }
            core.sync_with(None);
        });
    }

    fn page_to(&self, target: u64) {
        if !self.network.is_online() {
            return;
        }
        if target == 0 {
            return;
        }
        let snapshot = self.result.snapshot();
        let offset = (target - 1) * snapshot.limit;
        if offset >= snapshot.record_count {
            return;
        }

        {
            let mut cursor = self.cursor.lock();
            cursor.offset = offset;
            cursor.infinite = false;
            cursor.pending_page = Some(target);
            cursor.overlay.insert("page".into(), json!(target));
        }
        self.result.set_insync(false);
        self.sync_with(None);
        if self.result.snapshot().error.is_none() {
            self.cursor.lock().page = target;
        }
    }

    fn next(&self) {
        let page = self.result.snapshot().page;
        self.page_to(page + 1);
    }

    fn prev(&self) {
        let page = self.result.snapshot().page;
        if page <= 1 {
            return;
        }
        self.page_to(page - 1);
    }

    /// Infinite-scroll append; requires a completed sync first.
    fn more(&self) {
        if !self.result.insync() {
            warn!(store = %self.name, "store not prefetched");
            return;
        }
        if !self.network.is_online() {
            return;
        }
        let snapshot = self.result.snapshot();
        let committed = self.cursor.lock().page;
        let offset = committed * snapshot.limit;
        if offset >= snapshot.record_count || snapshot.loading {
            return;
        }
        let target = committed + 1;
        {
            let mut cursor = self.cursor.lock();
            cursor.offset = offset;
            cursor.infinite = true;
            cursor.pending_page = Some(target);
            cursor.overlay.insert("page".into(), json!(target));
        }
        self.result.set_insync(false);
        self.sync_with(None);
        if self.result.snapshot().error.is_none() {
            self.cursor.lock().page = target;
        }
    }

    fn save(&self, record: Params) -> ResponseEnvelope {
        let id = record.get("id").filter(|v| !v.is_null()).cloned();
        let (method, url) = match &id {
            Some(id) => (Method::Put, format!("{}/{}", self.url, normalized(id))),
            None => (Method::Post, self.url.clone()),
        };

        let envelope = self.transport.sync(&url, method, Some(&record));
        self.loading_slot.set_value(Value::Bool(false));
        if envelope.is_error() {
            return envelope;
        }
        let data = match envelope.data().cloned() {
            Some(data) => data,
            None => return envelope,
        };
        let message = if method == Method::Put {
            self.mutate_patch(&data);
            format!("{} was successfully updated.", make_name(&self.name))
        } else {
            self.mutate_add(data);
            format!("{} was successfully created.", make_name(&self.name))
        };
        envelope.with_message(message)
    }

    fn destroy(&self, record: &Params) -> ResponseEnvelope {
        let id = match record.get("id").filter(|v| !v.is_null()) {
            Some(id) => normalized(id),
            None => return ResponseEnvelope::error(400, "cannot destroy a record without an id"),
        };
        let url = format!("{}/{}", self.url, id);
        let envelope = self.transport.sync(&url, Method::Delete, Some(record));
        self.loading_slot.set_value(Value::Bool(false));
        if envelope.is_error() {
            return envelope;
        }
        if let Some(data) = envelope.data().cloned() {
            self.mutate_remove(&data);
            let message = format!("{} was successfully destroyed.", make_name(&self.name));
            return envelope.with_message(message);
        }
        envelope
    }

    fn find(self: &Arc<Self>, key: &str, value: &Value) -> Option<Value> {
        if !self.result.insync() {
            self.sync_with(None);
        }
        self.result
            .snapshot()
            .data
            .iter()
            .find(|rec| rec.get(key).is_some_and(|v| loose_eq(v, value)))
            .cloned()
    }

    fn exists(&self, record: &Value) -> bool {
        self.result
            .snapshot()
            .data
            .iter()
            .any(|rec| same_id(rec, record))
    }

    /// Appends a record locally. No-op before the first sync or when a
    /// record with the same id already exists.
    fn mutate_add(&self, record: Value) -> bool {
        if !self.result.insync() {
            return false;
        }
        if self.exists(&record) {
            return false;
        }
        let mut record = record;
        if let Some(map) = record.as_object_mut() {
            map.insert("isNew".into(), Value::Bool(true));
        }
        let append = self.reverse || self.order == Order::Asc;
        let notify_record = record.clone();
        self.result.update(move |r| {
            if append {
                r.data.push(record);
            } else {
                r.data.insert(0, record);
            }
            r.record_count += 1;
            r.pages = page_count(r.record_count, r.limit);
            r.loading = false;
        });
        self.notify(CometVerb::Create, &notify_record);
        true
    }

    /// Patches the matching record's fields in place. No-op before the
    /// first sync or when no record matches.
    fn mutate_patch(&self, delta: &Value) -> bool {
        if !self.result.insync() {
            return false;
        }
        let fields = match delta.as_object() {
            Some(fields) => fields.clone(),
            None => return false,
        };
        let probe = delta.clone();
        let patched = self.result.update(move |r| {
            let mut patched = false;
            for rec in r.data.iter_mut() {
                if !same_id(rec, &probe) {
                    continue;
                }
                if let Some(target) = rec.as_object_mut() {
                    for (k, v) in &fields {
                        target.insert(k.clone(), v.clone());
                    }
                    patched = true;
                }
            }
            patched
        });
        if patched {
            self.notify(CometVerb::Update, delta);
        }
        patched
    }

    /// Removes the matching record locally. No-op before the first sync
    /// or when no record matches.
    fn mutate_remove(&self, record: &Value) -> bool {
        if !self.result.insync() {
            return false;
        }
        if !self.exists(record) {
            return false;
        }
        let probe = record.clone();
        self.result.update(move |r| {
            r.data.retain(|rec| !same_id(rec, &probe));
            r.record_count = r.record_count.saturating_sub(1);
            r.pages = page_count(r.record_count, r.limit);
            r.loading = false;
        });
        self.notify(CometVerb::Destroy, record);
        true
    }

    fn notify(&self, verb: CometVerb, data: &Value) {
        let handlers: Vec<MutationListener> = self
            .listeners
            .read()
            .get(&verb)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        for handler in handlers {
            handler(data);
        }
    }

    fn on(&self, verb: CometVerb, handler: MutationListener) -> Subscription {
        let id = self.listener_seq.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .write()
            .entry(verb)
            .or_default()
            .push((id, handler));
        Subscription { verb, id }
    }

    fn off(&self, subscription: Subscription) {
        if let Some(list) = self.listeners.write().get_mut(&subscription.verb) {
            list.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Registers this store as a comet listener on its namespace, keyed
    /// by the memo key so re-registration is idempotent.
    fn start_listening(self: &Arc<Self>) {
        let core = Arc::clone(self);
        self.transport.on_comets_notify(CometListener {
            room: self.namespace.clone(),
            listener_id: self.memo_key.clone(),
            on_comet: Arc::new(move |event| core.on_comet(event)),
        });
    }

    /// Applies an authoritative server push.
    fn on_comet(&self, event: &CometEvent) {
        if event.room != self.namespace {
            debug!(room = %event.room, namespace = %self.namespace, "comet for another room");
            return;
        }
        match event.verb {
            CometVerb::Refresh => {
                let Some(body) = event.data.as_object() else {
                    return;
                };
                self.mutate_many(ResultPage::from_body(body));
                if let Some(data) = body.get("data") {
                    self.notify(CometVerb::Refresh, data);
                }
            }
            CometVerb::Update => {
                self.mutate_patch(&event.data);
            }
            CometVerb::Create => {
                if self.matches_filter(&event.data) {
                    self.mutate_add(event.data.clone());
                }
            }
            CometVerb::Destroy => {
                self.mutate_remove(&event.data);
            }
        }
    }

    /// Field-by-field membership check of a pushed record against the
    /// store's own filter parameters.
    fn matches_filter(&self, data: &Value) -> bool {
        if self.params.is_empty() {
            return true;
        }
        self.params
            .iter()
            .all(|(key, expected)| data.get(key).is_some_and(|actual| loose_eq(actual, expected)))
    }
}

impl Store {
    /// Snapshot of the shared result record.
    pub fn result(&self) -> StoreResult {
        self.core.result.snapshot()
    }

    /// The memoized result cell; handles with equal memo keys share it.
    pub fn shared(&self) -> Arc<SharedResult> {
        Arc::clone(&self.core.result)
    }

    /// Subscribes to result assignments.
    pub fn observe(&self) -> Receiver<StoreResult> {
        self.core.result.subscribe()
    }

    /// The memo key identifying this store.
    pub fn memo_key(&self) -> &str {
        &self.core.memo_key
    }

    /// The comet room this store reconciles against.
    pub fn namespace(&self) -> &str {
        &self.core.namespace
    }

    /// True once a sync has completed.
    pub fn insync(&self) -> bool {
        self.core.result.insync()
    }

    /// Queries the backend and merges the response. A no-op while
    /// offline, already in sync, or with a request in flight.
    pub fn sync(&self) {
        self.core.sync_with(None);
    }

    /// Merges a pre-fetched result directly (server-provided initial
    /// data), bypassing the network.
    pub fn sync_from(&self, prefetched: ResultPage) {
        self.core.sync_with(Some(prefetched));
    }

    /// Applies a partial query, resets to page 1 and re-syncs.
    pub fn filter(&self, query: Params) {
        self.core.filter(query);
    }

    /// Debounced search: marks out of sync, resets to page 1 and
    /// re-syncs once input quiesces.
    pub fn search(&self, term: &str) {
        self.core.search(term);
    }

    /// Moves to the next page.
    pub fn next(&self) {
        self.core.next();
    }

    /// Moves to the previous page.
    pub fn prev(&self) {
        self.core.prev();
    }

    /// Jumps to a 1-based page; out-of-bounds requests are ignored.
    pub fn page_to(&self, page: u64) {
        self.core.page_to(page);
    }

    /// Infinite-scroll append of the next page.
    pub fn more(&self) {
        self.core.more();
    }

    /// Persists a record: `PUT` when it carries an id, `POST` otherwise.
    /// On success the local copy is patched or appended and the returned
    /// envelope carries a human-readable message; on failure the shared
    /// record is left untouched and the error is only in the return
    /// value.
    pub fn save(&self, record: Params) -> ResponseEnvelope {
        self.core.save(record)
    }

    /// Deletes a record; the local copy is removed on success.
    pub fn destroy(&self, record: &Params) -> ResponseEnvelope {
        self.core.destroy(record)
    }

    /// Finds a record by id, syncing first when necessary.
    pub fn find(&self, id: &Value) -> Option<Value> {
        self.core.find("id", id)
    }

    /// Finds a record by an arbitrary key (loose equality).
    pub fn find_by(&self, key: &str, value: &Value) -> Option<Value> {
        self.core.find(key, value)
    }

    /// Direct local append; no-op before the first sync.
    pub fn add(&self, record: Value) -> bool {
        self.core.mutate_add(record)
    }

    /// Direct local patch; no-op before the first sync.
    pub fn patch(&self, record: &Value) -> bool {
        self.core.mutate_patch(record)
    }

    /// Direct local removal; no-op before the first sync.
    pub fn remove(&self, record: &Value) -> bool {
        self.core.mutate_remove(record)
    }

    /// Registers a handler for one mutation event kind.
    pub fn on(&self, verb: CometVerb, handler: impl Fn(&Value) + Send + Sync + 'static) -> Subscription {
        self.core.on(verb, Arc::new(handler))
    }

    /// Unsubscribes a handler.
    pub fn off(&self, subscription: Subscription) {
        self.core.off(subscription);
    }

    /// Raw `POST` scoped under the resource url.
    pub fn post(&self, path: &str, params: &Params) -> ResponseEnvelope {
        self.core
            .transport
            .post(&format!("{}{}", self.core.url, path), params)
    }

    /// Raw `GET` scoped under the resource url.
    pub fn get(&self, path: &str, params: Option<&Params>) -> ResponseEnvelope {
        self.core
            .transport
            .get(&format!("{}{}", self.core.url, path), params)
    }

    /// Uploads a file payload to `{resource}/upload`.
    pub fn upload(&self, file: &Params) -> ResponseEnvelope {
        self.core
            .transport
            .upload(&format!("{}/upload", self.core.url), file)
    }
}
