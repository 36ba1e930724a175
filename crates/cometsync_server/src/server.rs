//! The reference server: routing, CRUD and comet broadcast.

use crate::error::ServerError;
use crate::resources::{QuerySpec, ResourceTable};
use cometsync_protocol::{CometEvent, CometVerb, Method, Params};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Reference server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Page size applied when a query names none.
    pub default_limit: u64,
    /// Broadcast a comet event for every mutation.
    pub broadcast: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            broadcast: true,
        }
    }
}

/// A comet broadcast subscriber (a connected channel).
pub type CometSubscriber = Arc<dyn Fn(&CometEvent) + Send + Sync>;

/// The in-memory reference resource server.
pub struct ResourceServer {
    config: ServerConfig,
    tables: RwLock<HashMap<String, ResourceTable>>,
    subscribers: RwLock<Vec<CometSubscriber>>,
}

impl ResourceServer {
    /// Creates an empty server.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Seeds a resource with records.
    pub fn seed(&self, resource: &str, records: Vec<Params>) {
        self.tables
            .write()
            .entry(resource.to_string())
            .or_default()
            .seed(records);
    }

    /// All records of a resource, in insertion order.
    pub fn records(&self, resource: &str) -> Vec<Params> {
        self.tables
            .read()
            .get(resource)
            .map(|table| table.records().to_vec())
            .unwrap_or_default()
    }

    /// Number of records in a resource.
    pub fn record_count(&self, resource: &str) -> usize {
        self.records(resource).len()
    }

    /// Registers a comet subscriber.
    pub fn subscribe_comets(&self, subscriber: CometSubscriber) {
        self.subscribers.write().push(subscriber);
    }

    /// Pushes an event to every subscriber.
    pub fn broadcast(&self, event: CometEvent) {
        let subscribers: Vec<CometSubscriber> = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber(&event);
        }
    }

    /// Handles one request.
    ///
    /// `path` is `/{resource}` or `/{resource}/{id}`; `params` carries
    /// the parsed query string or body. Returns the status code and the
    /// response body.
    pub fn handle(
        &self,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<(u16, Params), ServerError> {
        let trimmed = path.trim_start_matches('/');
        let mut segments = trimmed.splitn(2, '/');
        let resource = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServerError::UnknownRoute(path.to_string()))?
            .to_string();
        let id: Option<Value> = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()));

        debug!(method = %method, path, "reference server request");

        match (method, id) {
            (Method::Get, None) => {
                let spec = QuerySpec::from_params(params, self.config.default_limit);
                let tables = self.tables.read();
                let page = tables
                    .get(&resource)
                    .map(|table| table.query(&spec))
                    .unwrap_or_else(|| {
                        ResourceTable::default().query(&spec)
                    });
                Ok((200, page.to_body()))
            }
            (Method::Get, Some(id)) => {
                let tables = self.tables.read();
                let record = tables
                    .get(&resource)
                    .and_then(|table| table.find(&id))
                    .cloned()
                    .ok_or(ServerError::NotFound)?;
                Ok((200, data_body(record)))
            }
            (Method::Post, None) => {
                let created = self
                    .tables
                    .write()
                    .entry(resource.clone())
                    .or_default()
                    .create(params.clone());
                self.broadcast_mutation(CometVerb::Create, &resource, &created);
                Ok((201, data_body(created)))
            }
            (Method::Put, Some(id)) => {
                let updated = self
                    .tables
                    .write()
                    .get_mut(&resource)
                    .and_then(|table| table.update(&id, params))
                    .ok_or(ServerError::NotFound)?;
                self.broadcast_mutation(CometVerb::Update, &resource, &updated);
                Ok((200, data_body(updated)))
            }
            (Method::Delete, Some(id)) => {
                let destroyed = self
                    .tables
                    .write()
                    .get_mut(&resource)
                    .and_then(|table| table.destroy(&id))
                    .ok_or(ServerError::NotFound)?;
                self.broadcast_mutation(CometVerb::Destroy, &resource, &destroyed);
                Ok((200, data_body(destroyed)))
            }
            (Method::Options, _) => Ok((200, Params::new())),
            _ => Err(ServerError::UnknownRoute(path.to_string())),
        }
    }

    fn broadcast_mutation(&self, verb: CometVerb, resource: &str, record: &Params) {
        if !self.config.broadcast {
            return;
        }
        self.broadcast(CometEvent::new(
            verb,
            resource,
            Value::Object(record.clone()),
        ));
    }
}

fn data_body(record: Params) -> Params {
    let mut body = Params::new();
    body.insert("data".into(), Value::Object(record));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use cometsync_protocol::params;
    use parking_lot::Mutex;
    use serde_json::json;

    fn seeded() -> ResourceServer {
        let server = ResourceServer::new(ServerConfig::default());
        server.seed(
            "widgets",
            (1..=3)
                .map(|id| params([("id", json!(id)), ("name", json!(format!("w{id}")))]))
                .collect(),
        );
        server
    }

    #[test]
    fn collection_query_returns_the_page_shape() {
        let server = seeded();
        let (status, body) = server
            .handle(Method::Get, "/widgets", &params([("limit", json!("2"))]))
            .unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["recordCount"], json!(3));
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["page"], json!(1));
    }

    #[test]
    fn crud_round_trip_broadcasts() {
        let server = seeded();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        server.subscribe_comets(Arc::new(move |event: &CometEvent| {
            sink.lock().push(event.clone());
        }));

        let (status, body) = server
            .handle(Method::Post, "/widgets", &params([("name", json!("new"))]))
            .unwrap();
        assert_eq!(status, 201);
        let created_id = body["data"]["id"].clone();
        assert_eq!(created_id, json!(4));

        server
            .handle(
                Method::Put,
                "/widgets/4",
                &params([("name", json!("renamed"))]),
            )
            .unwrap();
        server
            .handle(Method::Delete, "/widgets/4", &Params::new())
            .unwrap();

        let verbs: Vec<CometVerb> = events.lock().iter().map(|e| e.verb).collect();
        assert_eq!(
            verbs,
            vec![CometVerb::Create, CometVerb::Update, CometVerb::Destroy]
        );
        assert!(events.lock().iter().all(|e| e.room == "widgets"));
        assert_eq!(server.record_count("widgets"), 3);
    }

    #[test]
    fn single_record_get() {
        let server = seeded();
        let (_, body) = server
            .handle(Method::Get, "/widgets/2", &Params::new())
            .unwrap();
        assert_eq!(body["data"]["name"], json!("w2"));
        assert!(matches!(
            server.handle(Method::Get, "/widgets/99", &Params::new()),
            Err(ServerError::NotFound)
        ));
    }

    #[test]
    fn unknown_routes_are_rejected() {
        let server = seeded();
        assert!(matches!(
            server.handle(Method::Post, "/widgets/4", &Params::new()),
            Err(ServerError::UnknownRoute(_))
        ));
        assert!(matches!(
            server.handle(Method::Get, "/", &Params::new()),
            Err(ServerError::UnknownRoute(_))
        ));
    }

    #[test]
    fn unknown_resource_queries_are_empty_not_errors() {
        let server = seeded();
        let (status, body) = server
            .handle(Method::Get, "/gadgets", &Params::new())
            .unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["recordCount"], json!(0));
    }

    #[test]
    fn broadcast_can_be_disabled() {
        let server = ResourceServer::new(ServerConfig {
            broadcast: false,
            ..ServerConfig::default()
        });
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        server.subscribe_comets(Arc::new(move |event: &CometEvent| {
            sink.lock().push(event.clone());
        }));
        server
            .handle(Method::Post, "/widgets", &params([("name", json!("x"))]))
            .unwrap();
        assert!(events.lock().is_empty());
    }
}
