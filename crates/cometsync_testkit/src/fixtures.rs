//! Record fixtures.

use cometsync_protocol::{params, Params};
use cometsync_server::{ResourceServer, ServerConfig};
use serde_json::json;
use std::sync::Arc;

const SHADES: &[&str] = &["red", "green", "blue"];

/// A widget record with a deterministic shape derived from its id.
pub fn widget(id: u64) -> Params {
    params([
        ("id", json!(id)),
        ("name", json!(format!("widget {id}"))),
        ("size", json!(id % 3)),
        ("shade", json!(SHADES[(id as usize) % SHADES.len()])),
    ])
}

/// Widgets with ids `1..=count`.
pub fn widgets(count: u64) -> Vec<Params> {
    (1..=count).map(widget).collect()
}

/// A reference server seeded with `count` widgets under `"widgets"`.
pub fn seeded_server(count: u64) -> Arc<ResourceServer> {
    let server = Arc::new(ResourceServer::new(ServerConfig::default()));
    server.seed("widgets", widgets(count));
    server
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widgets_are_deterministic() {
        assert_eq!(widget(4), widget(4));
        assert_eq!(widget(4)["shade"], json!("green"));
        assert_eq!(widgets(60).len(), 60);
        assert_eq!(seeded_server(60).record_count("widgets"), 60);
    }
}
