//! Integration tests: the client engine against the in-process
//! reference server, over loopback HTTP and the loopback realtime
//! channel.

use cometsync_client::{StoreOptions, LOADING_SLOT};
use cometsync_protocol::{params, CometVerb, Method};
use cometsync_testkit::{context_with_server, realtime_context_with_server, seeded_server};
use serde_json::json;

#[test]
fn paging_walkthrough_against_the_server() {
    let server = seeded_server(60);
    let ctx = context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();

    store.sync();
    let result = store.result();
    assert_eq!(result.data.len(), 25);
    assert_eq!(result.record_count, 60);
    assert_eq!(result.pages, 3);
    assert_eq!(result.page, 1);
    assert_eq!(result.data[0]["id"], json!(1));

    store.next();
    let result = store.result();
    assert_eq!(result.page, 2);
    assert_eq!(result.data[0]["id"], json!(26));

    store.next(); // offset 50 < 60
    let result = store.result();
    assert_eq!(result.page, 3);
    assert_eq!(result.data.len(), 10);
    assert_eq!(result.data[9]["id"], json!(60));

    store.next(); // offset 75 >= 60: no-op
    assert_eq!(store.result().page, 3);

    store.prev();
    assert_eq!(store.result().page, 2);

    // The loading slot ends up lowered once the engine settles.
    assert!(ctx.events().slot(LOADING_SLOT).is(&json!(false)));
}

#[test]
fn filters_and_sort_ride_the_query_string() {
    let server = seeded_server(30);
    let ctx = context_with_server(&server);
    let store = ctx
        .use_store(
            "widgets",
            StoreOptions::new()
                .with_params(params([("size", json!(1))]))
                .with_order("desc|id"),
        )
        .unwrap();

    store.sync();
    let result = store.result();
    // Widgets with id % 3 == 1: 1, 4, ..., 28.
    assert_eq!(result.record_count, 10);
    assert_eq!(result.data[0]["id"], json!(28));
    assert!(result
        .data
        .iter()
        .all(|record| record["size"] == json!(1)));
}

#[test]
fn filter_narrows_and_resets_pagination() {
    let server = seeded_server(60);
    let ctx = context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();

    store.sync();
    store.next();
    assert_eq!(store.result().page, 2);

    store.filter(params([("shade", json!("red"))]));
    let result = store.result();
    assert_eq!(result.page, 1);
    assert!(result.record_count < 60);
    assert!(result
        .data
        .iter()
        .all(|record| record["shade"] == json!("red")));
}

#[test]
fn save_and_destroy_round_trip_over_http() {
    let server = seeded_server(3);
    let ctx = context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();
    store.sync();

    let envelope = store.save(params([("name", json!("fresh")), ("size", json!(0))]));
    assert!(!envelope.is_error());
    assert_eq!(
        envelope.message.as_deref(),
        Some("Widgets was successfully created.")
    );
    assert_eq!(server.record_count("widgets"), 4);
    let result = store.result();
    assert_eq!(result.data.len(), 4);
    assert_eq!(result.data[3]["isNew"], json!(true));

    let envelope = store.save(params([("id", json!(2)), ("name", json!("renamed"))]));
    assert_eq!(
        envelope.message.as_deref(),
        Some("Widgets was successfully updated.")
    );
    assert_eq!(store.result().data.len(), 4);
    assert_eq!(store.find(&json!(2)).unwrap()["name"], json!("renamed"));

    let envelope = store.destroy(&params([("id", json!(2))]));
    assert_eq!(
        envelope.message.as_deref(),
        Some("Widgets was successfully destroyed.")
    );
    assert_eq!(server.record_count("widgets"), 3);
    assert!(store.find(&json!(2)).is_none());
}

#[test]
fn channel_backed_sync_with_http_fallback() {
    let server = seeded_server(10);
    let (ctx, connector) = realtime_context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();

    store.sync();
    assert_eq!(store.result().data.len(), 10);

    // Drop the channel: the engine falls back to HTTP per call.
    connector.channel().set_connected(false);
    store.filter(params([("size", json!(1))]));
    let result = store.result();
    assert!(result.error.is_none());
    assert!(result.record_count > 0);
    assert!(result
        .data
        .iter()
        .all(|record| record["size"] == json!(1)));
}

#[test]
fn own_mutations_and_their_comets_apply_once() {
    let server = seeded_server(5);
    let (ctx, _connector) = realtime_context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();
    store.sync();

    // The server broadcasts the create comet during the save call; the
    // comet and the save response both try to append the record.
    let envelope = store.save(params([("name", json!("solo")), ("size", json!(2))]));
    assert!(!envelope.is_error());

    let result = store.result();
    assert_eq!(result.data.len(), 6);
    assert_eq!(result.record_count, 6);
    let matching = result
        .data
        .iter()
        .filter(|record| record["name"] == json!("solo"))
        .count();
    assert_eq!(matching, 1);

    // Same for destroy: broadcast first, local removal second.
    let envelope = store.destroy(&params([("id", json!(3))]));
    assert!(!envelope.is_error());
    assert_eq!(store.result().data.len(), 5);
    assert_eq!(store.result().record_count, 5);
}

#[test]
fn another_clients_mutations_arrive_as_comets() {
    let server = seeded_server(5);
    let (ctx, _connector) = realtime_context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();
    store.sync();

    let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    {
        let seen = std::sync::Arc::clone(&seen);
        store.on(CometVerb::Create, move |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
    }

    // A second client (plain HTTP, same server) creates and updates.
    let other_ctx = context_with_server(&server);
    let other = other_ctx.use_store("widgets", StoreOptions::new()).unwrap();
    other.sync();
    other.save(params([("name", json!("from other")), ("size", json!(1))]));
    other.save(params([("id", json!(1)), ("name", json!("retitled"))]));

    let result = store.result();
    assert_eq!(result.data.len(), 6);
    assert_eq!(store.find_by("name", &json!("from other")).unwrap()["isNew"], json!(true));
    assert_eq!(store.find(&json!(1)).unwrap()["name"], json!("retitled"));
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);

    other.destroy(&params([("id", json!(5))]));
    assert!(store.find(&json!(5)).is_none());
    assert_eq!(store.result().record_count, 5);
}

#[test]
fn namespaced_stores_ignore_other_rooms() {
    let server = seeded_server(3);
    server.seed("gadgets", vec![params([("id", json!(1)), ("name", json!("g1"))])]);

    let (ctx, _connector) = realtime_context_with_server(&server);
    let widgets = ctx.use_store("widgets", StoreOptions::new()).unwrap();
    widgets.sync();
    let before = widgets.result();

    // Mutating gadgets broadcasts into the "gadgets" room only.
    let other_ctx = context_with_server(&server);
    let gadgets = other_ctx.use_store("gadgets", StoreOptions::new()).unwrap();
    gadgets.sync();
    gadgets.save(params([("name", json!("g2"))]));

    assert_eq!(widgets.result(), before);
}

#[test]
fn offline_transition_short_circuits_until_reconnect() {
    let server = seeded_server(10);
    let ctx = context_with_server(&server);
    let store = ctx.use_store("widgets", StoreOptions::new()).unwrap();
    store.sync();

    ctx.network().set_online(false);
    let envelope = store.save(params([("name", json!("while offline"))]));
    assert!(envelope.is_error());
    assert_eq!(envelope.status, 404);
    assert_eq!(server.record_count("widgets"), 10);
    assert!(ctx.network().refresh_queued());

    // Pagination is equally inert.
    store.next();
    assert_eq!(store.result().page, 1);

    ctx.network().set_online(true);
    let envelope = store.save(params([("name", json!("back online"))]));
    assert!(!envelope.is_error());
    assert_eq!(server.record_count("widgets"), 11);
}

#[test]
fn direct_transport_verbs_against_the_server() {
    let server = seeded_server(2);
    let ctx = context_with_server(&server);
    let transport = ctx.instance("default").unwrap();

    let envelope = transport.get("/widgets/2", None);
    assert!(!envelope.is_error());
    assert_eq!(envelope.data().unwrap()["name"], json!("widget 2"));

    let envelope = transport.sync("/widgets/99", Method::Delete, None);
    assert!(envelope.is_error());
    assert_eq!(envelope.status, 404);
}
