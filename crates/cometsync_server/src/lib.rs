//! # cometsync Reference Server
//!
//! An in-memory resource server implementing the HTTP contract the
//! cometsync client speaks:
//!
//! - `GET /{resource}`: paged queries honoring `limit`, `offset`,
//!   `orderBy`, `orderDirection`, `search` and field-equality filters,
//!   returning `{ data, recordCount, page }`
//! - `POST /{resource}`, `PUT /{resource}/{id}` and
//!   `DELETE /{resource}/{id}`: CRUD returning `{ data }`
//! - comet broadcast: every mutation is pushed to subscribers as a
//!   `{ verb, room, data }` event, room = resource name
//!
//! The server holds everything in memory; it exists to exercise the
//! client in integration tests and to document the wire contract.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod resources;
mod server;

pub use error::ServerError;
pub use server::{CometSubscriber, ResourceServer, ServerConfig};
