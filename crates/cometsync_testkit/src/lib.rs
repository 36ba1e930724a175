//! # cometsync Testkit
//!
//! Test utilities for the cometsync workspace:
//!
//! - Record fixtures (widgets with ids, names, sizes, shades)
//! - Loopback adapters binding the client's transport traits to the
//!   in-process reference server (no sockets involved)
//! - Pre-wired [`cometsync_client::SyncContext`] builders

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;
mod loopback;

pub use fixtures::{seeded_server, widget, widgets};
pub use loopback::{
    context_with_server, realtime_context_with_server, LoopbackChannel, LoopbackConnector,
    LoopbackHttp, LOOPBACK_BASE,
};
