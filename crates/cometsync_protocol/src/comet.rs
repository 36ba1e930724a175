//! Comet events: server-pushed mutation notices.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four mutation kinds a server can push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CometVerb {
    /// Full replacement of the local view with the pushed result page.
    Refresh,
    /// A record was created server-side.
    Create,
    /// A record was updated server-side.
    Update,
    /// A record was destroyed server-side.
    Destroy,
}

impl CometVerb {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CometVerb::Refresh => "refresh",
            CometVerb::Create => "create",
            CometVerb::Update => "update",
            CometVerb::Destroy => "destroy",
        }
    }
}

/// A server-pushed mutation notice.
///
/// `room` identifies the logical broadcast channel; a store only applies
/// events whose room equals its own subscribed namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CometEvent {
    /// Mutation kind.
    pub verb: CometVerb,
    /// Logical broadcast channel the event belongs to.
    pub room: String,
    /// Event payload: a record for create/update/destroy, a result page
    /// for refresh.
    pub data: Value,
}

impl CometEvent {
    /// Creates a new comet event.
    pub fn new(verb: CometVerb, room: impl Into<String>, data: Value) -> Self {
        Self {
            verb,
            room: room.into(),
            data,
        }
    }
}
