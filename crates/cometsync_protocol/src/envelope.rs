//! The uniform response envelope.

use crate::Params;
use serde_json::Value;

/// The method-call uniform response shape returned by every transport
/// call.
///
/// Exactly one of `error` / the success-shaped `body` is meaningful;
/// `status` is always present. Network-path failures are carried here as
/// data rather than as `Err` values, so callers check `error` explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// HTTP status, or a synthetic status for failures that never reached
    /// the network.
    pub status: u16,
    /// Error message; `None` on success.
    pub error: Option<String>,
    /// Human-readable outcome message, filled in by higher layers.
    pub message: Option<String>,
    /// Remaining response fields (`data`, `recordCount`, ...).
    pub body: Params,
}

impl ResponseEnvelope {
    /// A successful response carrying the parsed body.
    pub fn ok(status: u16, body: Params) -> Self {
        Self {
            status,
            error: None,
            message: None,
            body,
        }
    }

    /// Builds an envelope from a parsed response body, lifting `error`
    /// and `message` fields out of the body when the server put them
    /// there.
    pub fn from_body(status: u16, mut body: Params) -> Self {
        let error = match body.remove("error") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        let message = match body.remove("message") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        Self {
            status,
            error,
            message,
            body,
        }
    }

    /// A failed response carrying only an error message.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(message.into()),
            message: None,
            body: Params::new(),
        }
    }

    /// True when the call failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The `data` field of the body, if any.
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data").filter(|v| !v.is_null())
    }

    /// Attaches a human-readable outcome message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
