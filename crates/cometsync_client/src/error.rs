//! Error types for the client engine.
//!
//! Network-path failures are returned as data inside
//! [`cometsync_protocol::ResponseEnvelope`] (`{ error, status }`), never as
//! `Err` values; the only operation that fails hard is resolving a
//! transport context that was never configured.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced as `Err` values.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A transport context was requested that was never configured.
    #[error("unknown transport context: {context}")]
    UnknownContext {
        /// The context name that failed to resolve.
        context: String,
    },
}
