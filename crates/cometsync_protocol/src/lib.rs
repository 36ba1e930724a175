//! # cometsync Protocol
//!
//! Wire-level types shared by the cometsync client and the reference
//! server:
//!
//! - Parameter maps (query strings, request bodies, resource records)
//! - The uniform response envelope returned by every transport call
//! - Comet events (server-pushed mutation notices)
//! - HTTP methods and their parameter-placement rules
//! - Record identity with loose (string-normalized) comparison
//! - Paged query results
//!
//! Records are schema-agnostic JSON objects; the only structural
//! requirement the protocol places on them is an `id` field.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod comet;
mod envelope;
mod identity;
mod method;
mod params;
mod result;

pub use comet::{CometEvent, CometVerb};
pub use envelope::ResponseEnvelope;
pub use identity::{loose_eq, normalized, record_id, same_id};
pub use method::Method;
pub use params::{merged, params, Params};
pub use result::{page_count, ResultPage};
